//! Crash recovery tests against the public xasim API
//!
//! Covers the coordinator-facing contract end to end:
//! - records written by hand in the on-disk layout are recovered
//! - a coordinator-owned registry receives the scanner exactly once
//! - removal failures are retryable and cleanup is idempotent

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use xasim::{
    codec, BranchLog, DummyParticipant, InterceptHalt, Outcome, ParticipantState, RecoveryManager,
    RecoveryRegistry, RecoveryScanner, XaErrorCode, XaFlags, XaResource, XaResourceRecovery,
    XaSimConfig, Xid,
};

fn setup() -> (TempDir, XaSimConfig) {
    let temp_dir = TempDir::new().unwrap();
    let config = XaSimConfig::new().record_dir(temp_dir.path().join("target/DummyXAResource"));
    (temp_dir, config)
}

/// A coordinator-side registry that only collects hand-offs
#[derive(Default)]
struct CollectingRegistry {
    recoveries: Vec<Arc<dyn XaResourceRecovery>>,
}

impl RecoveryRegistry for CollectingRegistry {
    fn add_xa_resource_recovery(&mut self, recovery: Arc<dyn XaResourceRecovery>) {
        self.recoveries.push(recovery);
    }
}

#[test]
fn test_hand_written_record_is_recovered() {
    let (_dir, config) = setup();
    fs::create_dir_all(&config.record_dir).unwrap();

    // Big-endian: format_id, len + gtrid, len + bqual
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&131077i32.to_be_bytes());
    bytes.extend_from_slice(&3i32.to_be_bytes());
    bytes.extend_from_slice(b"abc");
    bytes.extend_from_slice(&0i32.to_be_bytes());
    fs::write(config.record_dir.join("0_ffff7f000001_1234_"), &bytes).unwrap();

    let recovered = RecoveryScanner::from_config(&config).scan().unwrap();

    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].xid(), Some(&Xid::new(131077, b"abc".to_vec(), Vec::new())));
    assert_eq!(codec::encode(recovered[0].xid().unwrap()), bytes);
}

#[test]
fn test_coordinator_registry_drives_recovery() {
    let (_dir, config) = setup();
    let xid = Xid::new(1, b"order-42".to_vec(), b"inventory".to_vec());

    let hook = Arc::new(InterceptHalt::new());
    let mut participant = DummyParticipant::new(&config, true).with_halt_hook(hook.clone());
    participant.prepare(&xid).unwrap();
    let err = participant.commit(&xid, false).unwrap_err();
    assert_eq!(err.code(), XaErrorCode::RmFail);
    assert!(hook.was_halted());
    drop(participant);

    // Startup: hand the scanner over once
    let scanner = Arc::new(RecoveryScanner::from_config(&config));
    let mut registry = CollectingRegistry::default();
    assert!(scanner.register(&mut registry));
    assert!(!scanner.register(&mut registry));
    assert_eq!(registry.recoveries.len(), 1);

    // Coordinator recovery pass
    let mut resources = registry.recoveries[0].xa_resources().unwrap();
    assert_eq!(resources.len(), 1);
    let in_doubt = resources[0].recover(XaFlags::START_RSCAN).unwrap();
    assert_eq!(in_doubt, vec![xid.clone()]);
    resources[0].commit(&xid, false).unwrap();

    assert!(registry.recoveries[0].xa_resources().unwrap().is_empty());
}

#[test]
fn test_externally_deleted_record_is_retryable() {
    let (_dir, config) = setup();
    let xid = Xid::new(1, b"g".to_vec(), b"b".to_vec());

    let mut participant = DummyParticipant::new(&config, false);
    participant.prepare(&xid).unwrap();
    fs::remove_file(participant.record().unwrap().path()).unwrap();

    let err = participant.rollback(&xid).unwrap_err();
    assert_eq!(err.code(), XaErrorCode::Retry);
    assert_eq!(participant.state(), ParticipantState::Prepared);
}

#[test]
fn test_remove_is_idempotent() {
    let (_dir, config) = setup();
    let log = BranchLog::new(&config.record_dir);
    let mut slot = Some(log.write(&Xid::new(9, vec![1], vec![2])).unwrap());

    log.remove(&mut slot).unwrap();
    log.remove(&mut slot).unwrap();

    assert!(slot.is_none());
    assert!(log.list().unwrap().is_empty());
}

#[test]
fn test_manager_pass_on_empty_directory() {
    let (_dir, config) = setup();
    let scanner = Arc::new(RecoveryScanner::from_config(&config));
    let mut manager = RecoveryManager::new();
    scanner.register(&mut manager);

    let report = manager.recover_all(Outcome::Commit).unwrap();
    assert_eq!(report.resources, 0);
    assert!(report.resolved.is_empty());
    assert!(report.is_complete());
}
