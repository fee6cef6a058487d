//! Crash/recovery integration tests
//!
//! These tests walk a branch through a full coordinator round-trip:
//! - prepare on a fresh participant
//! - simulated crash during commit (halt intercepted)
//! - "restart": drop everything, scan the record directory
//! - resolve the recovered branch and check the directory is clean

use std::sync::Arc;
use tempfile::TempDir;
use xasim_core::{XaError, XaFlags, XaResource, XaSimConfig, Xid};
use xasim_engine::{
    DummyParticipant, InterceptHalt, Outcome, ParticipantState, RecoveryManager, RecoveryScanner,
};

fn config_in(temp_dir: &TempDir) -> XaSimConfig {
    XaSimConfig::new().record_dir(temp_dir.path().join("DummyXAResource"))
}

fn branch(n: u8) -> Xid {
    Xid::new(131077, format!("gtrid-{n}").into_bytes(), vec![n])
}

/// Test: prepare → crash on commit → restart → scan finds the branch → commit
#[test]
fn test_crash_then_recover_commit() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let xid = branch(1);

    // Phase 1: prepare and crash
    let record_path = {
        let hook = Arc::new(InterceptHalt::new());
        let mut participant = DummyParticipant::new(&config, true).with_halt_hook(hook.clone());

        participant.start(&xid, XaFlags::NONE).unwrap();
        participant.end(&xid, XaFlags::SUCCESS).unwrap();
        participant.prepare(&xid).unwrap();
        let path = participant.record().unwrap().path().to_path_buf();
        assert!(path.exists());

        let err = participant.commit(&xid, false).unwrap_err();
        assert!(matches!(err, XaError::Halted { code: 1 }));
        assert_eq!(hook.calls(), vec![1]);

        // The record survives the crash
        assert!(path.exists());
        path
    };

    // Phase 2: restart and recover
    {
        let scanner = RecoveryScanner::from_config(&config);
        let mut recovered = scanner.scan().unwrap();

        assert_eq!(recovered.len(), 1);
        let participant = &mut recovered[0];
        assert_eq!(participant.xid(), Some(&xid));
        assert_eq!(participant.record().unwrap().path(), record_path);
        assert_eq!(participant.recover(XaFlags::START_RSCAN).unwrap(), vec![xid.clone()]);

        participant.commit(&xid, false).unwrap();
        assert_eq!(participant.state(), ParticipantState::Resolved);
        assert!(!record_path.exists());
    }

    // Phase 3: a second restart finds nothing
    {
        let scanner = RecoveryScanner::from_config(&config);
        assert!(scanner.scan().unwrap().is_empty());
    }
}

/// Test: a recovered participant matches the pre-crash one via is_same_rm
#[test]
fn test_recovered_identity_matches_original() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let xid = branch(2);

    let hook = Arc::new(InterceptHalt::new());
    let mut original = DummyParticipant::new(&config, true).with_halt_hook(hook);
    original.prepare(&xid).unwrap();
    let _ = original.commit(&xid, false);

    let recovered = RecoveryScanner::from_config(&config).scan().unwrap();
    assert_eq!(recovered.len(), 1);
    assert!(original.is_same_rm(&recovered[0]).unwrap());
    assert!(recovered[0].is_same_rm(&original).unwrap());
}

/// Test: normal commit leaves nothing for recovery
#[test]
fn test_normal_commit_leaves_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let xid = branch(3);

    let mut participant = DummyParticipant::new(&config, false);
    participant.prepare(&xid).unwrap();
    let path = participant.record().unwrap().path().to_path_buf();
    participant.commit(&xid, false).unwrap();

    assert!(!path.exists());
    assert!(RecoveryScanner::from_config(&config).scan().unwrap().is_empty());
}

/// Test: normal rollback leaves nothing for recovery
#[test]
fn test_normal_rollback_leaves_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);
    let xid = branch(4);

    let mut participant = DummyParticipant::new(&config, false);
    participant.prepare(&xid).unwrap();
    let path = participant.record().unwrap().path().to_path_buf();
    participant.rollback(&xid).unwrap();

    assert!(!path.exists());
    assert!(RecoveryScanner::from_config(&config).scan().unwrap().is_empty());
}

/// Test: only crashed branches survive when crashed and clean branches mix
#[test]
fn test_mixed_branches_only_crashed_survive() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);

    for n in 0..6u8 {
        let xid = branch(n);
        let crash = n % 2 == 0;
        let mut participant = DummyParticipant::new(&config, crash)
            .with_halt_hook(Arc::new(InterceptHalt::new()));
        participant.prepare(&xid).unwrap();
        let _ = participant.commit(&xid, false);
    }

    let mut survivors: Vec<u8> = RecoveryScanner::from_config(&config)
        .scan()
        .unwrap()
        .iter()
        .map(|p| p.xid().unwrap().branch_qualifier()[0])
        .collect();
    survivors.sort_unstable();

    assert_eq!(survivors, vec![0, 2, 4]);
}

/// Test: registry-driven pass resolves everything left by a crash
#[test]
fn test_registry_pass_after_crash() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir);

    for n in 0..3u8 {
        let xid = branch(n);
        let mut participant =
            DummyParticipant::new(&config, true).with_halt_hook(Arc::new(InterceptHalt::new()));
        participant.prepare(&xid).unwrap();
        let _ = participant.commit(&xid, false);
    }

    let scanner = Arc::new(RecoveryScanner::from_config(&config));
    let mut manager = RecoveryManager::new();
    assert!(scanner.register(&mut manager));

    let report = manager.recover_all(Outcome::Rollback).unwrap();
    assert_eq!(report.resolved.len(), 3);
    assert!(report.is_complete());

    // Second pass has nothing to do
    let report = manager.recover_all(Outcome::Rollback).unwrap();
    assert!(report.resolved.is_empty());
    assert!(scanner.scan().unwrap().is_empty());
}
