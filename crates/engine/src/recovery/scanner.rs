//! Directory-wide recovery of branch records
//!
//! After a restart the scanner lists the record directory and rebuilds one
//! prepared [`DummyParticipant`] per record. Any unreadable record fails the
//! whole scan: a partial set of recovered branches would let the
//! coordinator believe the rest were resolved.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};
use xasim_core::{XaResource, XaSimConfig, Xid};
use xasim_durability::BranchLog;

use super::registry::{RecoveryError, RecoveryRegistry, XaResourceRecovery};
use crate::participant::DummyParticipant;

/// Rebuilds participants from the branch records in one directory
#[derive(Debug)]
pub struct RecoveryScanner {
    log: BranchLog,
    registered: AtomicBool,
}

impl RecoveryScanner {
    /// Create a scanner over `log`'s directory
    pub fn new(log: BranchLog) -> Self {
        Self {
            log,
            registered: AtomicBool::new(false),
        }
    }

    /// Create a scanner over `config.record_dir`
    pub fn from_config(config: &XaSimConfig) -> Self {
        Self::new(BranchLog::new(&config.record_dir))
    }

    /// The log being scanned
    pub fn log(&self) -> &BranchLog {
        &self.log
    }

    /// Hand this scanner to `registry`
    ///
    /// Only the first call registers; later calls log a warning and return
    /// `false`.
    pub fn register(self: &Arc<Self>, registry: &mut dyn RecoveryRegistry) -> bool {
        if self.registered.swap(true, Ordering::AcqRel) {
            warn!(dir = %self.log.dir().display(), "Recovery scanner already registered");
            return false;
        }

        info!(dir = %self.log.dir().display(), "Registering recovery scanner");
        registry.add_xa_resource_recovery(Arc::clone(self) as Arc<dyn XaResourceRecovery>);
        true
    }

    /// Rebuild a prepared participant for every record on disk
    pub fn scan(&self) -> Result<Vec<DummyParticipant>, RecoveryError> {
        let handles = self.log.list().map_err(|source| RecoveryError::Storage {
            dir: self.log.dir().to_path_buf(),
            source,
        })?;

        let mut participants = Vec::with_capacity(handles.len());
        for handle in handles {
            let path = handle.path().to_path_buf();
            let participant = DummyParticipant::from_record(self.log.clone(), handle)
                .map_err(|source| RecoveryError::Record { path, source })?;
            participants.push(participant);
        }

        if !participants.is_empty() {
            let xids: Vec<String> = participants
                .iter()
                .filter_map(DummyParticipant::xid)
                .map(Xid::to_string)
                .collect();
            info!(
                dir = %self.log.dir().display(),
                count = participants.len(),
                xids = ?xids,
                "Recovered prepared branches"
            );
        }

        Ok(participants)
    }
}

impl XaResourceRecovery for RecoveryScanner {
    fn xa_resources(&self) -> Result<Vec<Box<dyn XaResource>>, RecoveryError> {
        Ok(self
            .scan()?
            .into_iter()
            .map(|participant| Box::new(participant) as Box<dyn XaResource>)
            .collect())
    }
}
