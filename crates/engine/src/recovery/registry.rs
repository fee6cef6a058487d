//! Recovery registry
//!
//! A coordinator owns a [`RecoveryRegistry`]. At startup each resource kind
//! hands it one [`XaResourceRecovery`]; the coordinator later asks every
//! registered recovery for its resources and resolves whatever they report
//! as prepared.
//!
//! [`RecoveryManager`] is a self-contained registry that also runs the
//! resolution pass, for hosts without a coordinator of their own.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use xasim_core::{XaError, XaFlags, XaResource, Xid};

/// Errors raised while recovering branches
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// The record directory could not be enumerated
    #[error("failed to enumerate branch records in {dir}: {source}")]
    Storage {
        /// Directory being scanned
        dir: PathBuf,
        /// Underlying error
        #[source]
        source: XaError,
    },

    /// A record could not be read or decoded; the whole scan is abandoned
    #[error("failed to recover branch record {path}: {source}")]
    Record {
        /// Offending record file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: XaError,
    },

    /// A recovered resource could not be resolved
    #[error("failed to resolve branch {xid}: {source}")]
    Resolve {
        /// Branch being resolved
        xid: String,
        /// Underlying error
        #[source]
        source: XaError,
    },
}

/// Supplies the resources a coordinator should inspect during recovery
pub trait XaResourceRecovery: Send + Sync {
    /// Resources that may hold prepared branches
    fn xa_resources(&self) -> Result<Vec<Box<dyn XaResource>>, RecoveryError>;
}

/// Accepts recovery hand-offs at process startup
pub trait RecoveryRegistry {
    /// Register a recovery source
    fn add_xa_resource_recovery(&mut self, recovery: Arc<dyn XaResourceRecovery>);
}

/// How recovered branches are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Commit every recovered branch
    #[default]
    Commit,
    /// Roll back every recovered branch
    Rollback,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Commit => write!(f, "commit"),
            Outcome::Rollback => write!(f, "rollback"),
        }
    }
}

/// Result of one recovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Distinct resources inspected
    pub resources: usize,
    /// Resources dropped because `is_same_rm` matched an earlier one
    pub duplicates: usize,
    /// Branches resolved in this pass
    pub resolved: Vec<Xid>,
    /// Branches whose resolution must be retried later
    pub retry_later: Vec<Xid>,
}

impl RecoveryReport {
    /// True if nothing is left for a later pass
    pub fn is_complete(&self) -> bool {
        self.retry_later.is_empty()
    }
}

/// In-process recovery registry and resolution driver
#[derive(Default)]
pub struct RecoveryManager {
    recoveries: Vec<Arc<dyn XaResourceRecovery>>,
}

impl RecoveryManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered recoveries
    pub fn len(&self) -> usize {
        self.recoveries.len()
    }

    /// True if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.recoveries.is_empty()
    }

    /// Run one recovery pass, resolving every prepared branch by `outcome`
    ///
    /// Resources are deduplicated with `is_same_rm`. A retryable failure
    /// is recorded in the report and the pass continues; any other failure
    /// aborts the pass.
    pub fn recover_all(&self, outcome: Outcome) -> Result<RecoveryReport, RecoveryError> {
        let mut report = RecoveryReport::default();
        let mut resources: Vec<Box<dyn XaResource>> = Vec::new();

        for recovery in &self.recoveries {
            for resource in recovery.xa_resources()? {
                if is_known(&resources, resource.as_ref())? {
                    report.duplicates += 1;
                    continue;
                }
                resources.push(resource);
            }
        }
        report.resources = resources.len();

        for resource in resources.iter_mut() {
            let xids = resource
                .recover(XaFlags::START_RSCAN | XaFlags::END_RSCAN)
                .map_err(|source| RecoveryError::Resolve {
                    xid: "<recover scan>".to_string(),
                    source,
                })?;

            for xid in xids {
                let result = match outcome {
                    Outcome::Commit => resource.commit(&xid, false),
                    Outcome::Rollback => resource.rollback(&xid),
                };

                match result {
                    Ok(()) => report.resolved.push(xid),
                    Err(e) if e.is_retryable() => {
                        warn!(xid = %xid, error = %e, "Branch resolution deferred");
                        report.retry_later.push(xid);
                    }
                    Err(source) => {
                        return Err(RecoveryError::Resolve {
                            xid: xid.to_string(),
                            source,
                        })
                    }
                }
            }
        }

        info!(
            %outcome,
            resources = report.resources,
            resolved = report.resolved.len(),
            retry_later = report.retry_later.len(),
            "Recovery pass finished"
        );
        Ok(report)
    }
}

impl RecoveryRegistry for RecoveryManager {
    fn add_xa_resource_recovery(&mut self, recovery: Arc<dyn XaResourceRecovery>) {
        self.recoveries.push(recovery);
    }
}

fn is_known(known: &[Box<dyn XaResource>], candidate: &dyn XaResource) -> Result<bool, RecoveryError> {
    for resource in known {
        let same = resource
            .is_same_rm(candidate)
            .map_err(|source| RecoveryError::Resolve {
                xid: "<is_same_rm>".to_string(),
                source,
            })?;
        if same {
            return Ok(true);
        }
    }
    Ok(false)
}
