//! Recovery module for prepared-but-unresolved branches
//!
//! This module contains:
//! - `scanner`: rebuilds participants from the branch records on disk
//! - `registry`: the hand-off point between scanners and a coordinator's
//!   recovery pass

mod registry;
mod scanner;

pub use registry::{
    Outcome, RecoveryError, RecoveryManager, RecoveryRegistry, RecoveryReport,
    XaResourceRecovery,
};
pub use scanner::RecoveryScanner;
