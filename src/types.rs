//! Public types for the xasim API.
//!
//! This module re-exports types from the internal crates with a clean public interface.

// ============================================================================
// Protocol vocabulary
// ============================================================================

// Branch identity
pub use xasim_core::Xid;

// Coordinator-facing surface
pub use xasim_core::{Vote, XaFlags, XaResource};

// Errors and XA return codes
pub use xasim_core::{DecodeError, XaError, XaErrorCode, XaResult};

// Configuration
pub use xasim_core::{ConfigError, XaSimConfig, DEFAULT_RECORD_DIR};

// ============================================================================
// Durable records
// ============================================================================

pub use xasim_durability::{BranchLog, RecordHandle, RECORD_SUFFIX};

// ============================================================================
// Participant and recovery
// ============================================================================

pub use xasim_engine::{DummyParticipant, ParticipantState};
pub use xasim_engine::{HaltHook, InterceptHalt, ProcessHalt};
pub use xasim_engine::{
    Outcome, RecoveryError, RecoveryManager, RecoveryRegistry, RecoveryReport, RecoveryScanner,
    XaResourceRecovery,
};
