//! Participant engine for xasim
//!
//! - `participant`: the crash-prone XA participant and its state machine
//! - `recovery`: the recovery scanner and the registry it is handed to
//! - `halt`: injectable process halt used by simulated crashes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod halt;
pub mod participant;
pub mod recovery;

pub use halt::{HaltHook, InterceptHalt, ProcessHalt};
pub use participant::{DummyParticipant, ParticipantState};
pub use recovery::{
    Outcome, RecoveryError, RecoveryManager, RecoveryRegistry, RecoveryReport, RecoveryScanner,
    XaResourceRecovery,
};
