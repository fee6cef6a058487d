//! Error types for the participant protocol
//!
//! Every failure a coordinator can observe maps onto one of the standard XA
//! resource-manager error codes ([`XaErrorCode`]). The richer [`XaError`]
//! carries the cause for logs while [`XaError::code`] gives the coordinator
//! the fixed vocabulary it understands.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for participant operations
pub type XaResult<T> = std::result::Result<T, XaError>;

/// Malformed or truncated branch record bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended before a fixed-size field could be read
    #[error("truncated record: needed {needed} bytes for {field}, {remaining} remaining")]
    Truncated {
        /// Field being read
        field: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes left in the input
        remaining: usize,
    },

    /// A length prefix was negative
    #[error("negative length {length} declared for {field}")]
    NegativeLength {
        /// Field whose length prefix was read
        field: &'static str,
        /// The declared length
        length: i32,
    },

    /// A length prefix points past the end of the input
    #[error("declared length {declared} for {field} exceeds {remaining} remaining bytes")]
    LengthOverrun {
        /// Field whose length prefix was read
        field: &'static str,
        /// The declared length
        declared: usize,
        /// Bytes left in the input
        remaining: usize,
    },

    /// Bytes left over after the branch qualifier
    #[error("{0} trailing bytes after branch qualifier")]
    TrailingBytes(usize),
}

/// Standard XA resource-manager return codes
///
/// Numeric values match the X/Open XA specification so they can be passed
/// straight through to a coordinator that speaks the C or JTA contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum XaErrorCode {
    /// Routine returned with no effect and may be reissued (`XA_RETRY`)
    Retry = 4,
    /// Resource manager error occurred in the branch (`XAER_RMERR`)
    RmErr = -3,
    /// The XID is not valid (`XAER_NOTA`)
    NotA = -4,
    /// Invalid arguments were given (`XAER_INVAL`)
    Inval = -5,
    /// Routine invoked in an improper context (`XAER_PROTO`)
    Proto = -6,
    /// Resource manager unavailable (`XAER_RMFAIL`)
    RmFail = -7,
}

impl XaErrorCode {
    /// Numeric XA return value
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Symbolic XA name
    pub fn name(self) -> &'static str {
        match self {
            XaErrorCode::Retry => "XA_RETRY",
            XaErrorCode::RmErr => "XAER_RMERR",
            XaErrorCode::NotA => "XAER_NOTA",
            XaErrorCode::Inval => "XAER_INVAL",
            XaErrorCode::Proto => "XAER_PROTO",
            XaErrorCode::RmFail => "XAER_RMFAIL",
        }
    }
}

impl std::fmt::Display for XaErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_i32())
    }
}

/// Errors surfaced to the coordinator by a participant
#[derive(Debug, Error)]
pub enum XaError {
    /// Branch record bytes could not be decoded
    #[error("malformed branch record: {0}")]
    Decode(#[from] DecodeError),

    /// Directory or file creation, read, or write failed
    #[error("storage failure at {path}: {source}")]
    Storage {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Branch record could not be deleted; resolution should be retried later
    #[error("could not remove branch record {path}, retry resolution: {source}")]
    Retry {
        /// Record file that is still on disk (or in an unknown state)
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Verb invoked in a state that does not allow it
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The xid is not bound to this participant
    #[error("unknown branch: {0}")]
    UnknownBranch(String),

    /// The xid cannot be represented in a branch record
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A crash was requested but the halt hook returned control
    #[error("halt intercepted with exit code {code}")]
    Halted {
        /// Exit code passed to the hook
        code: i32,
    },
}

impl XaError {
    /// Build a storage error for `path`
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        XaError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Build a retryable removal error for `path`
    pub fn retry(path: impl Into<PathBuf>, source: io::Error) -> Self {
        XaError::Retry {
            path: path.into(),
            source,
        }
    }

    /// Build a protocol violation error
    pub fn protocol(message: impl Into<String>) -> Self {
        XaError::Protocol(message.into())
    }

    /// Build an unknown-branch error
    pub fn unknown_branch(message: impl Into<String>) -> Self {
        XaError::UnknownBranch(message.into())
    }

    /// Build an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        XaError::InvalidArgument(message.into())
    }

    /// The XA error code a coordinator sees for this error
    pub fn code(&self) -> XaErrorCode {
        match self {
            XaError::Decode(_) | XaError::Storage { .. } => XaErrorCode::RmErr,
            XaError::Retry { .. } => XaErrorCode::Retry,
            XaError::Protocol(_) => XaErrorCode::Proto,
            XaError::UnknownBranch(_) => XaErrorCode::NotA,
            XaError::InvalidArgument(_) => XaErrorCode::Inval,
            XaError::Halted { .. } => XaErrorCode::RmFail,
        }
    }

    /// True if the coordinator should retry resolution later
    pub fn is_retryable(&self) -> bool {
        matches!(self, XaError::Retry { .. })
    }
}
