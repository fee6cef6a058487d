//! Transaction branch identity
//!
//! An [`Xid`] names one branch of one global transaction. The coordinator
//! assigns it and hands it to every protocol verb; the participant only
//! stores it, compares it, and gives it back during recovery.

use std::fmt;

/// Identity of a single global transaction branch.
///
/// Immutable once constructed. Equality is structural: two identities are
/// equal when the format id and both byte sequences match exactly.
///
/// # Examples
///
/// ```
/// use xasim_core::Xid;
///
/// let a = Xid::new(7, b"gtrid".to_vec(), b"bqual".to_vec());
/// let b = Xid::new(7, b"gtrid".to_vec(), b"bqual".to_vec());
/// assert_eq!(a, b);
/// assert_eq!(a.global_transaction_id(), b"gtrid");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Xid {
    format_id: i32,
    global_transaction_id: Vec<u8>,
    branch_qualifier: Vec<u8>,
}

impl Xid {
    /// Create a new branch identity
    pub fn new(
        format_id: i32,
        global_transaction_id: impl Into<Vec<u8>>,
        branch_qualifier: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            format_id,
            global_transaction_id: global_transaction_id.into(),
            branch_qualifier: branch_qualifier.into(),
        }
    }

    /// Coordinator-assigned namespace tag
    pub fn format_id(&self) -> i32 {
        self.format_id
    }

    /// Global transaction id bytes
    pub fn global_transaction_id(&self) -> &[u8] {
        &self.global_transaction_id
    }

    /// Branch qualifier bytes
    pub fn branch_qualifier(&self) -> &[u8] {
        &self.branch_qualifier
    }
}

// Display for log lines: format_id:gtrid:bqual with hex-encoded bytes
impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.format_id,
            hex::encode(&self.global_transaction_id),
            hex::encode(&self.branch_qualifier)
        )
    }
}
