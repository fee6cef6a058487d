//! Coordinator-facing XA protocol surface
//!
//! [`XaResource`] is the capability a transaction coordinator drives: the
//! association verbs (`start`/`end`), the two-phase verbs
//! (`prepare`/`commit`/`rollback`), heuristic cleanup (`forget`), recovery
//! (`recover`), resource-manager identity (`is_same_rm`) and the timeout pair.

use std::any::Any;
use std::fmt;
use std::ops::BitOr;

use crate::error::XaResult;
use crate::xid::Xid;

/// Flag word passed to `start`, `end` and `recover`
///
/// Values are the standard `TM*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct XaFlags(i32);

impl XaFlags {
    /// No flags (`TMNOFLAGS`)
    pub const NONE: XaFlags = XaFlags(0x0000_0000);
    /// Caller is joining an existing branch (`TMJOIN`)
    pub const JOIN: XaFlags = XaFlags(0x0020_0000);
    /// Caller is resuming a suspended association (`TMRESUME`)
    pub const RESUME: XaFlags = XaFlags(0x0800_0000);
    /// Work completed successfully (`TMSUCCESS`)
    pub const SUCCESS: XaFlags = XaFlags(0x0400_0000);
    /// Work failed; branch is rollback-only (`TMFAIL`)
    pub const FAIL: XaFlags = XaFlags(0x2000_0000);
    /// Association is being suspended (`TMSUSPEND`)
    pub const SUSPEND: XaFlags = XaFlags(0x0200_0000);
    /// Start a recovery scan (`TMSTARTRSCAN`)
    pub const START_RSCAN: XaFlags = XaFlags(0x0100_0000);
    /// End a recovery scan (`TMENDRSCAN`)
    pub const END_RSCAN: XaFlags = XaFlags(0x0080_0000);
    /// One-phase commit optimization (`TMONEPHASE`)
    pub const ONE_PHASE: XaFlags = XaFlags(0x4000_0000);

    /// Wrap a raw flag word
    pub const fn from_bits(bits: i32) -> Self {
        XaFlags(bits)
    }

    /// Raw flag word
    pub const fn bits(self) -> i32 {
        self.0
    }

    /// True if every bit of `other` is set in `self`
    pub const fn contains(self, other: XaFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for XaFlags {
    type Output = XaFlags;

    fn bitor(self, rhs: XaFlags) -> XaFlags {
        XaFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for XaFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Outcome of the prepare phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Vote {
    /// Branch is prepared and must be resolved (`XA_OK`)
    Ok = 0,
    /// Branch did no work and is already resolved (`XA_RDONLY`)
    ReadOnly = 3,
}

impl Vote {
    /// Numeric XA return value
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Resource manager contract driven by a transaction coordinator
///
/// Each instance manages one branch and is driven by one coordinator thread
/// at a time, so mutating verbs take `&mut self`.
///
/// ## Error Handling
///
/// | Condition | Code |
/// |-----------|------|
/// | Storage or decode failure | `XAER_RMERR` |
/// | Record removal failed | `XA_RETRY` |
/// | Verb not valid in current state | `XAER_PROTO` |
/// | Xid not bound here | `XAER_NOTA` |
pub trait XaResource: Send + fmt::Debug {
    /// Associate the branch with the caller's work
    fn start(&mut self, xid: &Xid, flags: XaFlags) -> XaResult<()>;

    /// Dissociate the branch from the caller's work
    fn end(&mut self, xid: &Xid, flags: XaFlags) -> XaResult<()>;

    /// Phase one: make the branch durable and vote
    fn prepare(&mut self, xid: &Xid) -> XaResult<Vote>;

    /// Phase two: commit the branch
    fn commit(&mut self, xid: &Xid, one_phase: bool) -> XaResult<()>;

    /// Phase two: roll the branch back
    fn rollback(&mut self, xid: &Xid) -> XaResult<()>;

    /// Discard knowledge of a heuristically completed branch
    fn forget(&mut self, xid: &Xid) -> XaResult<()>;

    /// Branches this resource holds in the prepared state
    fn recover(&self, flags: XaFlags) -> XaResult<Vec<Xid>>;

    /// True if `other` represents the same resource manager branch
    fn is_same_rm(&self, other: &dyn XaResource) -> XaResult<bool>;

    /// Current transaction timeout in seconds; zero means none
    fn transaction_timeout(&self) -> XaResult<u32>;

    /// Set the transaction timeout; returns whether it was accepted
    fn set_transaction_timeout(&mut self, seconds: u32) -> XaResult<bool>;

    /// Downcast support for `is_same_rm`
    fn as_any(&self) -> &dyn Any;
}
