//! Crash-prone XA participant
//!
//! A [`DummyParticipant`] protects no data. Its only job is to leave a
//! durable branch record behind at the right moment so a coordinator's
//! recovery path can be exercised.
//!
//! # States
//!
//! ```text
//! [new] --> Idle --prepare--> Prepared --commit/rollback--> Resolved
//!                                ^
//! [recovered] -------------------+
//! ```
//!
//! A crash-flagged participant halts the process inside `commit`, before
//! the record is removed, so the branch survives as prepared.

use std::any::Any;
use std::sync::Arc;

use tracing::{info, warn};
use xasim_core::{Vote, XaError, XaFlags, XaResource, XaResult, XaSimConfig, Xid};
use xasim_durability::{BranchLog, RecordHandle};

use crate::halt::{HaltHook, ProcessHalt};

/// Lifecycle of one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticipantState {
    /// No identity bound
    Idle,
    /// Identity bound and its record is durable
    Prepared,
    /// Committed, rolled back or forgotten
    Resolved,
}

/// XA participant backed by one branch record file
#[derive(Debug)]
pub struct DummyParticipant {
    log: BranchLog,
    should_crash: bool,
    crash_exit_code: i32,
    halt: Arc<dyn HaltHook>,
    state: ParticipantState,
    xid: Option<Xid>,
    record: Option<RecordHandle>,
}

impl DummyParticipant {
    /// Create a fresh participant writing records under `config.record_dir`
    ///
    /// With `should_crash`, `commit` halts the process before releasing the
    /// record.
    pub fn new(config: &XaSimConfig, should_crash: bool) -> Self {
        Self {
            log: BranchLog::new(&config.record_dir),
            should_crash,
            crash_exit_code: config.crash_exit_code,
            halt: Arc::new(ProcessHalt),
            state: ParticipantState::Idle,
            xid: None,
            record: None,
        }
    }

    /// Rebuild a prepared participant from an existing record
    ///
    /// Recovered participants are never crash-flagged.
    pub fn from_record(log: BranchLog, record: RecordHandle) -> XaResult<Self> {
        let xid = log.read(&record)?;
        Ok(Self::recovered(log, xid, record))
    }

    pub(crate) fn recovered(log: BranchLog, xid: Xid, record: RecordHandle) -> Self {
        Self {
            log,
            should_crash: false,
            crash_exit_code: 0,
            halt: Arc::new(ProcessHalt),
            state: ParticipantState::Prepared,
            xid: Some(xid),
            record: Some(record),
        }
    }

    /// Replace the hook invoked on a simulated crash
    pub fn with_halt_hook(mut self, hook: Arc<dyn HaltHook>) -> Self {
        self.halt = hook;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> ParticipantState {
        self.state
    }

    /// Bound identity, if any
    pub fn xid(&self) -> Option<&Xid> {
        self.xid.as_ref()
    }

    /// Bound record, if any
    pub fn record(&self) -> Option<&RecordHandle> {
        self.record.as_ref()
    }

    /// True if `commit` simulates a crash
    pub fn should_crash(&self) -> bool {
        self.should_crash
    }

    fn check_bound(&self, xid: &Xid, verb: &str) -> XaResult<()> {
        match &self.xid {
            Some(bound) if bound != xid => Err(XaError::unknown_branch(format!(
                "{verb} of {xid}, participant holds {bound}"
            ))),
            _ => Ok(()),
        }
    }

    /// Delete the record and clear the binding. On failure nothing changes.
    fn release(&mut self) -> XaResult<()> {
        self.log.remove(&mut self.record)?;
        self.xid = None;
        self.state = ParticipantState::Resolved;
        Ok(())
    }
}

impl XaResource for DummyParticipant {
    fn start(&mut self, _xid: &Xid, _flags: XaFlags) -> XaResult<()> {
        Ok(())
    }

    fn end(&mut self, _xid: &Xid, _flags: XaFlags) -> XaResult<()> {
        Ok(())
    }

    fn prepare(&mut self, xid: &Xid) -> XaResult<Vote> {
        info!(xid = %xid, "Preparing branch");

        if self.state != ParticipantState::Idle {
            return Err(XaError::protocol(format!(
                "prepare of {xid} in state {:?}",
                self.state
            )));
        }

        let record = self.log.write(xid)?;
        self.xid = Some(xid.clone());
        self.record = Some(record);
        self.state = ParticipantState::Prepared;
        Ok(Vote::Ok)
    }

    fn commit(&mut self, xid: &Xid, one_phase: bool) -> XaResult<()> {
        info!(xid = %xid, one_phase, "Committing branch");

        if self.should_crash {
            info!(
                xid = %xid,
                code = self.crash_exit_code,
                "Crashing the process before releasing branch record"
            );
            self.halt.halt(self.crash_exit_code);
            return Err(XaError::Halted {
                code: self.crash_exit_code,
            });
        }

        match self.state {
            ParticipantState::Prepared => {
                self.check_bound(xid, "commit")?;
                self.release()
            }
            ParticipantState::Idle if one_phase => {
                self.state = ParticipantState::Resolved;
                Ok(())
            }
            ParticipantState::Idle => Err(XaError::protocol(format!(
                "two-phase commit of unprepared branch {xid}"
            ))),
            ParticipantState::Resolved => Err(XaError::unknown_branch(format!(
                "commit of {xid} after resolution"
            ))),
        }
    }

    fn rollback(&mut self, xid: &Xid) -> XaResult<()> {
        info!(xid = %xid, "Rolling back branch");

        match self.state {
            ParticipantState::Prepared => {
                self.check_bound(xid, "rollback")?;
                self.release()
            }
            ParticipantState::Idle => {
                self.state = ParticipantState::Resolved;
                Ok(())
            }
            ParticipantState::Resolved => Err(XaError::unknown_branch(format!(
                "rollback of {xid} after resolution"
            ))),
        }
    }

    fn forget(&mut self, xid: &Xid) -> XaResult<()> {
        self.check_bound(xid, "forget")?;

        if let Some(record) = self.record.take() {
            warn!(xid = %xid, path = %record, "Forgetting branch, record left on disk");
        }
        self.xid = None;
        self.state = ParticipantState::Resolved;
        Ok(())
    }

    fn recover(&self, _flags: XaFlags) -> XaResult<Vec<Xid>> {
        Ok(self.xid.iter().cloned().collect())
    }

    fn is_same_rm(&self, other: &dyn XaResource) -> XaResult<bool> {
        let Some(other) = other.as_any().downcast_ref::<DummyParticipant>() else {
            return Ok(false);
        };

        Ok(match (&self.xid, &other.xid) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => false,
        })
    }

    fn transaction_timeout(&self) -> XaResult<u32> {
        Ok(0)
    }

    fn set_transaction_timeout(&mut self, _seconds: u32) -> XaResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
