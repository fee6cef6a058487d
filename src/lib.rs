//! xasim: a crash-prone XA participant
//!
//! A resource manager that protects no data. It writes one durable record
//! per prepared branch, can halt the process in the middle of commit, and
//! ships a recovery scanner that rebuilds the prepared branches after a
//! restart. Use it to check that a transaction coordinator finishes
//! in-doubt branches after a crash.
//!
//! ```no_run
//! use std::sync::Arc;
//! use xasim::{DummyParticipant, Outcome, RecoveryManager, RecoveryScanner, XaResource, XaSimConfig, Xid};
//!
//! let config = XaSimConfig::default();
//! let xid = Xid::new(131077, b"gtrid".to_vec(), b"bqual".to_vec());
//!
//! let mut participant = DummyParticipant::new(&config, false);
//! participant.prepare(&xid)?;
//! participant.commit(&xid, false)?;
//!
//! // After a restart
//! let scanner = Arc::new(RecoveryScanner::from_config(&config));
//! let mut manager = RecoveryManager::new();
//! scanner.register(&mut manager);
//! manager.recover_all(Outcome::Commit)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod types;

pub use types::*;

/// Codec for the branch record file format
pub use xasim_durability::codec;
