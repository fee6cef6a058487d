//! Durability layer for xasim
//!
//! - `codec`: binary encoding of a branch identity
//! - `record`: one-file-per-branch durable records (BranchLog, RecordHandle)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod record;

pub use codec::{decode, encode};
pub use record::{BranchLog, RecordHandle, RECORD_SUFFIX};
