//! Core types for xasim
//!
//! This crate defines the vocabulary shared by every other crate:
//! - Xid: immutable transaction branch identity
//! - XaResource: the coordinator-facing protocol surface
//! - XaError / XaErrorCode: the fixed resource-manager error vocabulary
//! - XaSimConfig: record directory and crash settings

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod xa;
pub mod xid;

pub use config::{ConfigError, XaSimConfig, DEFAULT_RECORD_DIR};
pub use error::{DecodeError, XaError, XaErrorCode, XaResult};
pub use xa::{Vote, XaFlags, XaResource};
pub use xid::Xid;
