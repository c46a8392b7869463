//! Shared plumbing for the SMB client crates: the error taxonomy, the result alias used
//! across every fallible operation, and a logging facade that compiles away when the
//! `tracing` feature is off.

use error::SMBCError;

pub mod error;
pub mod logging;

pub type SMBCResult<T> = Result<T, SMBCError>;
