//! # smbc
//!
//! Client-side logic that sits on top of a native SMB client library:
//!
//! - **Security descriptors** ([`xattr`]): the textual `REVISION:..,OWNER:..,GROUP:..,ACL:..`
//!   form exchanged through the `system.nt_sec_desc.*` extended attributes, with a parser,
//!   a serializer that writes masks the way the set-attribute call expects, and an
//!   order-insensitive [`equivalent`](xattr::equivalent) check.
//! - **Credential negotiation** ([`auth`]): a bounded state machine that retries a
//!   connection with the configured credentials, then the guest account, then an
//!   interactive prompt.
//! - **Namespace walking** ([`browse`]): workgroup, server and share listings retried
//!   through the negotiator.
//! - **Transport** ([`transport`]): the capability trait the native client implements.
//!
//! ## Quick Start
//!
//! ```
//! use smbc::xattr::{self, equivalent};
//!
//! let read_back = xattr::parse("REVISION:1,OWNER:S-1-5-32-544,GROUP:S-1-5-32-545,\
//!     ACL:S-1-1-0:0/0/0x00120089")?;
//! assert_eq!(xattr::serialize(&read_back),
//!     "REVISION:1,OWNER:S-1-5-32-544,GROUP:S-1-5-32-545,ACL:S-1-1-0:0/0/1179785");
//! assert!(equivalent(&read_back, &read_back));
//! # Ok::<(), smbc_core::error::SMBCError>(())
//! ```

/// Credential negotiation and the authentication callback contract.
pub mod auth;
/// Retrying namespace listings and security descriptor access.
pub mod browse;
/// The native client capability interface.
pub mod transport;
/// Security descriptor codec and extended attribute names.
pub mod xattr;
