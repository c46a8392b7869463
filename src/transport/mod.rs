//! The narrow capability interface onto the native SMB client.
//!
//! Nothing in this crate speaks the SMB protocol. A [`Transport`] is whatever does:
//! a libsmbclient binding, a test double, or another client library.

use bitflags::bitflags;
use derive_builder::Builder;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

use smbc_core::SMBCResult;

use crate::auth::AuthCallback;
use crate::xattr::{XattrFlags, XattrName};

bitflags! {
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ContextFlags: u32 {
        const USE_KERBEROS            = 1 << 0;
        const FALLBACK_AFTER_KERBEROS = 1 << 1;
        const NO_AUTO_ANONYMOUS_LOGON = 1 << 2;
    }
}

/// Client context settings a transport is created with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Builder)]
#[builder(name = "ContextOptionsBuilder", pattern = "owned", default)]
#[serde(default)]
pub struct ContextOptions {
    /// libsmbclient debug level, 0 to 10.
    debug: u8,
    #[builder(setter(into))]
    netbios_name: String,
    #[builder(setter(into))]
    workgroup: String,
    /// Milliseconds.
    timeout: u32,
    flags: ContextFlags,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            debug: 0,
            netbios_name: String::new(),
            workgroup: "WORKGROUP".into(),
            timeout: 20_000,
            flags: ContextFlags::NO_AUTO_ANONYMOUS_LOGON,
        }
    }
}

impl ContextOptions {
    pub fn builder() -> ContextOptionsBuilder {
        ContextOptionsBuilder::default()
    }

    pub fn debug(&self) -> u8 {
        self.debug
    }

    pub fn netbios_name(&self) -> &str {
        &self.netbios_name
    }

    pub fn workgroup(&self) -> &str {
        &self.workgroup
    }

    pub fn timeout(&self) -> u32 {
        self.timeout
    }

    pub fn flags(&self) -> ContextFlags {
        self.flags
    }

    pub fn no_auto_anonymous_login(&self) -> bool {
        self.flags.contains(ContextFlags::NO_AUTO_ANONYMOUS_LOGON)
    }

    pub fn set_flags(&mut self, flags: ContextFlags) -> &mut Self {
        self.flags = flags;
        self
    }
}

/// Entry classification as tagged by libsmbclient.
#[repr(u32)]
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize, Copy, Clone, Hash)]
pub enum SMBCEntryType {
    Workgroup = 1,
    Server = 2,
    FileShare = 3,
    PrinterShare = 4,
    CommsShare = 5,
    IpcShare = 6,
    Dir = 7,
    File = 8,
    Link = 9,
}

impl SMBCEntryType {
    pub fn is_share(&self) -> bool {
        matches!(self, Self::FileShare | Self::PrinterShare | Self::CommsShare | Self::IpcShare)
    }
}

/// One directory entry as returned by a listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Dirent {
    pub name: String,
    pub comment: String,
    pub kind: SMBCEntryType,
}

impl Dirent {
    pub fn new<N: Into<String>, C: Into<String>>(name: N, comment: C, kind: SMBCEntryType) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            kind,
        }
    }
}

/// Capabilities the client core needs from the native SMB client.
///
/// Each call that may need credentials is handed the authentication callback; a
/// transport invokes it whenever the server requires credentials or rejects the ones
/// it has. Permission-class failures are reported as
/// [`SMBCError::AuthorizationError`](smbc_core::error::SMBCError::AuthorizationError)
/// or as a `PermissionDenied` I/O error.
pub trait Transport {
    fn options(&self) -> &ContextOptions;

    fn options_mut(&mut self) -> &mut ContextOptions;

    fn list_directory(&mut self, uri: &str, auth: &mut dyn AuthCallback) -> SMBCResult<Vec<Dirent>>;

    fn get_xattr(&mut self, uri: &str, name: &XattrName, auth: &mut dyn AuthCallback) -> SMBCResult<String>;

    fn set_xattr(&mut self, uri: &str, name: &XattrName, value: &str, flags: XattrFlags, auth: &mut dyn AuthCallback) -> SMBCResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_values_match_libsmbclient() {
        assert_eq!(SMBCEntryType::Workgroup as u32, 1);
        assert_eq!(SMBCEntryType::IpcShare as u32, 6);
        assert_eq!(SMBCEntryType::try_from(3u32).unwrap(), SMBCEntryType::FileShare);
        assert!(SMBCEntryType::try_from(0u32).is_err());
        assert!(SMBCEntryType::PrinterShare.is_share());
        assert!(!SMBCEntryType::Server.is_share());
    }

    #[test]
    fn builder_overrides_defaults() {
        let options = ContextOptions::builder()
            .workgroup("CORP")
            .timeout(5_000)
            .build()
            .unwrap();
        assert_eq!(options.workgroup(), "CORP");
        assert_eq!(options.timeout(), 5_000);
        assert!(options.no_auto_anonymous_login());
        assert_eq!(options.debug(), 0);
    }
}
