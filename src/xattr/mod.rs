use std::fmt::{Display, Formatter};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use access_mask::*;
pub use security_descriptor::{equivalent, parse, serialize, AclEntry, SecurityDescriptor};

pub mod access_mask;
pub mod security_descriptor;

pub const XATTR_ALL: &str = "system.nt_sec_desc.*";
pub const XATTR_ALL_SID: &str = "system.nt_sec_desc.*+";
pub const XATTR_REVISION: &str = "system.nt_sec_desc.revision";
pub const XATTR_OWNER: &str = "system.nt_sec_desc.owner";
pub const XATTR_OWNER_SID: &str = "system.nt_sec_desc.owner+";
pub const XATTR_GROUP: &str = "system.nt_sec_desc.group";
pub const XATTR_GROUP_SID: &str = "system.nt_sec_desc.group+";
pub const XATTR_ACL: &str = "system.nt_sec_desc.acl";
pub const XATTR_ACL_SID: &str = "system.nt_sec_desc.acl+";

bitflags! {
    /// Flags for the set-attribute call.
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct XattrFlags: u32 {
        const CREATE  = 0x1;
        const REPLACE = 0x2;
    }
}

/// Addresses one field of the security descriptor attribute.
///
/// The `plus` variants carry the trailing `+` of the attribute name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum XattrName {
    All { plus: bool },
    Revision,
    Owner { plus: bool },
    Group { plus: bool },
    Acl { plus: bool },
    AclFor { principal: String, plus: bool },
}

impl XattrName {
    pub fn acl_for<T: Into<String>>(principal: T) -> Self {
        Self::AclFor { principal: principal.into(), plus: false }
    }
}

impl Display for XattrName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let plus = |x: &bool| if *x { "+" } else { "" };
        match self {
            Self::All { plus: p } => write!(f, "system.nt_sec_desc.*{}", plus(p)),
            Self::Revision => write!(f, "{}", XATTR_REVISION),
            Self::Owner { plus: p } => write!(f, "{}{}", XATTR_OWNER, plus(p)),
            Self::Group { plus: p } => write!(f, "{}{}", XATTR_GROUP, plus(p)),
            Self::Acl { plus: p } => write!(f, "{}{}", XATTR_ACL, plus(p)),
            Self::AclFor { principal, plus: p } => write!(f, "{}{}:{}", XATTR_ACL, plus(p), principal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_libsmbclient_constants() {
        assert_eq!(XattrName::All { plus: false }.to_string(), XATTR_ALL);
        assert_eq!(XattrName::All { plus: true }.to_string(), XATTR_ALL_SID);
        assert_eq!(XattrName::Owner { plus: true }.to_string(), XATTR_OWNER_SID);
        assert_eq!(XattrName::Group { plus: false }.to_string(), XATTR_GROUP);
        assert_eq!(XattrName::Acl { plus: true }.to_string(), XATTR_ACL_SID);
        assert_eq!(XattrName::Revision.to_string(), XATTR_REVISION);
    }

    #[test]
    fn per_principal_acl_name() {
        assert_eq!(XattrName::acl_for("S-1-1-0").to_string(), "system.nt_sec_desc.acl:S-1-1-0");
        let plus = XattrName::AclFor { principal: "S-1-1-0".into(), plus: true };
        assert_eq!(plus.to_string(), "system.nt_sec_desc.acl+:S-1-1-0");
    }

    #[test]
    fn flag_values() {
        assert_eq!(XattrFlags::CREATE.bits(), 1);
        assert_eq!(XattrFlags::REPLACE.bits(), 2);
    }
}
