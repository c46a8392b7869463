use bitflags::bitflags;
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Access rights carried in the third field of an `ACL:` entry.
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NTAccessMask: u32 {
        const FILE_READ_DATA         = 0x00000001;
        const FILE_WRITE_DATA        = 0x00000002;
        const FILE_APPEND_DATA       = 0x00000004;
        const FILE_READ_EA           = 0x00000008;
        const FILE_WRITE_EA          = 0x00000010;
        const FILE_EXECUTE           = 0x00000020;
        const FILE_DELETE_CHILD      = 0x00000040;
        const FILE_READ_ATTRIBUTES   = 0x00000080;
        const FILE_WRITE_ATTRIBUTES  = 0x00000100;
        const DELETE                 = 0x00010000;
        const READ_CONTROL           = 0x00020000;
        const WRITE_DAC              = 0x00040000;
        const WRITE_OWNER            = 0x00080000;
        const SYNCHRONIZE            = 0x00100000;
        const ACCESS_SYSTEM_SECURITY = 0x01000000;
        const MAXIMUM_ALLOWED        = 0x02000000;
        const GENERIC_ALL            = 0x10000000;
        const GENERIC_EXECUTE        = 0x20000000;
        const GENERIC_WRITE          = 0x40000000;
        const GENERIC_READ           = 0x80000000;

        // Composite masks as Samba reports them for the R, W, X and RWX shorthands.
        const READ                   = 0x00120089;
        const WRITE                  = 0x00120116;
        const EXECUTE                = 0x001200a0;
        const READ_WRITE_EXECUTE     = 0x001e01ff;
    }
}

bitflags! {
    /// Inheritance flags carried in the second field of an `ACL:` entry.
    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AceFlags: u8 {
        const OBJECT_INHERIT       = 0x01;
        const CONTAINER_INHERIT    = 0x02;
        const NO_PROPAGATE_INHERIT = 0x04;
        const INHERIT_ONLY         = 0x08;
        const INHERITED            = 0x10;
        const SUCCESSFUL_ACCESS    = 0x40;
        const FAILED_ACCESS        = 0x80;
    }
}

/// First field of an `ACL:` entry.
#[repr(u8)]
#[derive(Debug, Eq, PartialEq, TryFromPrimitive, Serialize, Deserialize, Copy, Clone)]
pub enum AceType {
    AccessAllowed = 0,
    AccessDenied = 1,
    SystemAudit = 2,
    SystemAlarm = 3,
}

impl NTAccessMask {
    /// Names of the individual rights set in this mask, skipping the composite shorthands.
    pub fn right_names(&self) -> Vec<&'static str> {
        Self::all()
            .iter_names()
            .filter(|(_, flag)| flag.bits().count_ones() == 1 && self.contains(*flag))
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_masks_are_built_from_named_rights() {
        let read = NTAccessMask::FILE_READ_DATA
            | NTAccessMask::FILE_READ_EA
            | NTAccessMask::FILE_READ_ATTRIBUTES
            | NTAccessMask::READ_CONTROL
            | NTAccessMask::SYNCHRONIZE;
        assert_eq!(read, NTAccessMask::READ);
        assert!(NTAccessMask::READ_WRITE_EXECUTE.contains(NTAccessMask::READ));
        assert!(NTAccessMask::READ_WRITE_EXECUTE.contains(NTAccessMask::WRITE));
        assert!(NTAccessMask::READ_WRITE_EXECUTE.contains(NTAccessMask::EXECUTE));
        assert!(!NTAccessMask::READ_WRITE_EXECUTE.contains(NTAccessMask::DELETE));
    }

    #[test]
    fn right_names_lists_single_bits_only() {
        let names = NTAccessMask::EXECUTE.right_names();
        assert_eq!(names, vec!["FILE_EXECUTE", "FILE_READ_ATTRIBUTES", "READ_CONTROL", "SYNCHRONIZE"]);
    }

    #[test]
    fn ace_type_from_wire_value() {
        assert_eq!(AceType::try_from(0u8).unwrap(), AceType::AccessAllowed);
        assert_eq!(AceType::try_from(1u8).unwrap(), AceType::AccessDenied);
        assert!(AceType::try_from(9u8).is_err());
    }
}
