use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_till};
use nom::character::complete::{char, digit1, hex_digit1};
use nom::combinator::{all_consuming, map_res, recognize, rest};
use nom::sequence::{preceded, separated_pair, terminated, tuple};
use nom::IResult;
use serde::{Deserialize, Serialize};

use smbc_core::error::SMBCError;
use smbc_core::logging::trace;
use smbc_core::SMBCResult;

use crate::xattr::access_mask::{AceFlags, AceType, NTAccessMask};

/// One `<type>/<flags>/<mask>` access-control entry.
///
/// The first two fields are kept exactly as the server sent them; only the mask is
/// decoded, and it is always written back in decimal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct AclEntry {
    ace_type: String,
    flags: String,
    mask: u32,
}

impl AclEntry {
    pub fn new(ace_type: AceType, flags: AceFlags, mask: NTAccessMask) -> Self {
        Self {
            ace_type: (ace_type as u8).to_string(),
            flags: flags.bits().to_string(),
            mask: mask.bits(),
        }
    }

    pub fn ace_type(&self) -> &str {
        &self.ace_type
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn access_mask(&self) -> NTAccessMask {
        NTAccessMask::from_bits_retain(self.mask)
    }

    /// The entry kind, when the type field holds a value this crate knows.
    pub fn kind(&self) -> Option<AceType> {
        let value = parse_number(&self.ace_type).ok()?;
        u8::try_from(value).ok().and_then(|x| AceType::try_from(x).ok())
    }

    pub fn ace_flags(&self) -> Option<AceFlags> {
        let value = parse_number(&self.flags).ok()?;
        u8::try_from(value).ok().map(AceFlags::from_bits_retain)
    }
}

impl FromStr for AclEntry {
    type Err = SMBCError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (ace_type, flags, mask)) = all_consuming(permission)(s.trim())
            .map_err(|_e| SMBCError::format_error(format!("invalid ACL permission {:?}", s)))?;
        Ok(Self {
            ace_type: ace_type.into(),
            flags: flags.into(),
            mask,
        })
    }
}

impl Display for AclEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.ace_type, self.flags, self.mask)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct PrincipalEntries {
    principal: String,
    entries: Vec<AclEntry>,
}

/// Owner, group and access-control list of a file, as exchanged through the
/// `system.nt_sec_desc.*` extended attributes.
///
/// Compare descriptors with [`equivalent`]; servers may reorder entries on read-back.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SecurityDescriptor {
    revision: Option<u32>,
    owner: Option<String>,
    group: Option<String>,
    entries: Vec<PrincipalEntries>,
}

impl SecurityDescriptor {
    pub fn new<O: Into<String>, G: Into<String>>(revision: u32, owner: O, group: G) -> Self {
        Self {
            revision: Some(revision),
            owner: Some(owner.into()),
            group: Some(group.into()),
            entries: Vec::new(),
        }
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn set_revision(&mut self, revision: u32) -> &mut Self {
        self.revision = Some(revision);
        self
    }

    pub fn set_owner<T: Into<String>>(&mut self, owner: T) -> &mut Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn set_group<T: Into<String>>(&mut self, group: T) -> &mut Self {
        self.group = Some(group.into());
        self
    }

    /// Appends `entry` to the principal's list, creating the list on first use.
    pub fn push_entry<T: Into<String>>(&mut self, principal: T, entry: AclEntry) -> &mut Self {
        let principal = principal.into();
        match self.entries.iter_mut().find(|x| x.principal == principal) {
            Some(existing) => existing.entries.push(entry),
            None => self.entries.push(PrincipalEntries {
                principal,
                entries: vec![entry],
            }),
        }
        self
    }

    pub fn entries_for(&self, principal: &str) -> Option<&[AclEntry]> {
        self.entries.iter()
            .find(|x| x.principal == principal)
            .map(|x| x.entries.as_slice())
    }

    pub fn principals(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|x| x.principal.as_str())
    }

    /// Every entry paired with its principal, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &AclEntry)> {
        self.entries.iter()
            .flat_map(|x| x.entries.iter().map(move |e| (x.principal.as_str(), e)))
    }

    pub fn entry_count(&self) -> usize {
        self.entries.iter().map(|x| x.entries.len()).sum()
    }
}

impl FromStr for SecurityDescriptor {
    type Err = SMBCError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl Display for SecurityDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut separator = "";
        if let Some(revision) = self.revision {
            write!(f, "REVISION:{}", revision)?;
            separator = ",";
        }
        if let Some(owner) = &self.owner {
            write!(f, "{}OWNER:{}", separator, owner)?;
            separator = ",";
        }
        if let Some(group) = &self.group {
            write!(f, "{}GROUP:{}", separator, group)?;
            separator = ",";
        }
        for (principal, entry) in self.entries() {
            write!(f, "{}ACL:{}:{}", separator, principal, entry)?;
            separator = ",";
        }
        Ok(())
    }
}

/// Parses the comma-separated `KEY:VALUE` form returned by the get-attribute call.
///
/// Keys are matched case-insensitively and unknown keys are skipped. Surrounding
/// whitespace is ignored. A segment with no `:` is accepted only when it is a bare known
/// keyword other than `ACL`; it leaves that field as it was. Either the whole string
/// parses or nothing is returned.
pub fn parse(raw: &str) -> SMBCResult<SecurityDescriptor> {
    let mut descriptor = SecurityDescriptor::default();
    for segment in raw.split(',') {
        if segment.trim().is_empty() {
            continue;
        }
        let (key, value) = key_value(segment)?;
        match key.as_str() {
            "revision" => {
                let value = value.trim();
                if !value.is_empty() {
                    let revision = value.parse::<u32>()
                        .map_err(|_e| SMBCError::format_error(format!("invalid revision {:?}", value)))?;
                    descriptor.revision = Some(revision);
                }
            }
            "owner" => {
                if let Some(owner) = non_empty(value) {
                    descriptor.owner = Some(owner);
                }
            }
            "group" => {
                if let Some(group) = non_empty(value) {
                    descriptor.group = Some(group);
                }
            }
            "acl" => {
                let (principal, perm) = split_acl(value.trim())?;
                descriptor.push_entry(principal, perm.parse::<AclEntry>()?);
            }
            _ => trace!(key = key.as_str(), "ignoring unknown descriptor field"),
        }
    }
    Ok(descriptor)
}

/// Renders the form the set-attribute call expects: masks in decimal, no trailing comma.
pub fn serialize(descriptor: &SecurityDescriptor) -> String {
    descriptor.to_string()
}

/// Whether `actual` (typically read back from the server) carries only entries that
/// `expected` also has.
///
/// Every principal in `actual` must exist in `expected`, and each of its entries must
/// match one of `expected`'s entries for that principal once masks are compared
/// numerically. Entry order is ignored and repeated entries in `actual` are tolerated.
/// Revision, owner and group do not take part.
pub fn equivalent(expected: &SecurityDescriptor, actual: &SecurityDescriptor) -> bool {
    actual.entries.iter().all(|current| {
        match expected.entries_for(&current.principal) {
            Some(wanted) => current.entries.iter().all(|entry| wanted.contains(entry)),
            None => false,
        }
    })
}

fn key_value(segment: &str) -> SMBCResult<(String, &str)> {
    let pair: IResult<&str, (&str, &str)> =
        separated_pair(take_till(|c| c == ':'), char(':'), rest)(segment);
    match pair {
        Ok((_, (key, value))) => Ok((key.trim().to_ascii_lowercase(), value)),
        Err(_) => {
            let key = segment.trim().to_ascii_lowercase();
            match key.as_str() {
                "revision" | "owner" | "group" => Ok((key, "")),
                _ => Err(SMBCError::format_error(format!("segment {:?} has no ':' separator", segment))),
            }
        }
    }
}

fn split_acl(value: &str) -> SMBCResult<(&str, &str)> {
    let pair: IResult<&str, (&str, &str)> =
        separated_pair(take_till(|c| c == ':'), char(':'), rest)(value);
    let (_, (principal, perm)) = pair
        .map_err(|_e| SMBCError::format_error(format!("ACL value {:?} has no principal separator", value)))?;
    if principal.is_empty() {
        return Err(SMBCError::format_error(format!("ACL value {:?} names no principal", value)));
    }
    Ok((principal, perm))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() { None } else { Some(value.into()) }
}

fn numeric_text(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(preceded(tag_no_case("0x"), hex_digit1)),
        digit1,
    ))(input)
}

fn mask(input: &str) -> IResult<&str, u32> {
    map_res(numeric_text, parse_number)(input)
}

fn field(input: &str) -> IResult<&str, &str> {
    map_res(numeric_text, |x| parse_number(x).map(|_| x))(input)
}

fn permission(input: &str) -> IResult<&str, (&str, &str, u32)> {
    tuple((terminated(field, char('/')), terminated(field, char('/')), mask))(input)
}

/// Decimal, or hexadecimal with a `0x` prefix.
fn parse_number(text: &str) -> Result<u32, std::num::ParseIntError> {
    match text.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => u32::from_str_radix(&text[2..], 16),
        _ => text.parse::<u32>(),
    }
}
