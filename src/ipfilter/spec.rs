//! Allowed address specifications.
//!
//! A spec is one of four notations, told apart by a marker character:
//! - `*` wildcard, e.g. `192.168.*`
//! - `/` CIDR, e.g. `10.0.0.0/24`
//! - `-` section, e.g. `10.0.0.1-10.0.0.99`
//! - otherwise a single address
//!
//! Specs are kept as normalized strings. Nothing is validated up front, a
//! malformed spec just never matches.

use super::mask::{Cidr, MAX_V4_LENGTH, MAX_V6_LENGTH};
use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::net::IpAddr;
use std::str::FromStr;

/// Address family of a spec or query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Detect the family from the syntax alone: `:` means IPv6, `.` IPv4.
    pub fn detect(s: &str) -> Option<Family> {
        if s.contains(':') {
            Some(Family::V6)
        } else if s.contains('.') {
            Some(Family::V4)
        } else {
            None
        }
    }

    pub fn of_addr(addr: &IpAddr) -> Family {
        match addr {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }

    /// Width of the address in bits.
    pub fn max_prefix(self) -> u8 {
        match self {
            Family::V4 => MAX_V4_LENGTH,
            Family::V6 => MAX_V6_LENGTH,
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Family::V4 => write!(f, "IPv4"),
            Family::V6 => write!(f, "IPv6"),
        }
    }
}

/// Notation of a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecKind {
    Single,
    Cidr,
    Wildcard,
    Section,
}

impl SpecKind {
    /// Classify by marker; `*` wins over `/`, which wins over `-`.
    pub fn classify(s: &str) -> SpecKind {
        if s.contains('*') {
            SpecKind::Wildcard
        } else if s.contains('/') {
            SpecKind::Cidr
        } else if s.contains('-') {
            SpecKind::Section
        } else {
            SpecKind::Single
        }
    }
}

/// One normalized entry of a filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AllowedSpec(String);

impl AllowedSpec {
    /// Trim `raw` and, for CIDR notation, replace the address with its
    /// network address. Anything that does not parse is kept verbatim.
    pub fn new(raw: &str) -> AllowedSpec {
        let trimmed = raw.trim();
        if trimmed.contains('/') {
            if let Some(normalized) = normalize_cidr(trimmed) {
                return AllowedSpec(normalized);
            }
            log::trace!("Keeping unparsable CIDR spec verbatim: {trimmed:?}");
        }
        AllowedSpec(trimmed.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn family(&self) -> Option<Family> {
        Family::detect(&self.0)
    }

    pub fn kind(&self) -> SpecKind {
        SpecKind::classify(&self.0)
    }
}

fn normalize_cidr(spec: &str) -> Option<String> {
    let cidr = Cidr::new(spec).ok()?;
    let network = cidr.network().ok()?;
    Some(format!("{network}/{}", cidr.prefix))
}

impl FromStr for AllowedSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AllowedSpec::new(s))
    }
}

impl From<&str> for AllowedSpec {
    fn from(s: &str) -> Self {
        AllowedSpec::new(s)
    }
}

impl std::fmt::Display for AllowedSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for AllowedSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AllowedSpec {
    fn deserialize<D>(deserializer: D) -> Result<AllowedSpec, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AllowedSpec::new(&s))
    }
}
