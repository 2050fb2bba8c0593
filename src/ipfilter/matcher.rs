//! Membership checks, one per spec notation.
//!
//! IPv4 supports every notation. IPv6 supports single addresses and CIDR
//! blocks only; wildcard and section specs report [`FilterError::Unsupported`].

use super::error::FilterError;
use super::mask::Cidr;
use super::spec::{AllowedSpec, Family, SpecKind};
use std::net::{IpAddr, Ipv4Addr};

/// Check one spec against a parsed address.
///
/// A spec of the other family is never a match.
pub fn check_spec(spec: &AllowedSpec, ip: IpAddr) -> Result<bool, FilterError> {
    let family = Family::of_addr(&ip);
    if spec.family() != Some(family) {
        return Ok(false);
    }
    let kind = spec.kind();
    log::trace!("check_spec({spec}, {ip}) kind={kind:?}");

    match (ip, kind) {
        (IpAddr::V6(_), SpecKind::Wildcard) => Err(FilterError::Unsupported {
            family,
            operation: "wildcard matching",
        }),
        (IpAddr::V6(_), SpecKind::Section) => Err(FilterError::Unsupported {
            family,
            operation: "section matching",
        }),
        (IpAddr::V4(v4), SpecKind::Wildcard) => Ok(check_wildcard(spec.as_str(), v4)),
        (IpAddr::V4(v4), SpecKind::Section) => Ok(check_section(spec.as_str(), v4)),
        (_, SpecKind::Cidr) => Ok(check_mask(spec.as_str(), ip)),
        (_, SpecKind::Single) => Ok(check_single(spec.as_str(), ip)),
    }
}

/// Segment-wise compare up to the first `*`.
fn check_wildcard(allowed: &str, ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    for (i, segment) in allowed.split('.').enumerate() {
        if segment == "*" {
            return true;
        }
        match (segment.parse::<u8>(), octets.get(i)) {
            (Ok(want), Some(got)) if want == *got => continue,
            _ => return false,
        }
    }
    false
}

fn check_mask(allowed: &str, ip: IpAddr) -> bool {
    match Cidr::new(allowed) {
        Ok(cidr) => cidr.contains(ip),
        Err(_) => false,
    }
}

/// Inclusive `low-high` compare on the unsigned 32-bit value.
fn check_section(allowed: &str, ip: Ipv4Addr) -> bool {
    let Some((low, high)) = allowed.split_once('-') else {
        return false;
    };
    match (low.trim().parse::<Ipv4Addr>(), high.trim().parse::<Ipv4Addr>()) {
        (Ok(low), Ok(high)) => (u32::from(low)..=u32::from(high)).contains(&u32::from(ip)),
        _ => false,
    }
}

fn check_single(allowed: &str, ip: IpAddr) -> bool {
    allowed.parse::<IpAddr>().map_or(false, |addr| addr == ip)
}
