//! Address literal validation and canonicalization.
//!
//! Addresses travel through the filter as strings; this module converts them
//! to and from their packed binary form (4 or 16 bytes) and renders the
//! canonical text form.

use super::error::FilterError;
use super::mask::{MAX_V4_LENGTH, MAX_V6_LENGTH};
use super::spec::Family;
use itertools::Itertools;
use regex::Regex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

/// Regex for `address/prefix`; the address part is validated separately.
static CIDR_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_cidr_regex() -> &'static Regex {
    CIDR_REGEX.get_or_init(|| Regex::new(r"^([^/\s]+)/(\d{1,3})$").expect("Invalid Regex"))
}

/// Split `address/prefix` into its parts.
///
/// Returns `None` when the string has no mask suffix or the suffix is not a
/// number that fits in a `u8`.
pub fn split_cidr(s: &str) -> Option<(&str, u8)> {
    let caps = get_cidr_regex().captures(s)?;
    let addr = caps.get(1)?.as_str();
    let prefix = caps.get(2)?.as_str().parse::<u8>().ok()?;
    Some((addr, prefix))
}

/// True iff `s` is a bare IPv4 or IPv6 literal.
pub fn is_ip(s: &str) -> bool {
    !s.contains('/') && (is_ipv4(s, false) || is_ipv6(s, false))
}

/// Validate an IPv4 literal, optionally carrying a `/mask` suffix.
///
/// With `with_cidr` a bare literal is rejected.
pub fn is_ipv4(s: &str, with_cidr: bool) -> bool {
    match split_cidr(s) {
        Some((addr, prefix)) => prefix <= MAX_V4_LENGTH && addr.parse::<Ipv4Addr>().is_ok(),
        None if s.contains('/') => false,
        None => !with_cidr && s.parse::<Ipv4Addr>().is_ok(),
    }
}

/// Validate an IPv6 literal, optionally carrying a `/mask` suffix.
///
/// With `with_cidr` a bare literal is rejected.
pub fn is_ipv6(s: &str, with_cidr: bool) -> bool {
    match split_cidr(s) {
        Some((addr, prefix)) => prefix <= MAX_V6_LENGTH && addr.parse::<Ipv6Addr>().is_ok(),
        None if s.contains('/') => false,
        None => !with_cidr && s.parse::<Ipv6Addr>().is_ok(),
    }
}

/// Binary form of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackedAddr {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl PackedAddr {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            PackedAddr::V4(octets) => octets,
            PackedAddr::V6(octets) => octets,
        }
    }

    pub fn family(&self) -> Family {
        match self {
            PackedAddr::V4(_) => Family::V4,
            PackedAddr::V6(_) => Family::V6,
        }
    }

    pub fn to_ip_addr(self) -> IpAddr {
        match self {
            PackedAddr::V4(octets) => IpAddr::V4(Ipv4Addr::from(octets)),
            PackedAddr::V6(octets) => IpAddr::V6(Ipv6Addr::from(octets)),
        }
    }
}

impl From<IpAddr> for PackedAddr {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => PackedAddr::V4(v4.octets()),
            IpAddr::V6(v6) => PackedAddr::V6(v6.octets()),
        }
    }
}

/// Convert a literal to its packed binary form.
pub fn pack(ip: &str) -> Result<PackedAddr, FilterError> {
    ip.parse::<IpAddr>()
        .map(PackedAddr::from)
        .map_err(|_| FilterError::NotAnAddress(ip.to_string()))
}

/// Render 4 or 16 packed bytes as a canonical literal.
pub fn unpack(bytes: &[u8]) -> Result<String, FilterError> {
    let packed = if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        PackedAddr::V4(octets)
    } else if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        PackedAddr::V6(octets)
    } else {
        return Err(FilterError::InvalidPackedLength(bytes.len()));
    };
    Ok(packed.to_ip_addr().to_string())
}

/// Fully expanded IPv6 form: eight 4-digit groups, no `::` compression.
///
/// # Examples
/// ```
/// use ipfilter_vault::ipfilter::expand_ipv6;
/// assert_eq!(
///     expand_ipv6("fd00:1::64").unwrap(),
///     "fd00:0001:0000:0000:0000:0000:0000:0064"
/// );
/// ```
pub fn expand_ipv6(ip: &str) -> Result<String, FilterError> {
    let addr: Ipv6Addr = ip
        .trim()
        .parse()
        .map_err(|_| FilterError::NotAnAddress(ip.to_string()))?;
    Ok(addr.segments().iter().map(|s| format!("{s:04x}")).join(":"))
}

/// Canonical text form of `ip`, optionally suffixed with `/32` or `/128`.
pub fn format(ip: &str, with_cidr: bool) -> Option<String> {
    let packed = pack(ip.trim()).ok()?;
    let text = unpack(packed.as_bytes()).ok()?;
    if with_cidr {
        Some(format!("{text}/{}", packed.family().max_prefix()))
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ip() {
        assert!(is_ip("10.0.0.1"));
        assert!(is_ip("::1"));
        assert!(is_ip("fd00:1::64"));
        assert!(is_ip("::ffff:10.0.0.1"));
        assert!(!is_ip("10.0.0.1/24"));
        assert!(!is_ip("10.0.0.256"));
        assert!(!is_ip("10.0.0"));
        assert!(!is_ip("10.0.0.1:80"));
        assert!(!is_ip("fe80::1%eth0"));
        assert!(!is_ip("localhost"));
        assert!(!is_ip(""));
    }

    #[test]
    fn test_is_ipv4_with_cidr() {
        assert!(is_ipv4("10.0.0.1", false));
        assert!(!is_ipv4("10.0.0.1", true));
        assert!(is_ipv4("10.0.0.0/24", true));
        assert!(is_ipv4("10.0.0.0/24", false));
        assert!(is_ipv4("0.0.0.0/0", true));
        assert!(is_ipv4("10.0.0.0/32", true));
        assert!(!is_ipv4("10.0.0.0/33", true));
        assert!(!is_ipv4("10.0.0.0/", true));
        assert!(!is_ipv4("10.0.0.0/abc", false));
        assert!(!is_ipv4("fd00::/64", true));
    }

    #[test]
    fn test_is_ipv6_with_cidr() {
        assert!(is_ipv6("fd00::1", false));
        assert!(!is_ipv6("fd00::1", true));
        assert!(is_ipv6("fd00::/64", true));
        assert!(is_ipv6("::/0", true));
        assert!(is_ipv6("fd00::/128", true));
        assert!(!is_ipv6("fd00::/129", true));
        assert!(!is_ipv6("fd00::/999", true));
        assert!(!is_ipv6("10.0.0.0/24", true));
    }

    #[test]
    fn test_split_cidr() {
        assert_eq!(split_cidr("10.0.0.0/24"), Some(("10.0.0.0", 24)));
        assert_eq!(split_cidr("fd00::/64"), Some(("fd00::", 64)));
        assert_eq!(split_cidr("10.0.0.0"), None);
        assert_eq!(split_cidr("10.0.0.0/300"), None);
        assert_eq!(split_cidr("10.0.0.0/24/8"), None);
    }

    #[test]
    fn test_pack_unpack() {
        assert_eq!(pack("10.0.0.1").unwrap(), PackedAddr::V4([10, 0, 0, 1]));
        let packed = pack("fd00:1::64").unwrap();
        assert_eq!(packed.family(), Family::V6);
        assert_eq!(packed.as_bytes().len(), 16);
        assert_eq!(unpack(packed.as_bytes()).unwrap(), "fd00:1::64");
        assert_eq!(unpack(&[192, 168, 1, 1]).unwrap(), "192.168.1.1");
        assert_eq!(
            packed.to_ip_addr(),
            "fd00:1::64".parse::<IpAddr>().unwrap()
        );
        assert_eq!(PackedAddr::from(packed.to_ip_addr()), packed);
    }

    #[test]
    fn test_pack_rejects_non_ip() {
        assert_eq!(
            pack("not-an-ip").unwrap_err(),
            FilterError::NotAnAddress("not-an-ip".to_string())
        );
        assert_eq!(
            unpack(&[1, 2, 3]).unwrap_err(),
            FilterError::InvalidPackedLength(3)
        );
    }

    #[test]
    fn test_expand_ipv6() {
        assert_eq!(
            expand_ipv6("::1").unwrap(),
            "0000:0000:0000:0000:0000:0000:0000:0001"
        );
        assert_eq!(
            expand_ipv6("2001:DB8::ff00:42:8329").unwrap(),
            "2001:0db8:0000:0000:0000:ff00:0042:8329"
        );
        assert!(expand_ipv6("10.0.0.1").is_err());
    }

    #[test]
    fn test_format() {
        assert_eq!(format("10.0.0.1", false).unwrap(), "10.0.0.1");
        assert_eq!(format(" 10.0.0.1 ", true).unwrap(), "10.0.0.1/32");
        assert_eq!(
            format("FD00:0001:0000:0000:0000:0000:0000:0064", false).unwrap(),
            "fd00:1::64"
        );
        assert_eq!(format("fd00::1", true).unwrap(), "fd00::1/128");
        assert_eq!(format("nonsense", false), None);
    }
}
