//! Range bounds and address arithmetic.

use super::error::FilterError;
use super::literal::format;
use super::mask::Cidr;
use super::matcher::check_spec;
use super::spec::{AllowedSpec, Family, SpecKind};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Lowest address covered by `spec`.
///
/// # Examples
/// ```
/// use ipfilter_vault::ipfilter::first;
/// assert_eq!(first("10.0.0.77/24").as_deref(), Some("10.0.0.0"));
/// assert_eq!(first("10.1.*").as_deref(), Some("10.1.0.0"));
/// ```
pub fn first(spec: &str) -> Option<String> {
    let spec = AllowedSpec::new(spec);
    let bound = match spec.kind() {
        SpecKind::Cidr => Cidr::new(spec.as_str()).ok()?.network().ok()?,
        SpecKind::Wildcard => match spec.family()? {
            Family::V4 => IpAddr::V4(expand_wildcard_v4(spec.as_str(), 0)?),
            Family::V6 => IpAddr::V6(expand_wildcard_v6_low(spec.as_str())?),
        },
        SpecKind::Section => section_bounds(spec.as_str())?.0,
        SpecKind::Single => spec.as_str().parse().ok()?,
    };
    Some(bound.to_string())
}

/// Highest address covered by `spec`.
///
/// IPv6 wildcards have no defined upper bound and are reported as
/// [`FilterError::Unsupported`].
pub fn last(spec: &str) -> Result<Option<String>, FilterError> {
    let spec = AllowedSpec::new(spec);
    let bound = match spec.kind() {
        SpecKind::Wildcard => match spec.family() {
            Some(Family::V4) => expand_wildcard_v4(spec.as_str(), u8::MAX).map(IpAddr::V4),
            Some(Family::V6) => {
                return Err(FilterError::Unsupported {
                    family: Family::V6,
                    operation: "wildcard last address",
                })
            }
            // a bare `*` names no family
            None => None,
        },
        SpecKind::Cidr => Cidr::new(spec.as_str())
            .ok()
            .and_then(|cidr| cidr.broadcast().ok()),
        SpecKind::Section => section_bounds(spec.as_str()).map(|(_, high)| high),
        SpecKind::Single => spec.as_str().parse().ok(),
    };
    Ok(bound.map(|addr| addr.to_string()))
}

/// Replace the first `*` segment and every segment after it with `fill`.
fn expand_wildcard_v4(pattern: &str, fill: u8) -> Option<Ipv4Addr> {
    let mut octets = [fill; 4];
    for (i, segment) in pattern.split('.').enumerate() {
        if segment == "*" {
            return Some(Ipv4Addr::from(octets));
        }
        *octets.get_mut(i)? = segment.parse().ok()?;
    }
    None
}

/// Groups before the `*` are kept, the rest are zero.
fn expand_wildcard_v6_low(pattern: &str) -> Option<Ipv6Addr> {
    let (prefix, _) = pattern.split_once('*')?;
    let prefix = prefix.trim_end_matches(':');
    if prefix.contains("::") {
        return None;
    }
    let mut segments = [0u16; 8];
    if !prefix.is_empty() {
        for (i, group) in prefix.split(':').enumerate() {
            *segments.get_mut(i)? = u16::from_str_radix(group, 16).ok()?;
        }
    }
    Some(Ipv6Addr::from(segments))
}

fn section_bounds(spec: &str) -> Option<(IpAddr, IpAddr)> {
    let (low, high) = spec.split_once('-')?;
    let low: IpAddr = low.trim().parse().ok()?;
    let high: IpAddr = high.trim().parse().ok()?;
    (Family::of_addr(&low) == Family::of_addr(&high)).then_some((low, high))
}

/// Add `delta` to an address.
///
/// Input carrying a `/prefix` is resolved to its network address first.
/// Returns `None` for non-IP input or when the result leaves the address
/// space.
///
/// # Examples
/// ```
/// use ipfilter_vault::ipfilter::increment;
/// assert_eq!(increment("10.0.0.0", 100).as_deref(), Some("10.0.0.100"));
/// assert_eq!(increment("fd00:1::", 100).as_deref(), Some("fd00:1::64"));
/// ```
pub fn increment(ip: &str, delta: i64) -> Option<String> {
    let ip = ip.trim();
    let base: IpAddr = if ip.contains('/') {
        Cidr::new(ip).ok()?.network().ok()?
    } else {
        ip.parse().ok()?
    };
    let next = match base {
        IpAddr::V4(v4) => {
            let value = i64::from(u32::from(v4)).checked_add(delta)?;
            IpAddr::V4(Ipv4Addr::from(u32::try_from(value).ok()?))
        }
        IpAddr::V6(v6) => IpAddr::V6(Ipv6Addr::from(add_with_carry(v6.octets(), delta)?)),
    };
    Some(next.to_string())
}

/// Byte-wise add (or subtract) starting from the least significant byte.
fn add_with_carry(mut bytes: [u8; 16], delta: i64) -> Option<[u8; 16]> {
    let magnitude = delta.unsigned_abs().to_be_bytes();
    let offset = bytes.len() - magnitude.len();
    let mut carry: i16 = 0;
    for i in (0..bytes.len()).rev() {
        let operand = i
            .checked_sub(offset)
            .map_or(0, |j| i16::from(magnitude[j]));
        let value = if delta >= 0 {
            i16::from(bytes[i]) + operand + carry
        } else {
            i16::from(bytes[i]) - operand + carry
        };
        carry = match value {
            v if v > 0xFF => 1,
            v if v < 0 => -1,
            _ => 0,
        };
        bytes[i] = (value - carry * 0x100) as u8;
    }
    (carry == 0).then_some(bytes)
}

/// Number a host inside a network.
///
/// Finds `hostname` in `index` and returns the start address advanced by its
/// position. The start is the network address when `base` is a CIDR block,
/// otherwise `base` itself. The result must stay inside `base`'s block (or
/// `base/mask` for a bare `base` with a mask), else `None`. With `mask` the
/// result carries a `/mask` suffix.
pub fn calc<S: AsRef<str>>(
    base: &str,
    index: &[S],
    hostname: &str,
    mask: Option<u8>,
) -> Option<String> {
    let position = index.iter().position(|h| h.as_ref() == hostname)?;
    let base = base.trim();
    let (start, bound) = if base.contains('/') {
        (first(base)?, Some(AllowedSpec::new(base)))
    } else {
        let bound = mask.map(|m| AllowedSpec::new(&format!("{base}/{m}")));
        (format(base, false)?, bound)
    };

    let host = increment(&start, i64::try_from(position).ok()?)?;
    if let Some(bound) = &bound {
        let inside = host
            .parse::<IpAddr>()
            .map_or(false, |addr| check_spec(bound, addr).unwrap_or(false));
        if !inside {
            log::warn!("calc: {hostname} at position {position} falls outside {bound}");
            return None;
        }
    }
    log::debug!("calc: {hostname} -> {host}");

    Some(match mask {
        Some(m) => format!("{host}/{m}"),
        None => host,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first() {
        assert_eq!(first("10.0.0.0-10.0.0.255").unwrap(), "10.0.0.0");
        assert_eq!(first("10.0.0.77/24").unwrap(), "10.0.0.0");
        assert_eq!(first("10.1.*").unwrap(), "10.1.0.0");
        assert_eq!(first("10.1.2.3").unwrap(), "10.1.2.3");
        assert_eq!(first("fd00:1::5/64").unwrap(), "fd00:1::");
        assert_eq!(first("fd00:1:*").unwrap(), "fd00:1::");
        assert_eq!(first("fd00::1-fd00::9").unwrap(), "fd00::1");
        assert_eq!(first("garbage"), None);
        assert_eq!(first("10.0.0.1-fd00::1"), None);
    }

    #[test]
    fn test_last() {
        assert_eq!(last("10.0.0.0-10.0.0.255").unwrap().unwrap(), "10.0.0.255");
        assert_eq!(last("10.0.0.0/24").unwrap().unwrap(), "10.0.0.255");
        assert_eq!(last("10.1.*").unwrap().unwrap(), "10.1.255.255");
        assert_eq!(last("fd00::/112").unwrap().unwrap(), "fd00::ffff");
        assert_eq!(last("fd00::1-fd00::9").unwrap().unwrap(), "fd00::9");
        assert_eq!(last("10.1.x.*").unwrap(), None);
        assert!(matches!(
            last("fd00:1:*"),
            Err(FilterError::Unsupported {
                family: Family::V6,
                ..
            })
        ));
    }

    #[test]
    fn test_bare_wildcard_has_no_bounds() {
        assert_eq!(first("*"), None);
        assert_eq!(last("*").unwrap(), None);
        let filter = crate::ipfilter::IpFilter::default();
        assert!(!filter.in_range("1.2.3.4", Some("*")).unwrap());
    }

    #[test]
    fn test_increment() {
        assert_eq!(increment("10.0.0.0", 100).unwrap(), "10.0.0.100");
        assert_eq!(increment("10.0.0.255", 1).unwrap(), "10.0.1.0");
        assert_eq!(increment("10.0.1.0", -1).unwrap(), "10.0.0.255");
        assert_eq!(increment("10.0.0.77/24", 5).unwrap(), "10.0.0.5");
        assert_eq!(increment("255.255.255.255", 1), None);
        assert_eq!(increment("0.0.0.0", -1), None);
        assert_eq!(increment("nonsense", 1), None);
    }

    #[test]
    fn test_increment_v6_carry() {
        assert_eq!(increment("fd00:1::", 100).unwrap(), "fd00:1::64");
        assert_eq!(increment("fd00::ff", 1).unwrap(), "fd00::100");
        assert_eq!(increment("fd00::ffff:ffff", 1).unwrap(), "fd00::1:0:0");
        assert_eq!(increment("fd00::1:0:0", -1).unwrap(), "fd00::ffff:ffff");
        assert_eq!(increment("fd00::/64", 0x1_0000).unwrap(), "fd00::1:0");
        assert_eq!(
            increment("::", i64::MAX).unwrap(),
            "::7fff:ffff:ffff:ffff"
        );
        assert_eq!(
            increment("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff", 1),
            None
        );
        assert_eq!(increment("::", -1), None);
        assert_eq!(increment("::1", i64::MIN), None);
    }

    #[test]
    fn test_calc() {
        let index = vec!["gw", "web01", "web02", "db01"];
        assert_eq!(calc("10.0.0.0/24", &index, "gw", None).unwrap(), "10.0.0.0");
        assert_eq!(calc("10.0.0.0/24", &index, "db01", None).unwrap(), "10.0.0.3");
        assert_eq!(
            calc("10.0.0.10", &index, "web02", Some(24)).unwrap(),
            "10.0.0.12/24"
        );
        assert_eq!(calc("10.0.0.10", &index, "web01", None).unwrap(), "10.0.0.11");
        assert_eq!(calc("10.0.0.0/24", &index, "missing", None), None);
        assert_eq!(
            calc("fd00::/64", &index, "db01", Some(64)).unwrap(),
            "fd00::3/64"
        );
    }

    #[test]
    fn test_calc_overflow() {
        let index = vec!["a", "b", "c", "d", "e"];
        // a /30 holds four addresses
        assert_eq!(calc("10.0.0.0/30", &index, "d", None).unwrap(), "10.0.0.3");
        assert_eq!(calc("10.0.0.0/30", &index, "e", None), None);
        assert_eq!(calc("10.0.0.254", &index, "c", Some(24)), None);
    }
}
