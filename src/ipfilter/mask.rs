//! Prefix masks and network arithmetic for IPv4 and IPv6.
//!
//! Provides [`Cidr`] for `address/prefix` values along with the mask helpers
//! it is built on.

use super::error::FilterError;
use super::literal::split_cidr;
use super::spec::Family;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_V4_LENGTH: u8 = 32;
/// Maximum length for an IPv6 subnet mask (128 bits).
pub const MAX_V6_LENGTH: u8 = 128;

/// Convert an IPv4 prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use ipfilter_vault::ipfilter::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32, FilterError> {
    if len > MAX_V4_LENGTH {
        Err(FilterError::PrefixTooLong {
            family: Family::V4,
            prefix: len,
            max: MAX_V4_LENGTH,
        })
    } else {
        let right_len = MAX_V4_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Convert an IPv6 prefix length to a subnet mask as u128.
pub fn get_cidr_mask_v6(len: u8) -> Result<u128, FilterError> {
    if len > MAX_V6_LENGTH {
        Err(FilterError::PrefixTooLong {
            family: Family::V6,
            prefix: len,
            max: MAX_V6_LENGTH,
        })
    } else {
        // shifting by the full width is the /0 case
        Ok(u128::MAX
            .checked_shl(u32::from(MAX_V6_LENGTH - len))
            .unwrap_or(0))
    }
}

/// Get the network address for a given IPv4 address and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, FilterError> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Get the network address for a given IPv6 address and prefix length.
pub fn cut_addr_v6(addr: Ipv6Addr, len: u8) -> Result<Ipv6Addr, FilterError> {
    let mask = get_cidr_mask_v6(len)?;
    Ok(Ipv6Addr::from(u128::from(addr) & mask))
}

/// Calculate the broadcast (highest) IPv4 address for a prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr, FilterError> {
    let mask = get_cidr_mask(len)?;
    let network_bits = u32::from(addr) & mask;
    Ok(Ipv4Addr::from(network_bits | !mask))
}

/// Calculate the highest IPv6 address for a prefix length.
pub fn broadcast_addr_v6(addr: Ipv6Addr, len: u8) -> Result<Ipv6Addr, FilterError> {
    let mask = get_cidr_mask_v6(len)?;
    let network_bits = u128::from(addr) & mask;
    Ok(Ipv6Addr::from(network_bits | !mask))
}

/// An address with a prefix length, IPv4 or IPv6.
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash)]
pub struct Cidr {
    /// The address as written, not necessarily the network address.
    pub addr: IpAddr,
    /// The prefix length (0-32 or 0-128).
    pub prefix: u8,
}

impl Cidr {
    /// Parse `address/prefix` (e.g. "10.0.0.0/24" or "fd00::/64").
    pub fn new(addr_cidr: &str) -> Result<Cidr, FilterError> {
        let addr_cidr = addr_cidr.trim();
        let (addr, prefix) =
            split_cidr(addr_cidr).ok_or_else(|| FilterError::NotAnAddress(addr_cidr.into()))?;
        let addr: IpAddr = addr
            .parse()
            .map_err(|_| FilterError::NotAnAddress(addr.to_string()))?;
        let family = Family::of_addr(&addr);
        if prefix > family.max_prefix() {
            return Err(FilterError::PrefixTooLong {
                family,
                prefix,
                max: family.max_prefix(),
            });
        }
        Ok(Cidr { addr, prefix })
    }

    pub fn family(&self) -> Family {
        Family::of_addr(&self.addr)
    }

    /// Get the lowest (network) address in the block.
    pub fn network(&self) -> Result<IpAddr, FilterError> {
        match self.addr {
            IpAddr::V4(v4) => cut_addr(v4, self.prefix).map(IpAddr::V4),
            IpAddr::V6(v6) => cut_addr_v6(v6, self.prefix).map(IpAddr::V6),
        }
    }

    /// Get the highest (broadcast) address in the block.
    pub fn broadcast(&self) -> Result<IpAddr, FilterError> {
        match self.addr {
            IpAddr::V4(v4) => broadcast_addr(v4, self.prefix).map(IpAddr::V4),
            IpAddr::V6(v6) => broadcast_addr_v6(v6, self.prefix).map(IpAddr::V6),
        }
    }

    /// True when `ip` has the same network as this block under its prefix.
    ///
    /// An address of the other family is never contained.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                matches!((cut_addr(net, self.prefix), cut_addr(ip, self.prefix)), (Ok(a), Ok(b)) if a == b)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                matches!((cut_addr_v6(net, self.prefix), cut_addr_v6(ip, self.prefix)), (Ok(a), Ok(b)) if a == b)
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}
