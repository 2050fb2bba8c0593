//! IPv4/IPv6 range filter.
//!
//! This module answers "is this address allowed" against a list of specs in
//! four notations, and provides the address helpers it is built on:
//! - [`IpFilter`] - ordered spec list with [`IpFilter::in_range`]
//! - [`AllowedSpec`], [`SpecKind`], [`Family`] - spec classification
//! - [`Cidr`] and the mask helpers - network arithmetic
//! - [`first`], [`last`], [`increment`], [`calc`] - range bounds and host numbering
//! - [`is_ip`], [`format`], [`pack`], [`unpack`], [`expand_ipv6`] - literals

mod error;
mod filter;
mod literal;
mod mask;
mod matcher;
mod range;
mod spec;

// Re-export public types
pub use error::FilterError;
pub use filter::IpFilter;
pub use literal::{expand_ipv6, format, is_ip, is_ipv4, is_ipv6, pack, unpack, PackedAddr};
pub use mask::{
    broadcast_addr, broadcast_addr_v6, cut_addr, cut_addr_v6, get_cidr_mask, get_cidr_mask_v6,
    Cidr, MAX_V4_LENGTH, MAX_V6_LENGTH,
};
pub use matcher::check_spec;
pub use range::{calc, first, increment, last};
pub use spec::{AllowedSpec, Family, SpecKind};
