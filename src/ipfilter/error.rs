//! Errors raised by the IP filter.
//!
//! Malformed specs never produce an error; they simply fail to match.
//! Only the cases below are reported to the caller.

use super::spec::Family;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// The operation has no implementation for this address family.
    #[error("{operation} is not supported for {family} specs")]
    Unsupported {
        family: Family,
        operation: &'static str,
    },

    /// The string is neither an IPv4 nor an IPv6 literal.
    #[error("not an IP address: {0:?}")]
    NotAnAddress(String),

    /// A packed address must be 4 (IPv4) or 16 (IPv6) bytes long.
    #[error("packed address must be 4 or 16 bytes, got {0}")]
    InvalidPackedLength(usize),

    /// Prefix length larger than the address width.
    #[error("prefix length {prefix} is too long for {family} (max {max})")]
    PrefixTooLong { family: Family, prefix: u8, max: u8 },
}
