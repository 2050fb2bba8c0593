//! The filter: an ordered, immutable list of allowed specs.

use super::error::FilterError;
use super::literal::is_ip;
use super::matcher::check_spec;
use super::range;
use super::spec::AllowedSpec;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Ordered list of allowed specs.
///
/// Built once and only read afterwards, so a filter can be shared freely
/// between threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IpFilter {
    specs: Vec<AllowedSpec>,
}

impl IpFilter {
    /// Build a filter; every entry is trimmed and CIDR entries are normalized
    /// to their network address.
    pub fn new<I, S>(specs: I) -> IpFilter
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let specs: Vec<AllowedSpec> = specs
            .into_iter()
            .map(|s| AllowedSpec::new(s.as_ref()))
            .collect();
        log::debug!("IpFilter::new() with {} specs", specs.len());
        IpFilter { specs }
    }

    pub fn specs(&self) -> &[AllowedSpec] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Is `ip` inside the filter, or inside `range` when one is given?
    ///
    /// Specs are tried in order and the first match wins. Specs of the other
    /// address family are skipped. Reaching an IPv6 wildcard or section spec
    /// before a match is an error.
    ///
    /// # Examples
    /// ```
    /// use ipfilter_vault::ipfilter::IpFilter;
    /// let filter = IpFilter::new(["10.0.0.0/24"]);
    /// assert!(filter.in_range("10.0.0.1", None).unwrap());
    /// assert!(!filter.in_range("10.0.1.0", None).unwrap());
    /// assert!(filter.in_range("10.0.1.0", Some("10.0.*")).unwrap());
    /// ```
    pub fn in_range(&self, ip: &str, range: Option<&str>) -> Result<bool, FilterError> {
        if !is_ip(ip) {
            log::debug!("in_range: {ip:?} is not an IP address");
            return Ok(false);
        }
        let addr: IpAddr = ip
            .parse()
            .map_err(|_| FilterError::NotAnAddress(ip.to_string()))?;

        let override_spec = range.map(AllowedSpec::new);
        let candidates = match &override_spec {
            Some(spec) => std::slice::from_ref(spec),
            None => self.specs.as_slice(),
        };

        for spec in candidates {
            let matched = check_spec(spec, addr).map_err(|e| {
                log::warn!("in_range: {ip} against {spec}: {e}");
                e
            })?;
            if matched {
                log::debug!("in_range: {ip} matched {spec}");
                return Ok(true);
            }
        }
        log::debug!("in_range: {ip} matched none of {} specs", candidates.len());
        Ok(false)
    }

    /// Lowest address of `spec`, or of the first stored spec.
    pub fn first(&self, spec: Option<&str>) -> Option<String> {
        let spec = spec.or_else(|| self.specs.first().map(AllowedSpec::as_str))?;
        range::first(spec)
    }

    /// Highest address of `spec`, or of the first stored spec.
    pub fn last(&self, spec: Option<&str>) -> Result<Option<String>, FilterError> {
        match spec.or_else(|| self.specs.first().map(AllowedSpec::as_str)) {
            Some(spec) => range::last(spec),
            None => Ok(None),
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for IpFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        IpFilter::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipfilter::spec::Family;

    #[test]
    fn test_in_range_cidr() {
        let filter = IpFilter::new(["10.0.0.0/24"]);
        assert!(filter.in_range("10.0.0.1", None).unwrap());
        assert!(!filter.in_range("10.0.1.0", None).unwrap());
    }

    #[test]
    fn test_in_range_any_spec_matches() {
        let filter = IpFilter::new(["10.0.0.0/24", "192.168.1.*", "fd00::/16", "172.16.0.1-172.16.0.9"]);
        assert!(filter.in_range("192.168.1.77", None).unwrap());
        assert!(filter.in_range("172.16.0.5", None).unwrap());
        assert!(filter.in_range("fd00:1::1", None).unwrap());
        assert!(!filter.in_range("172.16.0.10", None).unwrap());
        assert!(!filter.in_range("fe80::1", None).unwrap());
    }

    #[test]
    fn test_in_range_rejects_non_ip_query() {
        let filter = IpFilter::new(["10.0.0.0/8"]);
        assert!(!filter.in_range("10.0.0.1/32", None).unwrap());
        assert!(!filter.in_range("", None).unwrap());
        assert!(!filter.in_range("example.com", None).unwrap());
    }

    #[test]
    fn test_in_range_override() {
        let filter = IpFilter::new(["10.0.0.0/24"]);
        assert!(filter.in_range("10.9.9.9", Some(" 10.9.0.0/16 ")).unwrap());
        assert!(!filter.in_range("10.0.0.1", Some("10.9.0.0/16")).unwrap());
        assert!(IpFilter::default()
            .in_range("10.0.0.1", Some("10.0.0.1"))
            .unwrap());
    }

    #[test]
    fn test_in_range_v6_unsupported_is_reported() {
        let filter = IpFilter::new(["fd00:1:*", "fd00::/16"]);
        assert_eq!(
            filter.in_range("fd00::1", None).unwrap_err(),
            FilterError::Unsupported {
                family: Family::V6,
                operation: "wildcard matching"
            }
        );
        // a v4 query never reaches the v6 spec
        assert!(!filter.in_range("10.0.0.1", None).unwrap());
        // an earlier match wins before the unsupported spec is reached
        let filter = IpFilter::new(["fd00::/16", "fd00:1:*"]);
        assert!(filter.in_range("fd00::1", None).unwrap());
    }

    #[test]
    fn test_malformed_specs_never_match() {
        let filter = IpFilter::new(["10.0.0.0/77", "bogus", "10.0.x.*", "1.2.3.4-"]);
        for ip in ["10.0.0.1", "1.2.3.4", "10.0.1.1"] {
            assert!(!filter.in_range(ip, None).unwrap(), "{ip}");
        }
    }

    #[test]
    fn test_first_last() {
        let filter = IpFilter::new(["10.0.0.0-10.0.0.255"]);
        assert_eq!(filter.first(None).unwrap(), "10.0.0.0");
        assert_eq!(filter.last(None).unwrap().unwrap(), "10.0.0.255");
        assert_eq!(filter.first(Some("10.1.0.0/16")).unwrap(), "10.1.0.0");
        assert_eq!(IpFilter::default().first(None), None);
        assert_eq!(IpFilter::default().last(None).unwrap(), None);
    }

    #[test]
    fn test_serde_transparent() {
        let filter: IpFilter = serde_json::from_str(r#"["10.0.0.9/8", "fd00::1"]"#).unwrap();
        assert_eq!(filter.specs()[0].as_str(), "10.0.0.0/8");
        assert_eq!(filter.specs().len(), 2);
    }

    #[test]
    fn test_filter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IpFilter>();
    }
}
