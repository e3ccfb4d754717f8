//! Naming grammar for spaces, charts, and versions.
//!
//! Valid space and chart names start with an ASCII letter or digit and
//! continue with letters, digits, `_`, or `-`. Versions are strict
//! three-part numeric strings with no pre-release or build metadata.
//! Validation happens at every entry point; invalid names never reach the
//! storage backend.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RegistryError, ERROR_INVALID_PARAM};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("name pattern"));

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("version pattern"));

/// Returns `true` if `name` is a valid space or chart name.
///
/// # Examples
///
/// ```
/// use chartreg_types::is_valid_name;
///
/// assert!(is_valid_name("library"));
/// assert!(is_valid_name("my-chart_2"));
/// assert!(!is_valid_name("_leading"));
/// assert!(!is_valid_name(""));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Returns `true` if `version` is a valid three-part numeric version.
///
/// # Examples
///
/// ```
/// use chartreg_types::is_valid_version;
///
/// assert!(is_valid_version("1.0.0"));
/// assert!(!is_valid_version("1.0.0-rc1"));
/// assert!(!is_valid_version("1.0"));
/// ```
pub fn is_valid_version(version: &str) -> bool {
    VERSION_PATTERN.is_match(version)
}

/// A parsed three-part numeric version.
///
/// Ordering is component-wise numeric, so `0.0.10` sorts after `0.0.9`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VersionNumber {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionNumber {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for VersionNumber {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_version(s) {
            return Err(ERROR_INVALID_PARAM.with([("name", "version".into()), ("value", s.into())]));
        }
        let mut parts = s.split('.').map(|p| p.parse::<u64>());
        // The grammar guarantees exactly three numeric components; overflow of
        // a component larger than u64 is still a caller error.
        let mut next = || -> Result<u64, RegistryError> {
            parts
                .next()
                .expect("three components")
                .map_err(|_| ERROR_INVALID_PARAM.with([("name", "version".into()), ("value", s.into())]))
        };
        Ok(Self::new(next()?, next()?, next()?))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort version strings in component-wise numeric ascending order.
///
/// Entries that do not match the version grammar are dropped.
pub fn sort_version_strings(versions: Vec<String>) -> Vec<String> {
    let mut parsed: Vec<(VersionNumber, String)> = versions
        .into_iter()
        .filter_map(|v| v.parse::<VersionNumber>().ok().map(|n| (n, v)))
        .collect();
    parsed.sort_by(|a, b| a.0.cmp(&b.0));
    parsed.into_iter().map(|(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(is_valid_name("library"));
        assert!(is_valid_name("test"));
        assert!(is_valid_name("a"));
        assert!(is_valid_name("0chart"));
        assert!(is_valid_name("my-chart"));
        assert!(is_valid_name("my_chart"));
        assert!(is_valid_name("Chart-2_x"));
    }

    #[test]
    fn reject_bad_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("_bad"));
        assert!(!is_valid_name("-bad"));
        assert!(!is_valid_name("has space"));
        assert!(!is_valid_name("has/slash"));
        assert!(!is_valid_name("has.dot"));
        assert!(!is_valid_name(".status"));
    }

    #[test]
    fn valid_versions() {
        assert!(is_valid_version("0.0.1"));
        assert!(is_valid_version("1.0.0"));
        assert!(is_valid_version("10.20.30"));
    }

    #[test]
    fn reject_bad_versions() {
        assert!(!is_valid_version(""));
        assert!(!is_valid_version("1.0"));
        assert!(!is_valid_version("1.0.0.0"));
        assert!(!is_valid_version("1.0.0-rc1"));
        assert!(!is_valid_version("1.0.0+build"));
        assert!(!is_valid_version("v1.0.0"));
        assert!(!is_valid_version("a.b.c"));
    }

    #[test]
    fn parse_and_display_roundtrip() {
        let v: VersionNumber = "1.2.3".parse().unwrap();
        assert_eq!(v, VersionNumber::new(1, 2, 3));
        assert_eq!(v.to_string(), "1.2.3");
    }

    #[test]
    fn parse_rejects_invalid() {
        assert!("1.2".parse::<VersionNumber>().is_err());
        assert!("1.2.x".parse::<VersionNumber>().is_err());
    }

    #[test]
    fn numeric_component_ordering() {
        let a: VersionNumber = "0.0.9".parse().unwrap();
        let b: VersionNumber = "0.0.10".parse().unwrap();
        let c: VersionNumber = "0.1.0".parse().unwrap();
        let d: VersionNumber = "1.0.0".parse().unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
    }

    #[test]
    fn sort_version_strings_numerically() {
        let sorted = sort_version_strings(vec![
            "1.0.0".into(),
            "0.0.10".into(),
            "0.1.0".into(),
            "0.0.9".into(),
        ]);
        assert_eq!(sorted, vec!["0.0.9", "0.0.10", "0.1.0", "1.0.0"]);
    }

    #[test]
    fn sort_drops_malformed_entries() {
        let sorted = sort_version_strings(vec!["1.0.0".into(), "nope".into(), "2.0".into()]);
        assert_eq!(sorted, vec!["1.0.0"]);
    }
}
