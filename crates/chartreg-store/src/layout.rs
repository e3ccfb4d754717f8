//! Object layout: logical identity to blob keys.
//!
//! ```text
//! /{space}/.status                        space existence marker
//! /{space}/{chart}/{version}/.status      version state marker
//! /{space}/{chart}/{version}/chart.tgz    archive bytes
//! /{space}/{chart}/{version}/metadata.dat JSON metadata tree
//! /{space}/{chart}/{version}/values.dat   JSON coalesced values
//! ```

use chartreg_driver::StorageDriver;
use chartreg_types::error::{RegistryResult, ERROR_INTERNAL_UNKNOWN};

pub const CHART_PACKAGE_NAME: &str = "chart.tgz";
pub const METADATA_NAME: &str = "metadata.dat";
pub const VALUES_NAME: &str = "values.dat";
pub const STATUS_NAME: &str = ".status";

pub const STATUS_LOCKING: &str = "LOCKING";
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Join path elements under a leading slash, skipping empties.
pub fn join(parts: &[&str]) -> String {
    let mut key = String::new();
    for part in parts {
        let part = part.trim_matches('/');
        if part.is_empty() {
            continue;
        }
        key.push('/');
        key.push_str(part);
    }
    if key.is_empty() {
        key.push('/');
    }
    key
}

/// The last path component of a key, tolerating either separator.
pub fn last_element(key: &str) -> &str {
    let key = key.trim_end_matches(['/', '\\']);
    match key.rfind(['/', '\\']) {
        Some(index) => &key[index + 1..],
        None => key,
    }
}

/// List the direct descendants of `prefix`, keep the last components that
/// pass `validator`, and return them sorted ascending.
pub fn list_validated(
    driver: &dyn StorageDriver,
    prefix: &str,
    validator: fn(&str) -> bool,
) -> RegistryResult<Vec<String>> {
    let keys = driver
        .list(prefix)
        .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;
    let mut names: Vec<String> = keys
        .iter()
        .map(|key| last_element(key))
        .filter(|name| validator(name))
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartreg_driver::InMemoryDriver;
    use chartreg_types::{is_valid_name, is_valid_version};

    #[test]
    fn join_builds_slash_keys() {
        assert_eq!(join(&["library", "test", "1.0.0"]), "/library/test/1.0.0");
        assert_eq!(join(&["/", "library"]), "/library");
        assert_eq!(join(&[]), "/");
    }

    #[test]
    fn last_element_handles_separators() {
        assert_eq!(last_element("/a/b/c"), "c");
        assert_eq!(last_element("/a/b/"), "b");
        assert_eq!(last_element("a\\b\\c"), "c");
        assert_eq!(last_element("plain"), "plain");
    }

    #[test]
    fn list_filters_and_sorts_names() {
        let driver = InMemoryDriver::new();
        driver.put_content("/s/zeta/1.0.0/.status", b"SUCCESS").unwrap();
        driver.put_content("/s/alpha/1.0.0/.status", b"SUCCESS").unwrap();
        driver.put_content("/s/.status", b"SUCCESS").unwrap();
        let names = list_validated(&driver, "/s", is_valid_name).unwrap();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn list_filters_invalid_versions() {
        let driver = InMemoryDriver::new();
        driver.put_content("/s/c/1.0.0/.status", b"SUCCESS").unwrap();
        driver.put_content("/s/c/not-a-version/.status", b"x").unwrap();
        let names = list_validated(&driver, "/s/c", is_valid_version).unwrap();
        assert_eq!(names, vec!["1.0.0"]);
    }
}
