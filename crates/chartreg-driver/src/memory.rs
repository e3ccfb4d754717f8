use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{DriverError, DriverResult};
use crate::traits::{FileInfo, StorageDriver};

/// In-memory, map-based storage driver.
///
/// Intended for tests and embedding. Values are held behind a `RwLock`; keys
/// are slash-separated paths. Listing and prefix deletion are computed from
/// the key set.
pub struct InMemoryDriver {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryDriver {
    /// Create a new empty in-memory driver.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the driver holds no keys.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a key path: ensure a single leading slash, strip trailing ones.
fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl StorageDriver for InMemoryDriver {
    fn name(&self) -> &str {
        "inmemory"
    }

    fn get_content(&self, path: &str) -> DriverResult<Vec<u8>> {
        let path = normalize(path);
        let blobs = self.blobs.read().expect("lock poisoned");
        blobs
            .get(&path)
            .cloned()
            .ok_or(DriverError::NotFound(path))
    }

    fn put_content(&self, path: &str, content: &[u8]) -> DriverResult<()> {
        let path = normalize(path);
        let mut blobs = self.blobs.write().expect("lock poisoned");
        blobs.insert(path, content.to_vec());
        Ok(())
    }

    fn stat(&self, path: &str) -> DriverResult<FileInfo> {
        let path = normalize(path);
        let blobs = self.blobs.read().expect("lock poisoned");
        if let Some(value) = blobs.get(&path) {
            return Ok(FileInfo {
                size: value.len() as u64,
                is_dir: false,
            });
        }
        let prefix = if path == "/" { path.clone() } else { format!("{path}/") };
        if blobs.keys().any(|k| k.starts_with(&prefix)) {
            return Ok(FileInfo { size: 0, is_dir: true });
        }
        Err(DriverError::NotFound(path))
    }

    fn list(&self, path: &str) -> DriverResult<Vec<String>> {
        let path = normalize(path);
        let blobs = self.blobs.read().expect("lock poisoned");
        let prefix = if path == "/" { "/".to_string() } else { format!("{path}/") };
        let mut children: Vec<String> = Vec::new();
        for key in blobs.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                let first = rest.split('/').next().unwrap_or(rest);
                if first.is_empty() {
                    continue;
                }
                let child = format!("{prefix}{first}");
                if children.last() != Some(&child) {
                    children.push(child);
                }
            }
        }
        // BTreeMap iteration keeps children sorted and the dedup above local.
        children.dedup();
        Ok(children)
    }

    fn delete(&self, path: &str) -> DriverResult<()> {
        let path = normalize(path);
        let mut blobs = self.blobs.write().expect("lock poisoned");
        let prefix = if path == "/" { "/".to_string() } else { format!("{path}/") };
        let before = blobs.len();
        blobs.remove(&path);
        blobs.retain(|k, _| !k.starts_with(&prefix));
        if blobs.len() == before {
            return Err(DriverError::NotFound(path));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDriver")
            .field("key_count", &self.len())
            .finish()
    }
}
