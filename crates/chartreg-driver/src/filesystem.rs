use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{DriverError, DriverResult};
use crate::traits::{FileInfo, StorageDriver};

/// Filesystem-backed storage driver.
///
/// Keys are mapped beneath a root directory; `/{space}/{chart}/…` becomes
/// `root/space/chart/…`. Parent directories are created on write and empty
/// parents are left behind on delete (prefix listings treat them as empty).
pub struct FilesystemDriver {
    root: PathBuf,
}

impl FilesystemDriver {
    /// Create a driver rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> DriverResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key path to a filesystem path, refusing traversal components.
    fn resolve(&self, path: &str) -> DriverResult<PathBuf> {
        let mut resolved = self.root.clone();
        for part in path.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    return Err(DriverError::InvalidConfiguration(format!(
                        "path escapes the root: {path}"
                    )))
                }
                _ => resolved.push(part),
            }
        }
        Ok(resolved)
    }

    fn key_for(&self, file: &Path) -> String {
        let rel = file.strip_prefix(&self.root).unwrap_or(file);
        let mut key = String::new();
        for part in rel.components() {
            key.push('/');
            key.push_str(&part.as_os_str().to_string_lossy());
        }
        key
    }
}

fn map_io(path: &str, err: io::Error) -> DriverError {
    if err.kind() == io::ErrorKind::NotFound {
        DriverError::NotFound(path.to_string())
    } else {
        DriverError::Io(err)
    }
}

impl StorageDriver for FilesystemDriver {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn get_content(&self, path: &str) -> DriverResult<Vec<u8>> {
        let file = self.resolve(path)?;
        fs::read(&file).map_err(|e| map_io(path, e))
    }

    fn put_content(&self, path: &str, content: &[u8]) -> DriverResult<()> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, content)?;
        Ok(())
    }

    fn stat(&self, path: &str) -> DriverResult<FileInfo> {
        let file = self.resolve(path)?;
        let meta = fs::metadata(&file).map_err(|e| map_io(path, e))?;
        Ok(FileInfo {
            size: if meta.is_dir() { 0 } else { meta.len() },
            is_dir: meta.is_dir(),
        })
    }

    fn list(&self, path: &str) -> DriverResult<Vec<String>> {
        let dir = self.resolve(path)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DriverError::Io(e)),
        };
        let mut children = Vec::new();
        for entry in entries {
            children.push(self.key_for(&entry?.path()));
        }
        children.sort();
        Ok(children)
    }

    fn delete(&self, path: &str) -> DriverResult<()> {
        let file = self.resolve(path)?;
        let meta = fs::metadata(&file).map_err(|e| map_io(path, e))?;
        if meta.is_dir() {
            fs::remove_dir_all(&file).map_err(|e| map_io(path, e))
        } else {
            fs::remove_file(&file).map_err(|e| map_io(path, e))
        }
    }
}

impl std::fmt::Debug for FilesystemDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemDriver")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> (tempfile::TempDir, FilesystemDriver) {
        let dir = tempfile::tempdir().unwrap();
        let driver = FilesystemDriver::new(dir.path()).unwrap();
        (dir, driver)
    }

    #[test]
    fn put_get_roundtrip() {
        let (_dir, d) = driver();
        d.put_content("/s/c/1.0.0/chart.tgz", b"bytes").unwrap();
        assert_eq!(d.get_content("/s/c/1.0.0/chart.tgz").unwrap(), b"bytes");
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, d) = driver();
        assert!(d.get_content("/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn list_direct_children() {
        let (_dir, d) = driver();
        d.put_content("/s/.status", b"SUCCESS").unwrap();
        d.put_content("/s/chart/1.0.0/chart.tgz", b"x").unwrap();
        let children = d.list("/s").unwrap();
        assert_eq!(children, vec!["/s/.status", "/s/chart"]);
    }

    #[test]
    fn list_missing_prefix_is_empty() {
        let (_dir, d) = driver();
        assert!(d.list("/void").unwrap().is_empty());
    }

    #[test]
    fn delete_prefix_recursively() {
        let (_dir, d) = driver();
        d.put_content("/s/c/1.0.0/chart.tgz", b"x").unwrap();
        d.put_content("/s/c/1.0.0/.status", b"SUCCESS").unwrap();
        d.delete("/s/c/1.0.0").unwrap();
        assert!(d.get_content("/s/c/1.0.0/chart.tgz").unwrap_err().is_not_found());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let (_dir, d) = driver();
        assert!(d.delete("/ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn stat_reports_dir_and_size() {
        let (_dir, d) = driver();
        d.put_content("/s/f", b"12345").unwrap();
        assert_eq!(d.stat("/s/f").unwrap().size, 5);
        assert!(d.stat("/s").unwrap().is_dir);
    }

    #[test]
    fn rejects_path_traversal() {
        let (_dir, d) = driver();
        assert!(d.get_content("/../escape").is_err());
    }
}
