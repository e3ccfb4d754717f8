use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{DriverError, DriverResult};
use crate::filesystem::FilesystemDriver;
use crate::memory::InMemoryDriver;
use crate::traits::StorageDriver;

/// Parameters for constructing a storage driver.
#[derive(Clone, Debug, Default)]
pub struct DriverParameters {
    /// Root directory for filesystem-backed drivers.
    pub root_directory: Option<PathBuf>,
}

/// Construct a storage driver by backend name.
///
/// Known backends: `inmemory`, `filesystem` (requires `rootdirectory`).
pub fn create_driver(name: &str, params: &DriverParameters) -> DriverResult<Arc<dyn StorageDriver>> {
    match name {
        "inmemory" => Ok(Arc::new(InMemoryDriver::new())),
        "filesystem" => {
            let root = params.root_directory.clone().ok_or_else(|| {
                DriverError::InvalidConfiguration(
                    "filesystem driver requires rootdirectory".to_string(),
                )
            })?;
            Ok(Arc::new(FilesystemDriver::new(root)?))
        }
        other => Err(DriverError::InvalidConfiguration(format!(
            "unknown storage driver: {other}"
        ))),
    }
}
