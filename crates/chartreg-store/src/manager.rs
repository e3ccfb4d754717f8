use std::sync::Arc;
use std::time::Duration;

use chartreg_driver::StorageDriver;
use chartreg_lock::ResourceLocker;
use chartreg_types::error::{
    RegistryResult, ERROR_CONTENT_NOT_FOUND, ERROR_INTERNAL_UNKNOWN, ERROR_INVALID_PARAM,
    ERROR_LOCKED, ERROR_RESOURCE_EXIST,
};
use chartreg_types::is_valid_name;

use crate::layout::{self, STATUS_NAME, STATUS_SUCCESS};
use crate::space::Space;

/// Default bound on every lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared context of one configured storage manager: the driver, the lock
/// tree, and the acquisition budget. Handles clone the `Arc` instead of
/// reaching into process globals.
pub(crate) struct StoreContext {
    pub driver: Arc<dyn StorageDriver>,
    pub locks: ResourceLocker,
    pub prefix: String,
    pub lock_timeout: Duration,
}

impl StoreContext {
    pub(crate) fn locked_error(kind: &str, name: &str) -> chartreg_types::RegistryError {
        ERROR_LOCKED.with([("kind", kind.to_string()), ("name", name.to_string())])
    }
}

/// Manager of chart spaces over one storage backend.
pub struct SpaceManager {
    ctx: Arc<StoreContext>,
}

impl SpaceManager {
    /// Create a manager over `driver` with the given lock acquisition bound.
    pub fn new(driver: Arc<dyn StorageDriver>, lock_timeout: Duration) -> Self {
        Self {
            ctx: Arc::new(StoreContext {
                driver,
                locks: ResourceLocker::new(),
                prefix: "/".to_string(),
                lock_timeout,
            }),
        }
    }

    /// Backend name, for diagnostics.
    pub fn backend_name(&self) -> String {
        self.ctx.driver.name().to_string()
    }

    /// Create a space. Conflict if the space already exists.
    pub fn create_space(&self, space: &str) -> RegistryResult<Space> {
        if !is_valid_name(space) {
            return Err(
                ERROR_INVALID_PARAM.with([("name", "space".into()), ("value", space.into())])
            );
        }
        let lock = self.ctx.locks.get(&[space]);
        let _guard = lock
            .lock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("space", space))?;
        let status_key = layout::join(&[self.ctx.prefix.as_str(), space, STATUS_NAME]);
        if self.ctx.driver.stat(&status_key).is_ok() {
            return Err(ERROR_RESOURCE_EXIST.with([("name", space.into())]));
        }
        self.ctx
            .driver
            .put_content(&status_key, STATUS_SUCCESS.as_bytes())
            .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;
        tracing::info!(space, "space created");
        self.space(space)
    }

    /// Delete a space and everything under it.
    ///
    /// The delete is forced: in-flight writers lose their subtree and fail at
    /// commit, where their own cleanup degenerates to a no-op.
    pub fn delete_space(&self, space: &str) -> RegistryResult<()> {
        if !is_valid_name(space) {
            return Err(
                ERROR_INVALID_PARAM.with([("name", "space".into()), ("value", space.into())])
            );
        }
        let lock = self.ctx.locks.get(&[space]);
        let _guard = lock
            .lock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("space", space))?;
        let status_key = layout::join(&[self.ctx.prefix.as_str(), space, STATUS_NAME]);
        if self.ctx.driver.stat(&status_key).is_err() {
            return Err(ERROR_CONTENT_NOT_FOUND.with([("name", space.into())]));
        }
        let prefix = layout::join(&[self.ctx.prefix.as_str(), space]);
        match self.ctx.driver.delete(&prefix) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(ERROR_INTERNAL_UNKNOWN.wrap(e)),
        }
        tracing::info!(space, "space deleted");
        Ok(())
    }

    /// List all space names, sorted ascending.
    pub fn list_spaces(&self) -> RegistryResult<Vec<String>> {
        layout::list_validated(self.ctx.driver.as_ref(), &self.ctx.prefix, is_valid_name)
    }

    /// Get a handle on a specific space.
    pub fn space(&self, space: &str) -> RegistryResult<Space> {
        Space::new(Arc::clone(&self.ctx), space)
    }

    /// Drop the lock tree wholesale. Only safe while quiescing.
    pub fn close(&self) {
        self.ctx.locks.close();
    }
}

impl std::fmt::Debug for SpaceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceManager")
            .field("backend", &self.ctx.driver.name())
            .field("lock_timeout", &self.ctx.lock_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartreg_driver::InMemoryDriver;

    fn manager() -> SpaceManager {
        SpaceManager::new(Arc::new(InMemoryDriver::new()), DEFAULT_LOCK_TIMEOUT)
    }

    #[test]
    fn create_then_list() {
        let m = manager();
        m.create_space("library").unwrap();
        m.create_space("apps").unwrap();
        assert_eq!(m.list_spaces().unwrap(), vec!["apps", "library"]);
    }

    #[test]
    fn create_twice_conflicts() {
        let m = manager();
        m.create_space("library").unwrap();
        let err = m.create_space("library").unwrap_err();
        assert!(err.is(&ERROR_RESOURCE_EXIST));
    }

    #[test]
    fn create_rejects_invalid_name() {
        let m = manager();
        let err = m.create_space("_bad").unwrap_err();
        assert!(err.is(&ERROR_INVALID_PARAM));
        assert_eq!(err.code, 400);
    }

    #[test]
    fn delete_removes_space() {
        let m = manager();
        m.create_space("library").unwrap();
        m.delete_space("library").unwrap();
        assert!(m.list_spaces().unwrap().is_empty());
    }

    #[test]
    fn delete_missing_space_is_not_found() {
        let m = manager();
        let err = m.delete_space("ghost").unwrap_err();
        assert!(err.is(&ERROR_CONTENT_NOT_FOUND));
    }

    #[test]
    fn recreate_after_delete() {
        let m = manager();
        m.create_space("library").unwrap();
        m.delete_space("library").unwrap();
        m.create_space("library").unwrap();
        assert_eq!(m.list_spaces().unwrap(), vec!["library"]);
    }
}
