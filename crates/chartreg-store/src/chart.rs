use std::sync::Arc;

use chartreg_types::error::{
    RegistryResult, ERROR_CONTENT_NOT_FOUND, ERROR_INTERNAL_UNKNOWN, ERROR_INVALID_PARAM,
};
use chartreg_types::name::sort_version_strings;
use chartreg_types::{is_valid_name, is_valid_version, Metadata};

use crate::layout;
use crate::manager::StoreContext;
use crate::version::Version;

/// Handle on one chart within a space.
pub struct Chart {
    pub(crate) ctx: Arc<StoreContext>,
    pub(crate) space: String,
    pub(crate) chart: String,
    pub(crate) prefix: String,
}

impl Chart {
    pub(crate) fn new(ctx: Arc<StoreContext>, space: &str, chart: &str) -> RegistryResult<Self> {
        if !is_valid_name(chart) {
            return Err(
                ERROR_INVALID_PARAM.with([("name", "chart".into()), ("value", chart.into())])
            );
        }
        let prefix = layout::join(&[ctx.prefix.as_str(), space, chart]);
        Ok(Self {
            ctx,
            space: space.to_string(),
            chart: chart.to_string(),
            prefix,
        })
    }

    pub fn name(&self) -> &str {
        &self.chart
    }

    /// Advisory existence probe: never raises, takes no lock. A chart exists
    /// while at least one version subtree exists under it.
    pub fn exists(&self) -> bool {
        self.ctx.driver.stat(&self.prefix).is_ok()
    }

    /// List version numbers, component-wise numeric ascending.
    pub fn list_versions(&self) -> RegistryResult<Vec<String>> {
        let lock = self.ctx.locks.get(&[self.space.as_str(), self.chart.as_str()]);
        let _guard = lock
            .rlock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("chart", &self.chart))?;
        let names =
            layout::list_validated(self.ctx.driver.as_ref(), &self.prefix, is_valid_version)?;
        Ok(sort_version_strings(names))
    }

    /// Coalesced metadata of every version, in version order.
    pub fn version_metadata(&self) -> RegistryResult<Vec<Metadata>> {
        let versions = self.list_versions()?;
        let mut all = Vec::with_capacity(versions.len());
        for number in versions {
            all.push(self.version(&number)?.metadata()?);
        }
        Ok(all)
    }

    /// Metadata of the newest version.
    ///
    /// Unlike the per-version read, a values document without the type probe
    /// path yields metadata with no `type` instead of failing.
    pub fn latest_metadata(&self) -> RegistryResult<Metadata> {
        let versions = self.list_versions()?;
        let Some(newest) = versions.last() else {
            return Err(ERROR_CONTENT_NOT_FOUND.with([("name", "metadata".into())]));
        };
        self.version(newest)?.metadata_relaxed()
    }

    /// Delete one version; when it was the last one, the chart prefix itself
    /// is removed afterwards. The space is never auto-deleted.
    pub fn delete_version(&self, version: &str) -> RegistryResult<()> {
        if !is_valid_version(version) {
            return Err(
                ERROR_INVALID_PARAM.with([("name", "version".into()), ("value", version.into())])
            );
        }
        {
            let lock = self.ctx.locks.get(&[self.space.as_str(), self.chart.as_str(), version]);
            let _guard = lock
                .lock(self.ctx.lock_timeout)
                .ok_or_else(|| {
                    StoreContext::locked_error("chart", &format!("{}/{version}", self.chart))
                })?;
            let prefix = layout::join(&[self.prefix.as_str(), version]);
            if self.ctx.driver.stat(&prefix).is_err() {
                return Err(ERROR_CONTENT_NOT_FOUND.with([(
                    "name",
                    format!("{}/{}/{version}", self.space, self.chart),
                )]));
            }
            match self.ctx.driver.delete(&prefix) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(ERROR_INTERNAL_UNKNOWN.wrap(e)),
            }
            tracing::info!(space = %self.space, chart = %self.chart, version, "version deleted");
        }
        // Cascade: with no surviving versions the chart itself disappears.
        let lock = self.ctx.locks.get(&[self.space.as_str(), self.chart.as_str()]);
        let _guard = lock
            .rlock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("chart", &self.chart))?;
        let survivors =
            layout::list_validated(self.ctx.driver.as_ref(), &self.prefix, is_valid_version)?;
        if survivors.is_empty() {
            match self.ctx.driver.delete(&self.prefix) {
                Ok(()) => {
                    tracing::info!(space = %self.space, chart = %self.chart, "chart removed after last version");
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(ERROR_INTERNAL_UNKNOWN.wrap(e)),
            }
        }
        Ok(())
    }

    /// Get a handle on a specific version.
    pub fn version(&self, version: &str) -> RegistryResult<Version> {
        Version::new(Arc::clone(&self.ctx), &self.space, &self.chart, version)
    }
}
