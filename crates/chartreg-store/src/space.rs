use std::sync::Arc;

use chartreg_types::error::{
    RegistryResult, ERROR_CONTENT_NOT_FOUND, ERROR_INTERNAL_UNKNOWN, ERROR_INVALID_PARAM,
};
use chartreg_types::{is_valid_name, Metadata};

use crate::chart::Chart;
use crate::layout::{self, STATUS_NAME};
use crate::manager::StoreContext;

/// Handle on one space.
pub struct Space {
    pub(crate) ctx: Arc<StoreContext>,
    pub(crate) space: String,
    pub(crate) prefix: String,
}

impl std::fmt::Debug for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Space")
            .field("space", &self.space)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Space {
    pub(crate) fn new(ctx: Arc<StoreContext>, space: &str) -> RegistryResult<Self> {
        if !is_valid_name(space) {
            return Err(
                ERROR_INVALID_PARAM.with([("name", "space".into()), ("value", space.into())])
            );
        }
        let prefix = layout::join(&[ctx.prefix.as_str(), space]);
        Ok(Self {
            ctx,
            space: space.to_string(),
            prefix,
        })
    }

    pub fn name(&self) -> &str {
        &self.space
    }

    /// Advisory existence probe: never raises, takes no lock.
    pub fn exists(&self) -> bool {
        let status_key = layout::join(&[self.prefix.as_str(), STATUS_NAME]);
        self.ctx.driver.stat(&status_key).is_ok()
    }

    /// List chart names in this space, sorted ascending.
    pub fn list_charts(&self) -> RegistryResult<Vec<String>> {
        let lock = self.ctx.locks.get(&[self.space.as_str()]);
        let _guard = lock
            .rlock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("space", &self.space))?;
        layout::list_validated(self.ctx.driver.as_ref(), &self.prefix, is_valid_name)
    }

    /// Delete a chart and all of its versions.
    pub fn delete_chart(&self, chart: &str) -> RegistryResult<()> {
        if !is_valid_name(chart) {
            return Err(
                ERROR_INVALID_PARAM.with([("name", "chart".into()), ("value", chart.into())])
            );
        }
        let lock = self.ctx.locks.get(&[self.space.as_str(), chart]);
        let _guard = lock
            .lock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("chart", chart))?;
        let prefix = layout::join(&[self.prefix.as_str(), chart]);
        if self.ctx.driver.stat(&prefix).is_err() {
            return Err(ERROR_CONTENT_NOT_FOUND
                .with([("name", format!("{}/{chart}", self.space))]));
        }
        match self.ctx.driver.delete(&prefix) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(ERROR_INTERNAL_UNKNOWN.wrap(e)),
        }
        tracing::info!(space = %self.space, chart, "chart deleted");
        Ok(())
    }

    /// Coalesced metadata of every version of every chart in the space.
    pub fn version_metadata(&self) -> RegistryResult<Vec<Metadata>> {
        let charts = self.list_charts()?;
        let mut all = Vec::new();
        for name in charts {
            all.extend(self.chart(&name)?.version_metadata()?);
        }
        Ok(all)
    }

    /// Get a handle on a specific chart.
    pub fn chart(&self, chart: &str) -> RegistryResult<Chart> {
        Chart::new(Arc::clone(&self.ctx), &self.space, chart)
    }
}
