use std::sync::Arc;

use chartreg_archive::{coalesce_metadata, coalesce_values, unpack, ArchiveError};
use chartreg_types::error::{
    RegistryError, RegistryResult, ERROR_CONTENT_NOT_FOUND, ERROR_INTERNAL_UNKNOWN,
    ERROR_INVALID_PARAM, ERROR_INVALID_STATUS, ERROR_PARAM_NOT_FOUND, ERROR_PARAM_TYPE,
    ERROR_UNKNOWN_NOT_FOUND,
};
use chartreg_types::{is_valid_version, Metadata};

use crate::layout::{
    self, CHART_PACKAGE_NAME, METADATA_NAME, STATUS_LOCKING, STATUS_NAME, STATUS_SUCCESS,
    VALUES_NAME,
};
use crate::manager::StoreContext;

/// JSON pointer probed for the chart's controller type.
const TYPE_PROBE_POINTER: &str = "/_config/controllers/0/type";
const TYPE_PROBE_PATH: &str = "_config.controllers[0].type";

/// Handle on one immutable version of a chart.
pub struct Version {
    ctx: Arc<StoreContext>,
    space: String,
    chart: String,
    version: String,
    prefix: String,
}

impl Version {
    pub(crate) fn new(
        ctx: Arc<StoreContext>,
        space: &str,
        chart: &str,
        version: &str,
    ) -> RegistryResult<Self> {
        if !is_valid_version(version) {
            return Err(
                ERROR_INVALID_PARAM.with([("name", "version".into()), ("value", version.into())])
            );
        }
        let prefix = layout::join(&[ctx.prefix.as_str(), space, chart, version]);
        Ok(Self {
            ctx,
            space: space.to_string(),
            chart: chart.to_string(),
            version: version.to_string(),
            prefix,
        })
    }

    pub fn number(&self) -> &str {
        &self.version
    }

    fn logical_name(&self) -> String {
        format!("{}/{}/{}", self.space, self.chart, self.version)
    }

    fn artifact_key(&self, artifact: &str) -> String {
        layout::join(&[self.prefix.as_str(), artifact])
    }

    /// Advisory existence probe: never raises, takes no lock. Higher layers
    /// that care take their own lock around the operation they guard.
    pub fn exists(&self) -> bool {
        self.ctx.driver.stat(&self.prefix).is_ok()
    }

    /// Store a chart archive as this version.
    ///
    /// The write is atomic from a reader's perspective: the status marker is
    /// set to `LOCKING` first, every derived artifact lands before the marker
    /// flips to `SUCCESS`, and any failure in between deletes the whole
    /// version subtree before the error returns.
    pub fn put_content(&self, data: &[u8]) -> RegistryResult<()> {
        if data.is_empty() {
            return Err(ERROR_PARAM_NOT_FOUND.with([("name", "data".into())]));
        }
        let lock = self
            .ctx
            .locks
            .get(&[self.space.as_str(), self.chart.as_str(), self.version.as_str()]);
        let _guard = lock
            .lock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("chart", &self.logical_name()))?;

        // A prior writer that crashed mid-flight leaves the marker LOCKING;
        // recovery is manual or delete-then-retry.
        let status_key = self.artifact_key(STATUS_NAME);
        if let Ok(status) = self.ctx.driver.get_content(&status_key) {
            if status == STATUS_LOCKING.as_bytes() {
                return Err(StoreContext::locked_error("chart", &self.logical_name()));
            }
        }
        self.ctx
            .driver
            .put_content(&status_key, STATUS_LOCKING.as_bytes())
            .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;

        match self.write_artifacts(data) {
            Ok(()) => {
                tracing::info!(name = %self.logical_name(), "version stored");
                Ok(())
            }
            Err(err) => {
                // Self-cleaning write: leave nothing behind.
                match self.ctx.driver.delete(&self.prefix) {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => {
                        tracing::error!(name = %self.logical_name(), error = %e, "failed to clean up after aborted write");
                    }
                }
                Err(err)
            }
        }
    }

    fn write_artifacts(&self, data: &[u8]) -> RegistryResult<()> {
        let bundle = unpack(data).map_err(|e| self.archive_error(e))?;
        let metadata = coalesce_metadata(&bundle);
        let values = coalesce_values(&bundle).map_err(|e| self.archive_error(e))?;

        let metadata_json =
            serde_json::to_vec(&metadata).map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;
        let values_json =
            serde_json::to_vec(&values).map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;

        self.ctx
            .driver
            .put_content(&self.artifact_key(CHART_PACKAGE_NAME), data)
            .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;
        self.ctx
            .driver
            .put_content(&self.artifact_key(METADATA_NAME), &metadata_json)
            .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;
        self.ctx
            .driver
            .put_content(&self.artifact_key(VALUES_NAME), &values_json)
            .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;
        // The commit point: readers trust the artifacts only after this.
        self.ctx
            .driver
            .put_content(&self.artifact_key(STATUS_NAME), STATUS_SUCCESS.as_bytes())
            .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))
    }

    fn archive_error(&self, err: ArchiveError) -> RegistryError {
        match err {
            ArchiveError::NotGzip(_) => ERROR_PARAM_TYPE.with([
                ("name", "chart".into()),
                ("expected", "gzip".into()),
                ("actual", "unknown".into()),
            ]),
            other => {
                ERROR_INVALID_PARAM.with([("name", "chart".into()), ("value", other.to_string())])
            }
        }
    }

    /// Check the status marker. Absent markers read as not found; anything
    /// but `SUCCESS` rejects the version.
    pub fn validate(&self) -> RegistryResult<()> {
        let status_key = self.artifact_key(STATUS_NAME);
        let status = match self.ctx.driver.get_content(&status_key) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.is_not_found() => {
                return Err(ERROR_CONTENT_NOT_FOUND.with([("name", self.logical_name())]))
            }
            Err(e) => return Err(ERROR_INTERNAL_UNKNOWN.wrap(e)),
        };
        if status != STATUS_SUCCESS {
            return Err(
                ERROR_INVALID_STATUS.with([("name", "chart".into()), ("status", status)])
            );
        }
        Ok(())
    }

    /// Fetch the archive bytes exactly as they were stored.
    pub fn get_content(&self) -> RegistryResult<Vec<u8>> {
        let lock = self
            .ctx
            .locks
            .get(&[self.space.as_str(), self.chart.as_str(), self.version.as_str()]);
        let _guard = lock
            .rlock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("chart", &self.logical_name()))?;
        self.validate()?;
        self.read_artifact(CHART_PACKAGE_NAME)
    }

    /// Coalesced metadata with the controller type stamped from the values
    /// document. A values document without the probe path is an error here.
    pub fn metadata(&self) -> RegistryResult<Metadata> {
        self.read_metadata(true)
    }

    /// Like [`metadata`](Self::metadata), but a missing probe path leaves
    /// `type` unset. Used by the latest-metadata listing.
    pub(crate) fn metadata_relaxed(&self) -> RegistryResult<Metadata> {
        self.read_metadata(false)
    }

    fn read_metadata(&self, probe_required: bool) -> RegistryResult<Metadata> {
        let lock = self
            .ctx
            .locks
            .get(&[self.space.as_str(), self.chart.as_str(), self.version.as_str()]);
        let _guard = lock
            .rlock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("chart", &self.logical_name()))?;
        self.validate()?;

        let metadata_bytes = self.read_artifact(METADATA_NAME)?;
        let mut metadata: Metadata = serde_json::from_slice(&metadata_bytes)
            .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;

        let values_bytes = self.read_artifact(VALUES_NAME)?;
        let values: serde_json::Value =
            serde_json::from_slice(&values_bytes).map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;
        match values.pointer(TYPE_PROBE_POINTER).and_then(|v| v.as_str()) {
            Some(kind) => metadata.kind = Some(kind.to_string()),
            None if probe_required => {
                return Err(ERROR_UNKNOWN_NOT_FOUND.with([("name", TYPE_PROBE_PATH.into())]))
            }
            None => {}
        }
        Ok(metadata)
    }

    /// Fetch the coalesced values document as raw JSON bytes.
    pub fn values(&self) -> RegistryResult<Vec<u8>> {
        let lock = self
            .ctx
            .locks
            .get(&[self.space.as_str(), self.chart.as_str(), self.version.as_str()]);
        let _guard = lock
            .rlock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("chart", &self.logical_name()))?;
        self.validate()?;
        self.read_artifact(VALUES_NAME)
    }

    /// Replace the stored metadata document. The version must be committed.
    pub fn put_metadata(&self, body: &[u8]) -> RegistryResult<()> {
        self.put_manifest(METADATA_NAME, body)
    }

    /// Replace the stored values document. The version must be committed.
    pub fn put_values(&self, body: &[u8]) -> RegistryResult<()> {
        self.put_manifest(VALUES_NAME, body)
    }

    fn put_manifest(&self, artifact: &str, body: &[u8]) -> RegistryResult<()> {
        if serde_json::from_slice::<serde_json::Value>(body).is_err() {
            return Err(ERROR_PARAM_TYPE.with([
                ("name", artifact.into()),
                ("expected", "json".into()),
                ("actual", "unknown".into()),
            ]));
        }
        let lock = self
            .ctx
            .locks
            .get(&[self.space.as_str(), self.chart.as_str(), self.version.as_str()]);
        let _guard = lock
            .lock(self.ctx.lock_timeout)
            .ok_or_else(|| StoreContext::locked_error("chart", &self.logical_name()))?;
        self.validate()?;
        self.ctx
            .driver
            .put_content(&self.artifact_key(artifact), body)
            .map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))
    }

    fn read_artifact(&self, artifact: &str) -> RegistryResult<Vec<u8>> {
        match self.ctx.driver.get_content(&self.artifact_key(artifact)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.is_not_found() => Err(ERROR_CONTENT_NOT_FOUND
                .with([("name", format!("{}/{artifact}", self.logical_name()))])),
            Err(e) => Err(ERROR_INTERNAL_UNKNOWN.wrap(e)),
        }
    }
}
