//! Coalesced metadata and values trees.
//!
//! Coalescing folds a chart's own documents together with those of every
//! embedded dependency: metadata hangs each child's tree off the parent's
//! `dependencies` list, and values nest each child's defaults under the
//! child's local name with parent-specified overrides winning.

use serde_json::{Map, Value};

use chartreg_types::Metadata;

use crate::bundle::ChartBundle;
use crate::error::{ArchiveError, ArchiveResult};

/// Compute the coalesced metadata tree of a bundle.
pub fn coalesce_metadata(chart: &ChartBundle) -> Metadata {
    let mut metadata = Metadata::from_descriptor(&chart.descriptor);
    for dep in &chart.dependencies {
        metadata.dependencies.push(coalesce_metadata(dep));
    }
    metadata
}

/// Compute the coalesced values tree of a bundle.
///
/// The root document is the chart's own `values.yaml`; for each dependency
/// the child's coalesced values are placed under the child's name, merged
/// with whatever the parent already specified there. Parent values win over
/// child defaults at every depth.
pub fn coalesce_values(chart: &ChartBundle) -> ArchiveResult<Value> {
    let mut root = parse_values(chart)?;
    for dep in &chart.dependencies {
        let defaults = coalesce_values(dep)?;
        let overrides = root.remove(dep.name()).unwrap_or(Value::Null);
        root.insert(dep.name().to_string(), merge_values(defaults, overrides));
    }
    Ok(Value::Object(root))
}

/// Merge `overlay` onto `base`: mappings merge key-wise recursively, and for
/// anything else a non-null overlay replaces the base.
pub fn merge_values(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (base, Value::Null) => base,
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

/// Parse a bundle's raw values text as a top-level mapping; absent or null
/// documents coalesce to an empty mapping.
fn parse_values(chart: &ChartBundle) -> ArchiveResult<Map<String, Value>> {
    if chart.values.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value =
        serde_yaml::from_str(&chart.values).map_err(|source| ArchiveError::Yaml {
            name: format!("{}/values.yaml", chart.name()),
            source,
        })?;
    match value {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        _ => Err(ArchiveError::InvalidValues(chart.name().to_string())),
    }
}
