//! Chart descriptor and coalesced metadata model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The `Chart.yaml` document of a chart bundle.
///
/// Only `name` and `version` are required; unknown fields are preserved so a
/// repacked descriptor round-trips without loss.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ChartDescriptor {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Coalesced metadata tree: a chart's descriptor joined with the metadata of
/// every embedded dependency, recursively.
///
/// The `type` field is not persisted with the tree; reads derive it from the
/// coalesced values document and stamp it before returning.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Metadata>,
}

impl Metadata {
    /// Build a metadata node from a descriptor, with no dependencies yet.
    pub fn from_descriptor(descriptor: &ChartDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            version: descriptor.version.clone(),
            description: descriptor.description.clone(),
            kind: None,
            dependencies: Vec::new(),
        }
    }
}
