//! Orchestration config parsing.
//!
//! The wire form is free-shaped JSON where the keys of a node mean different
//! things: `package` is the chart reference, `_config` is a values override,
//! and anything else is a nested child node. Decoding discriminates fields
//! explicitly into [`ConfigNode`] and rejects unknown shapes up front.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use chartreg_types::error::{
    RegistryResult, ERROR_PARAM_NOT_FOUND, ERROR_PARAM_TYPE,
};

const PACKAGE_KEY: &str = "package";
const VALUES_KEY: &str = "_config";

/// Reference to a chart inside an orchestration config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageRef {
    /// `true`: resolve against the global space graph. `false`: resolve
    /// against the enclosing parent chart's dependencies.
    pub independent: bool,
    pub space: String,
    pub chart: String,
    pub version: String,
}

impl PackageRef {
    fn from_value(value: &Value) -> RegistryResult<Self> {
        let map = as_object(PACKAGE_KEY, value)?;
        Ok(Self {
            independent: find_bool(map, "independent")?,
            space: find_string(map, "space")?,
            chart: find_string(map, "chart")?,
            version: find_string(map, "version")?,
        })
    }
}

/// One node of the orchestration tree.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigNode {
    pub package: PackageRef,
    /// The `_config` values override for this chart level only.
    pub overrides: Option<Value>,
    /// Nested children, keyed by their (possibly renamed) dependency name.
    pub children: BTreeMap<String, ConfigNode>,
}

impl ConfigNode {
    /// Decode a node from its JSON form, discriminating keys explicitly.
    pub fn from_value(name: &str, value: &Value) -> RegistryResult<Self> {
        let map = as_object(name, value)?;
        let mut package = None;
        let mut overrides = None;
        let mut children = BTreeMap::new();
        for (key, entry) in map {
            match key.as_str() {
                PACKAGE_KEY => package = Some(PackageRef::from_value(entry)?),
                VALUES_KEY => overrides = Some(entry.clone()),
                other => {
                    children.insert(other.to_string(), ConfigNode::from_value(other, entry)?);
                }
            }
        }
        let package =
            package.ok_or_else(|| ERROR_PARAM_NOT_FOUND.with([("name", PACKAGE_KEY.into())]))?;
        Ok(Self {
            package,
            overrides,
            children,
        })
    }

    /// Assemble the parallel values tree: `_config` overrides keyed in place,
    /// children mirrored by name. Dependency charts never see this tree; it
    /// becomes the root values of the composed chart.
    pub fn collect_overrides(&self) -> Value {
        let mut out = serde_json::Map::new();
        if let Some(overrides) = &self.overrides {
            out.insert(VALUES_KEY.to_string(), overrides.clone());
        }
        for (name, child) in &self.children {
            out.insert(name.clone(), child.collect_overrides());
        }
        Value::Object(out)
    }
}

/// The `save` block: where the composed chart is stored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct SaveInfo {
    /// Space name; comes from the request path, never the body.
    #[serde(skip)]
    pub space: String,
    #[serde(default)]
    pub chart: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

impl SaveInfo {
    pub fn validate(&self) -> RegistryResult<()> {
        if self.chart.is_empty() {
            return Err(ERROR_PARAM_NOT_FOUND.with([("name", "save.chart".into())]));
        }
        if self.version.is_empty() {
            return Err(ERROR_PARAM_NOT_FOUND.with([("name", "save.version".into())]));
        }
        Ok(())
    }

    /// Logical path of the target version.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.space, self.chart, self.version)
    }
}

/// A full orchestration request: the save target plus the config tree.
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestrationConfig {
    pub save: SaveInfo,
    pub configs: ConfigNode,
}

impl OrchestrationConfig {
    /// Parse a request body. The space is glued in by the caller afterwards.
    pub fn from_json(body: &[u8]) -> RegistryResult<Self> {
        #[derive(Deserialize)]
        struct Wire {
            save: Option<SaveInfo>,
            configs: Option<Value>,
        }
        let wire: Wire = serde_json::from_slice(body).map_err(|_| {
            ERROR_PARAM_TYPE.with([
                ("name", "config".into()),
                ("expected", "orchestration config".into()),
                ("actual", "unknown".into()),
            ])
        })?;
        let save = wire
            .save
            .ok_or_else(|| ERROR_PARAM_NOT_FOUND.with([("name", "save".into())]))?;
        save.validate()?;
        let configs = wire
            .configs
            .ok_or_else(|| ERROR_PARAM_NOT_FOUND.with([("name", "configs".into())]))?;
        Ok(Self {
            save,
            configs: ConfigNode::from_value("configs", &configs)?,
        })
    }
}

fn as_object<'v>(
    name: &str,
    value: &'v Value,
) -> RegistryResult<&'v serde_json::Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ERROR_PARAM_TYPE.with([
            ("name", name.into()),
            ("expected", "map".into()),
            ("actual", "unknown".into()),
        ])
    })
}

fn find_bool(map: &serde_json::Map<String, Value>, param: &str) -> RegistryResult<bool> {
    let value = map
        .get(param)
        .ok_or_else(|| ERROR_PARAM_NOT_FOUND.with([("name", param.into())]))?;
    value.as_bool().ok_or_else(|| {
        ERROR_PARAM_TYPE.with([
            ("name", param.into()),
            ("expected", "bool".into()),
            ("actual", "unknown".into()),
        ])
    })
}

fn find_string(map: &serde_json::Map<String, Value>, param: &str) -> RegistryResult<String> {
    let value = map
        .get(param)
        .ok_or_else(|| ERROR_PARAM_NOT_FOUND.with([("name", param.into())]))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            ERROR_PARAM_TYPE.with([
                ("name", param.into()),
                ("expected", "string".into()),
                ("actual", "unknown".into()),
            ])
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> RegistryResult<ConfigNode> {
        ConfigNode::from_value("configs", &value)
    }

    #[test]
    fn parses_flat_node() {
        let parsed = node(json!({
            "package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"}
        }))
        .unwrap();
        assert!(parsed.package.independent);
        assert_eq!(parsed.package.chart, "test");
        assert!(parsed.overrides.is_none());
        assert!(parsed.children.is_empty());
    }

    #[test]
    fn parses_overrides_and_children() {
        let parsed = node(json!({
            "package": {"independent": true, "space": "s", "chart": "c", "version": "1.0.0"},
            "_config": {"replicaCount": 3},
            "renamed": {
                "package": {"independent": false, "space": "s", "chart": "dep", "version": "0.1.0"}
            }
        }))
        .unwrap();
        assert_eq!(parsed.overrides, Some(json!({"replicaCount": 3})));
        assert_eq!(parsed.children.len(), 1);
        assert!(!parsed.children["renamed"].package.independent);
    }

    #[test]
    fn missing_package_is_param_not_found() {
        let err = node(json!({"_config": {}})).unwrap_err();
        assert!(err.is(&ERROR_PARAM_NOT_FOUND));
    }

    #[test]
    fn missing_package_field_is_param_not_found() {
        let err = node(json!({
            "package": {"independent": true, "space": "s", "chart": "c"}
        }))
        .unwrap_err();
        assert!(err.is(&ERROR_PARAM_NOT_FOUND));
    }

    #[test]
    fn wrong_field_type_is_param_type_error() {
        let err = node(json!({
            "package": {"independent": "yes", "space": "s", "chart": "c", "version": "1.0.0"}
        }))
        .unwrap_err();
        assert!(err.is(&ERROR_PARAM_TYPE));
    }

    #[test]
    fn non_object_child_is_rejected() {
        let err = node(json!({
            "package": {"independent": true, "space": "s", "chart": "c", "version": "1.0.0"},
            "child": 42
        }))
        .unwrap_err();
        assert!(err.is(&ERROR_PARAM_TYPE));
    }

    #[test]
    fn collect_overrides_mirrors_structure() {
        let parsed = node(json!({
            "package": {"independent": true, "space": "s", "chart": "c", "version": "1.0.0"},
            "_config": {"a": 1},
            "web": {
                "package": {"independent": false, "space": "s", "chart": "w", "version": "0.1.0"},
                "_config": {"b": 2}
            }
        }))
        .unwrap();
        assert_eq!(
            parsed.collect_overrides(),
            json!({"_config": {"a": 1}, "web": {"_config": {"b": 2}}})
        );
    }

    #[test]
    fn config_from_json_requires_save_fields() {
        let err = OrchestrationConfig::from_json(
            br#"{"save": {"chart": "x"}, "configs": {}}"#,
        )
        .unwrap_err();
        assert!(err.is(&ERROR_PARAM_NOT_FOUND));
    }

    #[test]
    fn config_from_json_full() {
        let cfg = OrchestrationConfig::from_json(
            br#"{
                "save": {"chart": "testX", "version": "1.0.1", "description": "d"},
                "configs": {
                    "package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"},
                    "_config": {"replicaCount": 3}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.save.chart, "testX");
        assert_eq!(cfg.save.description, "d");
        assert_eq!(cfg.configs.package.space, "library");
    }

    #[test]
    fn malformed_body_is_param_type_error() {
        let err = OrchestrationConfig::from_json(b"not json").unwrap_err();
        assert!(err.is(&ERROR_PARAM_TYPE));
    }
}
