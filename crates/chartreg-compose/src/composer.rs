use chartreg_archive::{pack, unpack, ChartBundle};
use chartreg_store::SpaceManager;
use chartreg_types::error::{
    RegistryResult, ERROR_CONTENT_NOT_FOUND, ERROR_INTERNAL_UNKNOWN, ERROR_INVALID_PARAM,
    ERROR_RESOURCE_EXIST,
};
use chartreg_types::is_valid_name;

use crate::config::{ConfigNode, OrchestrationConfig, PackageRef};

/// Resolves orchestration configs against the version store and writes the
/// assembled chart back through the normal upload path.
pub struct Composer<'a> {
    manager: &'a SpaceManager,
}

impl<'a> Composer<'a> {
    pub fn new(manager: &'a SpaceManager) -> Self {
        Self { manager }
    }

    /// Create the chart described by `config` and store it at the save
    /// target. Fails without side effects if the target space is missing or
    /// the target version already exists.
    pub fn create(&self, config: &OrchestrationConfig) -> RegistryResult<()> {
        config.save.validate()?;
        let space = self.manager.space(&config.save.space)?;
        if !space.exists() {
            return Err(ERROR_CONTENT_NOT_FOUND.with([("name", config.save.space.clone())]));
        }
        let version = space
            .chart(&config.save.chart)?
            .version(&config.save.version)?;
        if version.exists() {
            return Err(ERROR_RESOURCE_EXIST.with([("name", config.save.path())]));
        }

        let mut chart = self.compose(None, &config.configs)?;

        // Only the composed override tree survives as values.
        chart.clear_values();
        let overrides = config.configs.collect_overrides();
        chart.values =
            serde_yaml::to_string(&overrides).map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;

        chart.descriptor.name = config.save.chart.clone();
        chart.descriptor.version = config.save.version.clone();
        chart.descriptor.description = if config.save.description.is_empty() {
            None
        } else {
            Some(config.save.description.clone())
        };

        let data = pack(&chart).map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e))?;
        tracing::info!(target = %config.save.path(), charts = chart.chart_count(), "composed chart");
        version.put_content(&data)
    }

    /// Resolve one node: fetch the base chart, then compose and rename every
    /// child, replacing the base's dependency list with exactly the composed
    /// children. The first error wins; no partial tree escapes.
    fn compose(&self, parent: Option<&ChartBundle>, node: &ConfigNode) -> RegistryResult<ChartBundle> {
        let mut chart = self.resolve(parent, &node.package)?;
        let mut children = Vec::with_capacity(node.children.len());
        for (name, child_node) in &node.children {
            if !is_valid_name(name) {
                return Err(
                    ERROR_INVALID_PARAM.with([("name", "chart".into()), ("value", name.clone())])
                );
            }
            // Children resolve against the base chart as fetched; the
            // dependency list is swapped only after all of them composed.
            let mut child = self.compose(Some(&chart), child_node)?;
            child.rename(name);
            children.push(child);
        }
        chart.dependencies = children;
        Ok(chart)
    }

    /// Fetch the chart a package reference points at: from the store when
    /// independent, from the parent's embedded dependencies otherwise.
    fn resolve(&self, parent: Option<&ChartBundle>, pkg: &PackageRef) -> RegistryResult<ChartBundle> {
        let reference = format!("{}/{}", pkg.chart, pkg.version);
        if pkg.independent {
            let version = self
                .manager
                .space(&pkg.space)?
                .chart(&pkg.chart)?
                .version(&pkg.version)?;
            let data = version.get_content()?;
            return unpack(&data).map_err(|e| ERROR_INTERNAL_UNKNOWN.wrap(e));
        }
        let Some(parent) = parent else {
            return Err(
                ERROR_INVALID_PARAM.with([("name", "package".into()), ("value", reference)])
            );
        };
        match parent.dependency(&pkg.chart) {
            Some(dep) => Ok(dep.clone()),
            None => Err(ERROR_CONTENT_NOT_FOUND.with([(
                "name",
                format!(
                    "{reference} in {}/{}",
                    parent.descriptor.name, parent.descriptor.version
                ),
            )])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use chartreg_archive::ChartFile;
    use chartreg_driver::InMemoryDriver;
    use chartreg_types::ChartDescriptor;

    fn manager() -> SpaceManager {
        SpaceManager::new(Arc::new(InMemoryDriver::new()), Duration::from_secs(5))
    }

    fn seed_chart(manager: &SpaceManager, space: &str, name: &str, version: &str) {
        let mut chart = ChartBundle::new(ChartDescriptor::new(name, version));
        chart.values = "replicaCount: 1\n".into();
        chart
            .templates
            .push(ChartFile::new("templates/app.yaml", b"kind: Thing\n".to_vec()));
        let mut dep = ChartBundle::new(ChartDescriptor::new("db", "0.2.0"));
        dep.values = "storage: 1Gi\n".into();
        chart.dependencies.push(dep);

        manager
            .space(space)
            .unwrap()
            .chart(name)
            .unwrap()
            .version(version)
            .unwrap()
            .put_content(&pack(&chart).unwrap())
            .unwrap();
    }

    fn config(body: &str) -> OrchestrationConfig {
        let mut cfg = OrchestrationConfig::from_json(body.as_bytes()).unwrap();
        cfg.save.space = "library".to_string();
        cfg
    }

    // -----------------------------------------------------------------------
    // Round trip (single node, no overrides)
    // -----------------------------------------------------------------------

    #[test]
    fn single_node_composition_round_trips() {
        let m = manager();
        m.create_space("library").unwrap();
        seed_chart(&m, "library", "test", "1.0.0");

        let cfg = config(
            r#"{"save": {"chart": "testX", "version": "1.0.1", "description": "d"},
                "configs": {"package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"}}}"#,
        );
        Composer::new(&m).create(&cfg).unwrap();

        let chart = m.space("library").unwrap().chart("testX").unwrap();
        assert_eq!(chart.list_versions().unwrap(), vec!["1.0.1"]);
        let md = chart.latest_metadata().unwrap();
        assert_eq!(md.name, "testX");
        assert_eq!(md.version, "1.0.1");
        assert_eq!(md.description.as_deref(), Some("d"));
        // The source chart's dependency tree is dropped: no children named.
        assert!(md.dependencies.is_empty());

        // Values reduce to the empty override merge.
        let values: serde_json::Value = serde_json::from_slice(
            &chart.version("1.0.1").unwrap().values().unwrap(),
        )
        .unwrap();
        assert_eq!(values, serde_json::json!({}));
    }

    // -----------------------------------------------------------------------
    // Overrides (S3 shape)
    // -----------------------------------------------------------------------

    #[test]
    fn config_overrides_become_root_values() {
        let m = manager();
        m.create_space("library").unwrap();
        seed_chart(&m, "library", "test", "1.0.0");

        let cfg = config(
            r#"{"save": {"chart": "testX", "version": "1.0.1", "description": "d"},
                "configs": {
                    "package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"},
                    "_config": {"replicaCount": 3}}}"#,
        );
        Composer::new(&m).create(&cfg).unwrap();

        let values: serde_json::Value = serde_json::from_slice(
            &m.space("library")
                .unwrap()
                .chart("testX")
                .unwrap()
                .version("1.0.1")
                .unwrap()
                .values()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(values["_config"], serde_json::json!({"replicaCount": 3}));
    }

    // -----------------------------------------------------------------------
    // Children: renaming, dependent resolution
    // -----------------------------------------------------------------------

    #[test]
    fn dependent_child_is_resolved_and_renamed() {
        let m = manager();
        m.create_space("library").unwrap();
        seed_chart(&m, "library", "test", "1.0.0");

        let cfg = config(
            r#"{"save": {"chart": "combo", "version": "2.0.0", "description": ""},
                "configs": {
                    "package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"},
                    "database": {
                        "package": {"independent": false, "space": "library", "chart": "db", "version": "0.2.0"}}}}"#,
        );
        Composer::new(&m).create(&cfg).unwrap();

        let md = m
            .space("library")
            .unwrap()
            .chart("combo")
            .unwrap()
            .latest_metadata()
            .unwrap();
        assert_eq!(md.dependencies.len(), 1);
        assert_eq!(md.dependencies[0].name, "database");
        assert_eq!(md.dependencies[0].version, "0.2.0");
    }

    #[test]
    fn dangling_dependent_reference_is_not_found() {
        let m = manager();
        m.create_space("library").unwrap();
        seed_chart(&m, "library", "test", "1.0.0");

        let cfg = config(
            r#"{"save": {"chart": "combo", "version": "2.0.0", "description": ""},
                "configs": {
                    "package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"},
                    "ghost": {
                        "package": {"independent": false, "space": "library", "chart": "nosuch", "version": "0.0.1"}}}}"#,
        );
        let err = Composer::new(&m).create(&cfg).unwrap_err();
        assert!(err.is(&ERROR_CONTENT_NOT_FOUND));
    }

    #[test]
    fn missing_independent_chart_is_not_found() {
        let m = manager();
        m.create_space("library").unwrap();

        let cfg = config(
            r#"{"save": {"chart": "combo", "version": "2.0.0", "description": ""},
                "configs": {"package": {"independent": true, "space": "library", "chart": "absent", "version": "1.0.0"}}}"#,
        );
        let err = Composer::new(&m).create(&cfg).unwrap_err();
        assert!(err.is(&ERROR_CONTENT_NOT_FOUND));
    }

    // -----------------------------------------------------------------------
    // Target preconditions
    // -----------------------------------------------------------------------

    #[test]
    fn missing_target_space_is_not_found() {
        let m = manager();
        let cfg = config(
            r#"{"save": {"chart": "x", "version": "1.0.0", "description": ""},
                "configs": {"package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"}}}"#,
        );
        let err = Composer::new(&m).create(&cfg).unwrap_err();
        assert!(err.is(&ERROR_CONTENT_NOT_FOUND));
    }

    #[test]
    fn existing_target_version_conflicts() {
        let m = manager();
        m.create_space("library").unwrap();
        seed_chart(&m, "library", "test", "1.0.0");

        let cfg = config(
            r#"{"save": {"chart": "test", "version": "1.0.0", "description": ""},
                "configs": {"package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"}}}"#,
        );
        let err = Composer::new(&m).create(&cfg).unwrap_err();
        assert!(err.is(&ERROR_RESOURCE_EXIST));
        assert_eq!(err.code, 409);
    }

    #[test]
    fn invalid_child_key_is_rejected() {
        let m = manager();
        m.create_space("library").unwrap();
        seed_chart(&m, "library", "test", "1.0.0");

        let cfg = config(
            r#"{"save": {"chart": "combo", "version": "2.0.0", "description": ""},
                "configs": {
                    "package": {"independent": true, "space": "library", "chart": "test", "version": "1.0.0"},
                    "_bad-name": {
                        "package": {"independent": false, "space": "library", "chart": "db", "version": "0.2.0"}}}}"#,
        );
        let err = Composer::new(&m).create(&cfg).unwrap_err();
        assert!(err.is(&ERROR_INVALID_PARAM));
        // Nothing was materialized at the save target.
        assert!(m.space("library").unwrap().list_charts().unwrap() == vec!["test"]);
    }
}
