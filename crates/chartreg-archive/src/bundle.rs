use chartreg_types::ChartDescriptor;

/// A named file inside a chart bundle, path relative to the chart root.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl ChartFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// The decomposed form of a chart archive.
///
/// `values` holds the raw `values.yaml` text; an empty string means the file
/// was absent. Template names keep their `templates/` prefix so packing
/// reproduces the original paths.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartBundle {
    pub descriptor: ChartDescriptor,
    pub values: String,
    pub templates: Vec<ChartFile>,
    pub files: Vec<ChartFile>,
    pub dependencies: Vec<ChartBundle>,
}

impl ChartBundle {
    pub fn new(descriptor: ChartDescriptor) -> Self {
        Self {
            descriptor,
            ..Self::default()
        }
    }

    /// The chart's own name from its descriptor.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Rename this chart (used by the composer for local renaming).
    pub fn rename(&mut self, name: impl Into<String>) {
        self.descriptor.name = name.into();
    }

    /// Find a direct dependency by its descriptor name.
    pub fn dependency(&self, name: &str) -> Option<&ChartBundle> {
        self.dependencies.iter().find(|dep| dep.name() == name)
    }

    /// Remove every values document in the tree, recursively.
    pub fn clear_values(&mut self) {
        self.values.clear();
        for dep in &mut self.dependencies {
            dep.clear_values();
        }
    }

    /// Total number of charts in the tree, this one included.
    pub fn chart_count(&self) -> usize {
        1 + self
            .dependencies
            .iter()
            .map(ChartBundle::chart_count)
            .sum::<usize>()
    }
}
