use serde::Serialize;

/// Standard list payload: totals plus the selected page of items.
#[derive(Clone, Debug, Serialize)]
pub struct ListResponse<T> {
    pub metadata: ListMeta,
    pub items: Vec<T>,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct ListMeta {
    pub total: usize,
    #[serde(rename = "itemsLength")]
    pub items_length: usize,
}

impl<T> ListResponse<T> {
    pub fn new(total: usize, items: Vec<T>) -> Self {
        Self {
            metadata: ListMeta {
                total,
                items_length: items.len(),
            },
            items,
        }
    }
}

/// Self-link for a created space.
#[derive(Clone, Debug, Serialize)]
pub struct Link {
    pub name: String,
    pub link: String,
}

impl Link {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }
}

/// Self-link for a created or uploaded chart version.
#[derive(Clone, Debug, Serialize)]
pub struct ChartLink {
    pub space: String,
    pub chart: String,
    pub version: String,
    pub link: String,
}

impl ChartLink {
    pub fn new(
        space: impl Into<String>,
        chart: impl Into<String>,
        version: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            space: space.into(),
            chart: chart.into(),
            version: version.into(),
            link: link.into(),
        }
    }
}
