use std::sync::Arc;

use chartreg_store::SpaceManager;

/// Shared server context: the one configured storage manager per instance.
///
/// Passed through axum `State`; handlers never reach for process globals.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SpaceManager>,
}

impl AppState {
    pub fn new(manager: SpaceManager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }
}
