use std::sync::Arc;

use weft_engine::GraphExecutor;

/// Shared application state for axum handlers.
pub struct AppState {
    pub executor: Arc<GraphExecutor>,
}
