use axum::{routing::get, Router};

use crate::handlers::{diagnostics, health_check, ready_check};
use crate::AppState;

/// Create API routes
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/diagnostics", get(diagnostics))
}
