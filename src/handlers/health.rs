use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, warn};

use crate::models::HealthResponse;
use crate::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse::ok("Server is running"))
}

/// Readiness check endpoint: the data directory must be usable
pub async fn ready_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    debug!("Readiness check requested");
    match tokio::fs::create_dir_all(&state.config.data_path).await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::ok("Service is ready"))),
        Err(e) => {
            warn!(path = %state.config.data_path.display(), "Data directory unavailable: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::unavailable(format!(
                    "Data directory unavailable: {e}"
                ))),
            )
        }
    }
}
