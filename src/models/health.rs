use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness or readiness verdict
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `unavailable`
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: "unavailable".to_string(),
            message: message.into(),
        }
    }
}
