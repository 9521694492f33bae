use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON body of every non-redirect error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, error: impl Into<String>) -> Self {
        Self {
            code: code.as_u16(),
            status: code.canonical_reason().unwrap_or("error").to_string(),
            error: error.into(),
        }
    }
}
