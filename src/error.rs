use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use crate::auth::AuthError;
use crate::db::StoreError;
use crate::models::ErrorResponse;
use crate::ws::{HubClosed, InvalidRoomId};

/// Errors surfaced by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    InvalidRoom(#[from] InvalidRoomId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hub(#[from] HubClosed),
}

/// Plain 302 redirect.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub fn error_response(code: StatusCode, error: impl Into<String>) -> Response {
    (code, Json(ErrorResponse::new(code, error))).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Auth(AuthError::Issue(e)) => {
                error!("Failed to issue session token: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue session")
            }
            AppError::Auth(e) => {
                debug!("Unauthenticated request: {}", e);
                found("/")
            }
            AppError::InvalidRoom(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Store(e) => {
                error!("Document store failure: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read document")
            }
            AppError::Hub(e) => {
                error!("{}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Room is unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_redirect_home() {
        let res = AppError::Auth(AuthError::Expired).into_response();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/");
    }

    #[test]
    fn issue_failures_are_server_errors() {
        let res = AppError::Auth(AuthError::Issue("boom".into())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_body_carries_code_and_reason() {
        let body = ErrorResponse::new(StatusCode::BAD_REQUEST, "nope");
        assert_eq!(body.code, 400);
        assert_eq!(body.status, "Bad Request");
        assert_eq!(body.error, "nope");
    }

    #[test]
    fn invalid_rooms_are_bad_requests() {
        let res = AppError::InvalidRoom(InvalidRoomId("a/b".into())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
