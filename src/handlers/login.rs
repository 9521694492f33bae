use axum::{
    extract::State,
    http::HeaderMap,
    response::Response,
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::auth::cookies::set_cookie_header;
use crate::error::{found, AppError};
use crate::services::auth_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
}

/// Issue a session and send the user to a brand new room.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(username) = auth_service::normalize_username(&form.username) else {
        debug!("Rejected login with unusable username");
        return Ok(found("/"));
    };

    let grant = auth_service::login(&username, &headers, &state.cookies, &state.tokens, Utc::now())?;

    let room_id = Uuid::new_v4();
    let mut response = found(&format!("/editor/{room_id}"));
    for cookie in &grant.set_cookies {
        if let Some((name, value)) = set_cookie_header(cookie) {
            response.headers_mut().append(name, value);
        }
    }
    Ok(response)
}
