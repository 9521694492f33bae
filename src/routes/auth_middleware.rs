use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::AppError;
use crate::services::auth_service::authenticate;
use crate::AppState;

/// Admit requests carrying a valid session; everyone else is sent back to `/`.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(req.headers(), &state.cookies, &state.tokens)?;
    debug!(username = %user.username, path = %req.uri().path(), "Session admitted");

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
