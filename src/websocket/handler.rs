use axum::{
    extract::{ws::WebSocketUpgrade, Extension, Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{error_response, AppError};
use crate::ws::connection;
use crate::ws::registry::validate_room_id;
use crate::ws::ConnCtx;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub session_id: Option<String>,
}

/// WebSocket handler
pub async fn websocket_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(query): Query<WsQuery>,
    Extension(user): Extension<AuthUser>,
    ws: Option<WebSocketUpgrade>,
) -> Result<Response, AppError> {
    validate_room_id(&room_id)?;
    let Some(ws) = ws else {
        return Ok(error_response(
            StatusCode::UPGRADE_REQUIRED,
            "Expected a WebSocket upgrade",
        ));
    };

    let hub = state.registry.get_or_open(&room_id)?;
    let ctx = ConnCtx::new(user.username, query.session_id);
    let settings = state.connection_settings();

    info!(
        room = %room_id,
        conn_id = %ctx.id,
        username = %ctx.username,
        session_id = %ctx.session_id,
        "New WebSocket connection"
    );

    Ok(ws
        .max_message_size(state.config.max_message_bytes)
        .on_upgrade(move |socket| connection::serve(socket, ctx, hub, settings)))
}
