use axum::{
    extract::{Extension, Host, Path, State},
    response::Html,
};
use tracing::debug;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::templates::EditorPage;
use crate::AppState;

/// Editor shell for a room, pre-filled with its persisted text.
pub async fn editor(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Host(host): Host,
    Extension(user): Extension<AuthUser>,
) -> Result<Html<String>, AppError> {
    let store = state.registry.store_for(&room_id)?;
    let text = store.read_or_empty().await?;
    debug!(room = %room_id, username = %user.username, len = text.len(), "Rendering editor");

    let ws_url = format!("{host}/ws/{room_id}");
    Ok(Html(state.templates.render_editor(&EditorPage {
        text: &text,
        ws_url: &ws_url,
        username: &user.username,
        room_id: &room_id,
    })))
}
