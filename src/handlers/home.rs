use axum::{extract::State, response::Html};

use crate::AppState;

/// Landing page with the login form
pub async fn home(State(state): State<AppState>) -> Html<String> {
    Html(state.templates.index().to_string())
}
