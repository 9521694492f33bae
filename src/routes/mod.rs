pub mod api;
pub mod auth_middleware;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::handlers::{editor, home, login};
use crate::websocket::websocket_handler;
use crate::AppState;

pub use api::create_api_routes;
pub use auth_middleware::require_session;

/// The full application router
pub fn create_app(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/editor/:room_id", get(editor))
        .route("/ws/:room_id", get(websocket_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session)); // Applies to all routes added above

    let cors = cors_layer(&state.config.cors_origin_list());

    let app = Router::new()
        .route("/", get(home))
        .route("/login", post(login))
        .merge(session_routes)
        .nest("/api", create_api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any),
    )
}
