use std::panic;

use roomtext::config::Config;
use roomtext::{create_app, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    Config::load_env_files();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("roomtext=debug,tower_http=debug,axum::rejection=trace,{log_level}").into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let raw_environment = std::env::var("ENVIRONMENT").ok();
    let config = match Config::resolve(Config::load(), raw_environment.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Refusing to start: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&config.data_path).await {
        warn!(path = %config.data_path.display(), "Failed to create data directory: {}", e);
    }

    let address = config.server_address();
    let state = AppState::new(config);
    let app = create_app(state);

    let listener = match tokio::net::TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", address, e);
            std::process::exit(1);
        }
    };

    info!("🚀 Server running on http://{}", address);
    info!("📡 WebSocket available at ws://{}/ws/{{roomID}}", address);
    info!("📚 Swagger UI available at http://{}/swagger", address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }
    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
