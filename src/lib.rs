pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod templates;
pub mod websocket;
pub mod ws;

use std::sync::Arc;

use auth::{SessionCookies, TokenIssuer};
use config::Config;
use templates::TemplateStore;
use ws::connection::ConnectionSettings;
use ws::{HubRegistry, HubSettings};

pub use routes::create_app;

/// Everything handlers share, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenIssuer>,
    pub cookies: Arc<SessionCookies>,
    pub registry: Arc<HubRegistry>,
    pub templates: Arc<TemplateStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let templates = TemplateStore::load(&config.static_dir);
        Self::with_templates(config, templates)
    }

    pub fn with_templates(config: Config, templates: TemplateStore) -> Self {
        let registry = HubRegistry::new(
            config.data_path.clone(),
            HubSettings {
                event_capacity: config.hub_event_capacity,
                default_font_size: config.default_font_size,
            },
        );
        Self {
            tokens: Arc::new(TokenIssuer::new(&config.jwt_secret)),
            cookies: Arc::new(SessionCookies::new(&config.jwt_secret)),
            registry: Arc::new(registry),
            templates: Arc::new(templates),
            config: Arc::new(config),
        }
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            queue_capacity: self.config.queue_capacity,
            ping_interval: self.config.ping_interval(),
            idle_timeout: self.config.idle_timeout(),
        }
    }
}
