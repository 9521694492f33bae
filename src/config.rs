use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

/// Signing secret used when `JWT_SECRET` is not set. Never acceptable in production.
pub const FALLBACK_JWT_SECRET: &str = "my_secret_key";

/// Smallest outbound queue that still fits the three greeting messages plus a roster update.
pub const MIN_QUEUE_CAPACITY: usize = 8;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub server_port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// JWT secret key, also the root of the session cookie key
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Directory holding one snapshot file per room
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Directory with optional `index.html` / `editor.html` overrides
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Capacity of each connection's outbound queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Capacity of each hub's event channel
    #[serde(default = "default_hub_event_capacity")]
    pub hub_event_capacity: usize,

    /// Font size announced by a freshly created hub
    #[serde(default = "default_font_size")]
    pub default_font_size: i64,

    /// Seconds between server pings on an idle connection
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Seconds without any inbound frame before a connection is dropped
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Largest inbound WebSocket message accepted
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_env_files();

        match envy::from_env::<Config>() {
            Ok(config) => {
                config.validate()?;
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Merge app.env (or .env) into the process environment; existing variables win.
    pub fn load_env_files() {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }
    }

    /// Build a configuration from explicit key/value pairs, the same way `load` reads the environment.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(pairs).map_err(ConfigError::EnvError)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the hub cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity < MIN_QUEUE_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "QUEUE_CAPACITY must be at least {}, got {}",
                MIN_QUEUE_CAPACITY, self.queue_capacity
            )));
        }
        if self.hub_event_capacity == 0 {
            return Err(ConfigError::Invalid("HUB_EVENT_CAPACITY must be positive".to_string()));
        }
        if self.ping_interval_secs == 0 || self.idle_timeout_secs <= self.ping_interval_secs {
            return Err(ConfigError::Invalid(format!(
                "IDLE_TIMEOUT_SECS ({}) must exceed a non-zero PING_INTERVAL_SECS ({})",
                self.idle_timeout_secs, self.ping_interval_secs
            )));
        }
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET must not be empty".to_string()));
        }
        Ok(())
    }

    /// The fallback secret is a deployment hazard: warn everywhere, refuse in production.
    pub fn check_secret(&self) -> Result<(), ConfigError> {
        if self.jwt_secret != FALLBACK_JWT_SECRET {
            return Ok(());
        }
        if self.is_production() {
            return Err(ConfigError::Invalid(
                "JWT_SECRET must be set explicitly in production".to_string(),
            ));
        }
        warn!("JWT_SECRET is not set, using the built-in fallback secret");
        Ok(())
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.server_port)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Parsed list of CORS origins, empty when unset
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.environment)
    }

    /// Settle the configuration to start with.
    ///
    /// A failed load falls back to defaults, unless `raw_environment` names
    /// production: defaults would swap in the public fallback secret there.
    /// The secret check runs on whatever configuration survives.
    pub fn resolve(
        loaded: Result<Config, ConfigError>,
        raw_environment: Option<&str>,
    ) -> Result<Config, ConfigError> {
        let config = match loaded {
            Ok(config) => config,
            Err(e) if raw_environment.is_some_and(is_production_name) => return Err(e),
            Err(e) => {
                warn!("Using default configuration after load failure: {}", e);
                Config::default()
            }
        };
        config.check_secret()?;
        Ok(config)
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "prod" || environment == "production"
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            server_port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            log_level: default_log_level(),
            jwt_secret: default_jwt_secret(),
            data_path: default_data_path(),
            static_dir: default_static_dir(),
            queue_capacity: default_queue_capacity(),
            hub_event_capacity: default_hub_event_capacity(),
            default_font_size: default_font_size(),
            ping_interval_secs: default_ping_interval_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvError(envy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_jwt_secret() -> String {
    FALLBACK_JWT_SECRET.to_string()
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

fn default_queue_capacity() -> usize {
    256
}

fn default_hub_event_capacity() -> usize {
    1024
}

fn default_font_size() -> i64 {
    16
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    75
}

fn default_max_message_bytes() -> usize {
    1024 * 1024
}
