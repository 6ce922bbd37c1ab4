//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden with `TRACKER__SECTION__KEY`
//! environment variables.
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

fn default_level() -> String {
    "info".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_hash_cost")]
    pub hash_cost: u32,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    pub auth: Auth,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("TRACKER").separator("__"))
            .build()?;

        let settings: Settings = settings.try_deserialize()?;
        if settings.auth.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.secret must not be empty".to_string(),
            ));
        }
        if settings.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Message(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }
        Ok(settings)
    }
}
