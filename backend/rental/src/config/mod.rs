use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Service settings, read from environment variables (`DATABASE_URL`,
/// `JWT_SECRET`, `TELEMETRY_ENABLED`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiry_days: i64,
    pub server_addr: String,
    #[serde(default)]
    pub telemetry_enabled: bool,
    #[serde(default = "default_telemetry_service_name")]
    pub telemetry_service_name: String,
    #[serde(default = "default_telemetry_service_version")]
    pub telemetry_service_version: String,
    #[serde(default = "default_telemetry_environment")]
    pub telemetry_environment: String,
    #[serde(default = "default_telemetry_otlp_endpoint")]
    pub telemetry_otlp_endpoint: String,
}

fn default_telemetry_service_name() -> String {
    "car-rental".to_string()
}

fn default_telemetry_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_telemetry_environment() -> String {
    "production".to_string()
}

fn default_telemetry_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default().try_parsing(true))
    }

    fn from_source(source: Environment) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .set_default("database_max_connections", 5)?
            .set_default("jwt_expiry_days", 7)?
            .set_default("server_addr", "0.0.0.0:8080")?
            .add_source(source)
            .build()?
            .try_deserialize()?;

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("JWT_SECRET must not be empty".to_string()));
        }
        Ok(config)
    }
}
