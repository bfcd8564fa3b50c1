//! API configuration

use app_booking::EngineConfig;
use serde::Deserialize;

/// API configuration
///
/// Read from `BOOKING_`-prefixed environment variables. Nested engine
/// settings use a double underscore, e.g. `BOOKING_ENGINE__BATCH_SIZE=50`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level, used when `RUST_LOG` is not set
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    pub engine: EngineConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/bookings".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            engine: EngineConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(Self::environment())
    }

    /// Loads configuration from an environment source
    pub fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("BOOKING")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> ApiConfig {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_environment(ApiConfig::environment().source(Some(source))).unwrap()
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = load(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_prefixed_and_nested_variables() {
        let config = load(&[
            ("BOOKING_PORT", "9090"),
            ("BOOKING_LOG_JSON", "true"),
            ("BOOKING_DATABASE_URL", "postgres://db/bookings"),
            ("BOOKING_ENGINE__BATCH_SIZE", "25"),
        ]);
        assert_eq!(config.port, 9090);
        assert!(config.log_json);
        assert_eq!(config.database_url, "postgres://db/bookings");
        assert_eq!(config.engine.batch_size, 25);
        assert_eq!(config.engine.payment_term_days, 14);
    }
}
