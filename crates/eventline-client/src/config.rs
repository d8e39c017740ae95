//! Endpoint configuration for the broker and schema registry.

use crate::error::ConfigError;

pub const BROKER_URL_VAR: &str = "EVENTLINE_BROKER_URL";
pub const SCHEMA_REGISTRY_URL_VAR: &str = "EVENTLINE_SCHEMA_REGISTRY_URL";

/// Endpoints a producer needs at construction time. Both are required;
/// neither has a usable default.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Broker REST endpoint, e.g. "http://localhost:8080".
    pub broker_url: String,

    /// Schema registry endpoint, e.g. "http://localhost:8081".
    pub schema_registry_url: String,
}

impl ClientConfig {
    pub fn new(broker_url: impl Into<String>, schema_registry_url: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            schema_registry_url: schema_registry_url.into(),
        }
    }

    /// Read both endpoints from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            broker_url: required(BROKER_URL_VAR)?,
            schema_registry_url: required(SCHEMA_REGISTRY_URL_VAR)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment mutation is process-global; serialize the tests touching it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn from_env_reads_both_endpoints() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(BROKER_URL_VAR, "http://broker:8080");
        std::env::set_var(SCHEMA_REGISTRY_URL_VAR, "http://registry:8081");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.broker_url, "http://broker:8080");
        assert_eq!(config.schema_registry_url, "http://registry:8081");
    }

    #[test]
    fn from_env_requires_broker_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var(BROKER_URL_VAR);
        std::env::set_var(SCHEMA_REGISTRY_URL_VAR, "http://registry:8081");

        let err = ClientConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(BROKER_URL_VAR)));
    }
}
