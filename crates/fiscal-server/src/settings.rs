//! Server configuration, read once at start from the environment

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// `DATABASE_URL`
    pub database_url: String,
    /// `BIND_ADDRESS`
    pub bind_address: String,
    /// `MAX_CONNECTIONS`, ignored for in-memory databases
    pub max_connections: u32,
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::default())
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database_url", "sqlite://fiscal.db")?
            .set_default("bind_address", "0.0.0.0:8000")?
            .set_default("max_connections", 5)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        Environment::default().source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_env(env(&[])).unwrap();
        assert_eq!(config.database_url, "sqlite://fiscal.db");
        assert_eq!(config.bind_address, "0.0.0.0:8000");
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServerConfig::from_env(env(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("MAX_CONNECTIONS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.max_connections, 2);
    }
}
