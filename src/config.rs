use crate::domain::Decimal;
use crate::engine::transfers::DEFAULT_BUDGET_CEILING;
use std::collections::HashMap;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub database_path: String,
    /// Maximum total price of a 15-athlete squad.
    pub budget_ceiling: Decimal,
    /// Participants settled at once.
    pub settlement_concurrency: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let bind_addr = env_map
            .get("BIND_ADDR")
            .map(|s| s.as_str())
            .unwrap_or("127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "BIND_ADDR".to_string(),
                    "must be an IPv4 or IPv6 address".to_string(),
                )
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let budget_ceiling = env_map
            .get("BUDGET_CEILING")
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_BUDGET_CEILING)
            .parse::<Decimal>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "BUDGET_CEILING".to_string(),
                    "must be a decimal number".to_string(),
                )
            })?;
        if budget_ceiling.is_negative() {
            return Err(ConfigError::InvalidValue(
                "BUDGET_CEILING".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let settlement_concurrency = match env_map
            .get("SETTLEMENT_CONCURRENCY")
            .map(|s| s.as_str())
            .unwrap_or("8")
            .parse::<usize>()
        {
            Ok(n) if n >= 1 => n,
            _ => {
                return Err(ConfigError::InvalidValue(
                    "SETTLEMENT_CONCURRENCY".to_string(),
                    "must be a positive integer".to_string(),
                ))
            }
        };

        Ok(Config {
            port,
            bind_addr,
            database_path,
            budget_ceiling,
            settlement_concurrency,
        })
    }

    /// Defaults for everything but the database path.
    pub fn with_database_path(database_path: impl Into<String>) -> Self {
        Config {
            port: 8080,
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            database_path: database_path.into(),
            budget_ceiling: DEFAULT_BUDGET_CEILING.parse().unwrap_or_default(),
            settlement_concurrency: 8,
        }
    }
}
