use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: usize = 8;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not valid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("could not build connection pool: {0}")]
    Pool(String),

    #[error("could not apply migrations: {0}")]
    Migration(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: usize,
    /// Upper bound for acquiring a connection and for running one query.
    pub query_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
        }
    }

    /// Reads `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_QUERY_TIMEOUT_SECS`, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "DATABASE_MAX_CONNECTIONS",
                reason: "must be at least 1".to_string(),
            });
        }
        let timeout_secs = parse_var("DATABASE_QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS)?;

        Ok(Self {
            url,
            max_connections,
            query_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
