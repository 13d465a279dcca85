use std::env;
use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` when present).
///
/// | Variable | Default |
/// |----------|---------|
/// | DATABASE_URL | sqlite://academy.db?mode=rwc |
/// | BIND_ADDR | 127.0.0.1:3000 |
/// | DB_MAX_CONNECTIONS | 5 |
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://academy.db?mode=rwc".to_string());
        let bind_addr = parse_var("BIND_ADDR", "127.0.0.1:3000")?;
        let max_connections = parse_var("DB_MAX_CONNECTIONS", "5")?;

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
