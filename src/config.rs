//! Service configuration, read from environment variables with defaults

use std::{env, fmt, str::FromStr};

/// Backing store selected at startup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    /// Volatile store, lost on restart
    Memory,
}

impl FromStr for StoreKind {
    type Err = UnknownStore;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(UnknownStore(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown store {0:?}, expected \"sqlite\" or \"memory\"")]
pub struct UnknownStore(String);

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub store: StoreKind,
    /// SQLite connection URL
    pub url: String,
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Unparsable numeric values fall back to their default. An unknown `STORE` is an error.
    pub fn from_env() -> Result<Self, UnknownStore> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, UnknownStore> {
        Ok(Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("PORT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                store: lookup("STORE")
                    .map(|s| s.parse())
                    .transpose()?
                    .unwrap_or(StoreKind::Sqlite),
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite:customer_voucher.db".to_string()),
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
        })
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Sqlite => f.write_str("sqlite"),
            StoreKind::Memory => f.write_str("memory"),
        }
    }
}
