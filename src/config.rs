// Runtime configuration, read from the environment (and an optional .env file)

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_DATABASE: &str = "fin_api.db";

/// Which ledger store backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

impl StoreKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            other => bail!("unknown store '{}', expected 'sqlite' or 'memory'", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: PathBuf,
    pub store: StoreKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: PathBuf::from(DEFAULT_DATABASE),
            store: StoreKind::Sqlite,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read `FIN_API_*` variables
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key → value source; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup("FIN_API_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("FIN_API_PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("FIN_API_PORT is not a valid port: {:?}", port))?;
        }

        if let Some(database) = lookup("FIN_API_DATABASE") {
            config.database = PathBuf::from(database);
        }

        if let Some(store) = lookup("FIN_API_STORE") {
            config.store = StoreKind::parse(&store)?;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
