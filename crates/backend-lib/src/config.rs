// ============================
// opsgate-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::Path;
use serde::Deserialize;
use figment::{Figment, providers::{Env, Format, Toml}};
use anyhow::Result;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Database connection URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

/// Connection pool sizing and recycling
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Steady-state pool size
    pub size: u32,
    /// Extra connections allowed beyond `size` under load
    pub max_overflow: u32,
    /// Seconds to wait for a connection before giving up
    pub acquire_timeout_secs: u64,
    /// Seconds an idle connection may sit in the pool
    pub idle_timeout_secs: u64,
    /// Seconds after which a connection is recycled regardless of use
    pub recycle_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8300".parse().unwrap(),
            database_url: "sqlite://opsgate.db".to_string(),
            log_level: "info".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            size: 5,
            max_overflow: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            recycle_secs: 1800,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` plus `OPSGATE_`-prefixed environment variables
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings from an explicit config file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("OPSGATE_").split("__"))
            .extract()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.pool.size, 5);
        assert_eq!(settings.pool.max_overflow, 10);
        assert!(settings.pool.recycle_secs > 0);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn load_without_file_falls_back_to_defaults() {
        let settings = Settings::load_from("does-not-exist.toml").unwrap();
        assert_eq!(settings.bind_addr, Settings::default().bind_addr);
    }
}
