//! Configuration module
//!
//! Loaded from a TOML file. Every section and key is optional; anything
//! missing falls back to the defaults below.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! shutdown_timeout = 30
//!
//! [database]
//! url = "sqlite://./evcs.db?mode=rwc"   # or "memory"
//!
//! [logging]
//! level = "info"
//! json = false
//!
//! [booking]
//! advance_window_days = 7
//! lock_window_hours = 12
//! repository_timeout_ms = 5000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::booking::BookingPolicy;
use crate::infrastructure::DatabaseConfig;
use crate::shared::errors::InfraError;

pub const CONFIG_ENV: &str = "EVCS_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub booking: BookingConfig,
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SeaORM connection URL, or `memory` for the process-local store
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DatabaseConfig::default().url,
        }
    }
}

impl DatabaseSection {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }

    pub fn connection_url(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub advance_window_days: i64,
    pub lock_window_hours: i64,
    pub repository_timeout_ms: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            advance_window_days: 7,
            lock_window_hours: 12,
            repository_timeout_ms: 5_000,
        }
    }
}

impl BookingConfig {
    pub fn policy(&self) -> BookingPolicy {
        BookingPolicy {
            advance_window: chrono::Duration::days(self.advance_window_days),
            lock_window: chrono::Duration::hours(self.lock_window_hours),
        }
    }

    pub fn repository_timeout(&self) -> Duration {
        Duration::from_millis(self.repository_timeout_ms)
    }
}

impl AppConfig {
    /// Read and parse a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| InfraError::Config(format!("{}: {}", path.display(), e)))?;
        let cfg = Self::parse(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn parse(raw: &str) -> Result<Self, InfraError> {
        toml::from_str(raw).map_err(|e| InfraError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), InfraError> {
        let b = &self.booking;
        if b.advance_window_days <= 0 || b.lock_window_hours < 0 {
            return Err(InfraError::Config(
                "booking windows must be positive".to_string(),
            ));
        }
        if b.repository_timeout_ms == 0 {
            return Err(InfraError::Config(
                "repository_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// `$EVCS_CONFIG`, else `~/.config/evcs-booking/config.toml`
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}

pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("evcs-booking")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::parse("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.booking.advance_window_days, 7);
        assert_eq!(cfg.booking.lock_window_hours, 12);
        assert!(!cfg.logging.json);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::parse(
            r#"
            [server]
            port = 9090

            [database]
            url = "memory"

            [booking]
            lock_window_hours = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(cfg.database.is_memory());
        assert_eq!(cfg.booking.lock_window_hours, 6);
        assert_eq!(cfg.booking.repository_timeout_ms, 5_000);

        let policy = cfg.booking.policy();
        assert_eq!(policy.lock_window, chrono::Duration::hours(6));
        assert_eq!(policy.advance_window, chrono::Duration::days(7));
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            AppConfig::parse("[server\nport = 1"),
            Err(InfraError::Config(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load(Path::new("/nonexistent/evcs/config.toml")).unwrap();
        assert_eq!(cfg.server.address(), "0.0.0.0:8080");
    }

    #[test]
    fn zero_timeout_rejected() {
        let cfg = AppConfig::parse("[booking]\nrepository_timeout_ms = 0").unwrap();
        assert!(cfg.validate().is_err());
    }
}
