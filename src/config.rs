//! Configuration module
//!
//! Loaded from a TOML file, by default
//! `~/.config/parking-reservation/config.toml`. A missing file yields the
//! defaults; every section and key is optional.
//!
//! ```toml
//! [database]
//! url = "sqlite://./parking.db?mode=rwc"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [reservation]
//! lock_timeout_ms = 2000
//! retry_max_attempts = 3
//! overstay_multiplier = "1.5"
//!
//! [metrics]
//! enabled = true
//! listen_addr = "0.0.0.0:9102"
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::reservation::ReservationSettings;
use crate::infrastructure::database::DatabaseConfig;
use crate::shared::errors::InfraError;
use crate::shared::retry::RetryPolicy;

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parking-reservation")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSection,
    pub logging: LoggingSection,
    pub reservation: ReservationSection,
    pub metrics: MetricsSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./parking.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// EnvFilter directive; `RUST_LOG` takes precedence
    pub level: String,
    /// "text" or "json"
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationSection {
    pub lock_timeout_ms: u64,
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub activation_interval_secs: u64,
    /// Decimal string, at least 1
    pub overstay_multiplier: String,
}

impl Default for ReservationSection {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 2000,
            retry_max_attempts: 3,
            retry_initial_delay_ms: 50,
            activation_interval_secs: 30,
            overstay_multiplier: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "0.0.0.0:9102".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Grace period for background tasks on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            shutdown_timeout: 30,
        }
    }
}

impl AppConfig {
    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let config: Self =
            toml::from_str(raw).map_err(|e| InfraError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        let r = &self.reservation;
        if r.lock_timeout_ms == 0 {
            return Err(InfraError::Config(
                "reservation.lock_timeout_ms must be positive".into(),
            ));
        }
        if r.retry_max_attempts == 0 {
            return Err(InfraError::Config(
                "reservation.retry_max_attempts must be at least 1".into(),
            ));
        }
        if r.activation_interval_secs == 0 {
            return Err(InfraError::Config(
                "reservation.activation_interval_secs must be positive".into(),
            ));
        }
        let multiplier = self.overstay_multiplier()?;
        if multiplier < Decimal::ONE {
            return Err(InfraError::Config(format!(
                "reservation.overstay_multiplier must be >= 1, got {multiplier}"
            )));
        }
        if self.metrics.enabled {
            self.metrics_addr()?;
        }
        if self.database.url.trim().is_empty() {
            return Err(InfraError::Config("database.url must not be empty".into()));
        }
        Ok(())
    }

    pub fn overstay_multiplier(&self) -> Result<Decimal, InfraError> {
        Decimal::from_str(self.reservation.overstay_multiplier.trim()).map_err(|e| {
            InfraError::Config(format!(
                "reservation.overstay_multiplier '{}' is not a number: {e}",
                self.reservation.overstay_multiplier
            ))
        })
    }

    pub fn metrics_addr(&self) -> Result<SocketAddr, InfraError> {
        self.metrics.listen_addr.parse().map_err(|e| {
            InfraError::Config(format!(
                "metrics.listen_addr '{}' is invalid: {e}",
                self.metrics.listen_addr
            ))
        })
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    pub fn reservation_settings(&self) -> Result<ReservationSettings, InfraError> {
        let r = &self.reservation;
        Ok(ReservationSettings {
            lock_timeout: Duration::from_millis(r.lock_timeout_ms),
            retry: RetryPolicy {
                max_attempts: r.retry_max_attempts,
                initial_delay: Duration::from_millis(r.retry_initial_delay_ms),
                ..Default::default()
            },
            overstay_multiplier: self.overstay_multiplier()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.reservation.lock_timeout_ms, 2000);
        assert_eq!(config.reservation.retry_max_attempts, 3);
        assert_eq!(config.reservation.activation_interval_secs, 30);
        assert_eq!(config.overstay_multiplier().unwrap(), Decimal::ONE);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [reservation]
            lock_timeout_ms = 500
            overstay_multiplier = "1.5"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.reservation.lock_timeout_ms, 500);
        assert_eq!(config.reservation.retry_max_attempts, 3);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");

        let settings = config.reservation_settings().unwrap();
        assert_eq!(settings.lock_timeout, Duration::from_millis(500));
        assert_eq!(settings.overstay_multiplier, Decimal::new(15, 1));
    }

    #[test]
    fn rejects_nonsense_values() {
        for raw in [
            "[reservation]\nlock_timeout_ms = 0",
            "[reservation]\nretry_max_attempts = 0",
            "[reservation]\noverstay_multiplier = \"0.5\"",
            "[reservation]\noverstay_multiplier = \"lots\"",
            "[metrics]\nenabled = true\nlisten_addr = \"nowhere\"",
            "[database]\nurl = \"\"",
        ] {
            assert!(
                matches!(AppConfig::from_toml(raw), Err(InfraError::Config(_))),
                "accepted: {raw}"
            );
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.database.url, DatabaseSection::default().url);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        assert!(default_config_path().ends_with("parking-reservation/config.toml"));
    }
}
