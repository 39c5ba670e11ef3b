//! Dashboard configuration loaded via OrthoConfig.
//!
//! Values come from `DASHBOARD_*` environment variables, CLI flags or a
//! config file, layered over the defaults declared on each field.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_STATS_WINDOW_MINUTES, DEFAULT_TOKEN_ALLOTMENT};

/// Used when no admin secret is configured; startup logs a warning.
pub const FALLBACK_ADMIN_SECRET: &str = "SUPER_SECRET";

/// Settings for the dashboard server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DASHBOARD")]
pub struct DashboardSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum open database connections.
    #[ortho_config(default = 10)]
    pub db_pool_size: u32,
    /// Listen address, e.g. `0.0.0.0:8080`.
    #[ortho_config(default = String::from("0.0.0.0:8080"))]
    pub bind_addr: String,
    /// Path of the trigger table JSON file.
    #[ortho_config(default = PathBuf::from("config/config.json"))]
    pub triggers_path: PathBuf,
    /// Tokens granted to new users and restored by recharge.
    #[ortho_config(default = DEFAULT_TOKEN_ALLOTMENT)]
    pub default_tokens: u32,
    pub admin_secret: Option<String>,
    #[ortho_config(default = 10)]
    pub http_timeout_secs: u64,
    #[ortho_config(default = 4003)]
    pub govee_command_port: u16,
    #[ortho_config(default = 4002)]
    pub govee_listen_port: u16,
    #[ortho_config(default = 3000)]
    pub govee_status_timeout_ms: u64,
    #[ortho_config(default = 10)]
    pub lightning_duration_secs: u64,
    /// Minutes in the activity series.
    #[ortho_config(default = DEFAULT_STATS_WINDOW_MINUTES)]
    pub stats_window_minutes: u32,
}

/// Reasons the loaded settings cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("DASHBOARD_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid bind address '{value}': {message}")]
    InvalidBindAddr { value: String, message: String },
}

impl DashboardSettings {
    /// Database URL, required at startup.
    ///
    /// # Errors
    ///
    /// [`SettingsError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Pool size; zero is raised to one.
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.max(1)
    }

    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// [`SettingsError::InvalidBindAddr`] when the value is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.bind_addr
            .parse()
            .map_err(|err: std::net::AddrParseError| SettingsError::InvalidBindAddr {
                value: self.bind_addr.clone(),
                message: err.to_string(),
            })
    }

    /// Configured admin secret, or `None` when the fallback applies.
    pub fn admin_secret(&self) -> Option<&str> {
        self.admin_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn govee_status_timeout(&self) -> Duration {
        Duration::from_millis(self.govee_status_timeout_ms)
    }

    pub fn lightning_duration(&self) -> Duration {
        Duration::from_secs(self.lightning_duration_secs)
    }

    /// Minutes in the activity series; zero is raised to one.
    pub fn stats_window_minutes(&self) -> u32 {
        self.stats_window_minutes.max(1)
    }
}
