//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// This method is used internally to populate the singleton. It panics
    /// if required variables are missing or improperly formatted.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "logs/examgate.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").expect("DATABASE_PATH is required"),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }
}

/// Returns the configured database path (or DSN).
pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

/// Returns the current environment name (`development`, `test`, `production`).
pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_optionals_fall_back_to_defaults() {
        // set_var is unsafe in edition 2024; this test owns the variables it touches.
        unsafe {
            std::env::set_var("DATABASE_PATH", "data/test.db");
            std::env::remove_var("APP_ENV");
            std::env::remove_var("LOG_LEVEL");
            std::env::remove_var("LOG_TO_STDOUT");
        }

        let config = AppConfig::from_env();
        assert_eq!(config.database_path, "data/test.db");
        assert_eq!(config.env, "development");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_to_stdout);
    }
}
