//! Runtime configuration for helpdesk adapters and services.
//!
//! Values come from `HELPDESK_*` environment variables. Unset variables fall
//! back to [`HelpdeskConfig::default`].

use std::str::FromStr;
use thiserror::Error;

/// Environment variable holding the `PostgreSQL` connection URL.
pub const DATABASE_URL_VAR: &str = "HELPDESK_DATABASE_URL";
/// Environment variable holding the maximum connection pool size.
pub const POOL_SIZE_VAR: &str = "HELPDESK_DB_POOL_SIZE";
/// Environment variable bounding re-validation after a concurrent write.
pub const MAX_CONFLICT_ATTEMPTS_VAR: &str = "HELPDESK_MAX_CONFLICT_ATTEMPTS";

/// Helpdesk runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpdeskConfig {
    /// `PostgreSQL` connection URL. Required only by the `PostgreSQL` store.
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections.
    pub pool_max_size: u32,
    /// How many times a service re-reads and re-validates a ticket after a
    /// concurrent write before giving up.
    pub max_conflict_attempts: u32,
}

impl HelpdeskConfig {
    /// Default pool size.
    pub const DEFAULT_POOL_MAX_SIZE: u32 = 8;
    /// Default bound on conflict re-validation.
    pub const DEFAULT_MAX_CONFLICT_ATTEMPTS: u32 = 3;

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set but cannot be
    /// parsed or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value cannot be parsed or is
    /// out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let database_url = lookup(DATABASE_URL_VAR).filter(|url| !url.trim().is_empty());
        let pool_max_size = parse_or(&lookup, POOL_SIZE_VAR, defaults.pool_max_size)?;
        let max_conflict_attempts = parse_or(
            &lookup,
            MAX_CONFLICT_ATTEMPTS_VAR,
            defaults.max_conflict_attempts,
        )?;

        let config = Self {
            database_url,
            pool_max_size,
            max_conflict_attempts,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the pool size or the attempt
    /// bound is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_max_size == 0 {
            return Err(ConfigError::invalid(POOL_SIZE_VAR, "0", "must be at least 1"));
        }
        if self.max_conflict_attempts == 0 {
            return Err(ConfigError::invalid(
                MAX_CONFLICT_ATTEMPTS_VAR,
                "0",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Returns the database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no URL is configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL_VAR))
    }
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_max_size: Self::DEFAULT_POOL_MAX_SIZE,
            max_conflict_attempts: Self::DEFAULT_MAX_CONFLICT_ATTEMPTS,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    raw.trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::invalid(key, &raw, err.to_string()))
}

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    /// A variable is set to an unusable value.
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value as read.
        value: String,
        /// Why the value was refused.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.to_owned(),
            reason: reason.into(),
        }
    }
}
