//! Service configuration
//!
//! Values come from `ACCOUNTS_*` environment variables layered over the
//! defaults below, e.g. `ACCOUNTS_BIND_ADDRESS=127.0.0.1:8080` or
//! `ACCOUNTS_STORE=memory`. Database settings are read separately by
//! [`common::database::DatabaseConfig::from_env`].

use chrono::TimeDelta;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::{guard::DevicePolicy, rate_limiter::RateLimiterConfig};

/// Which player store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    pub store: StoreBackend,
    /// Live devices allowed per account
    pub max_devices: usize,
    pub session_ttl_hours: u32,
    pub recovery_token_ttl_minutes: u32,
    /// When true, a password reset also needs a token issued by `/recover`
    pub require_recovery_token: bool,
    pub max_failed_attempts: u32,
    pub failed_attempt_window_seconds: u64,
    pub ban_duration_seconds: u64,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix("ACCOUNTS").try_parsing(true))
    }

    /// Load settings from an explicit environment source
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("store", "postgres")?
            .set_default("max_devices", 3_i64)?
            .set_default("session_ttl_hours", 24_i64)?
            .set_default("recovery_token_ttl_minutes", 15_i64)?
            .set_default("require_recovery_token", false)?
            .set_default("max_failed_attempts", 5_i64)?
            .set_default("failed_attempt_window_seconds", 300_i64)?
            .set_default("ban_duration_seconds", 3600_i64)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_devices == 0 {
            return Err(ConfigError::Message(
                "max_devices must be at least 1".to_string(),
            ));
        }
        if self.session_ttl_hours == 0 {
            return Err(ConfigError::Message(
                "session_ttl_hours must be at least 1".to_string(),
            ));
        }
        if self.max_failed_attempts == 0 {
            return Err(ConfigError::Message(
                "max_failed_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn device_policy(&self) -> DevicePolicy {
        DevicePolicy {
            max_devices: self.max_devices,
            session_ttl: TimeDelta::hours(i64::from(self.session_ttl_hours)),
        }
    }

    pub fn recovery_token_ttl(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.recovery_token_ttl_minutes))
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_attempts: self.max_failed_attempts,
            window_seconds: self.failed_attempt_window_seconds,
            ban_duration_seconds: self.ban_duration_seconds,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            store: StoreBackend::Postgres,
            max_devices: 3,
            session_ttl_hours: 24,
            recovery_token_ttl_minutes: 15,
            require_recovery_token: false,
            max_failed_attempts: 5,
            failed_attempt_window_seconds: 300,
            ban_duration_seconds: 3600,
        }
    }
}
