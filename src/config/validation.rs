//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and capacities > 0, cache lifetimes bounded)
//! - Check the transport base URL and log level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FrameworkConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::FrameworkConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Longest accepted cache lifetime: 100 years.
pub const MAX_EXPIRE_MINUTES: u64 = 100 * 365 * 24 * 60;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must not exceed {max}")]
    TooLarge { field: &'static str, max: u64 },

    #[error("transport.base_url '{url}' is not a valid URL: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

pub fn validate_config(config: &FrameworkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let positive = [
        ("cache.sweep_interval_secs", config.cache.sweep_interval_secs),
        ("cache.template_expire_minutes", config.cache.template_expire_minutes),
        ("navigation.history_capacity", config.navigation.history_capacity as u64),
        ("navigation.error_log_capacity", config.navigation.error_log_capacity as u64),
        ("transport.timeout_secs", config.transport.timeout_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let lifetimes = [
        ("cache.template_expire_minutes", config.cache.template_expire_minutes),
        ("cache.default_expire_minutes", config.cache.default_expire_minutes),
    ];
    for (field, value) in lifetimes {
        if value > MAX_EXPIRE_MINUTES {
            errors.push(ValidationError::TooLarge { field, max: MAX_EXPIRE_MINUTES });
        }
    }

    if let Some(base) = &config.transport.base_url {
        if let Err(e) = Url::parse(base) {
            errors.push(ValidationError::InvalidBaseUrl {
                url: base.clone(),
                reason: e.to_string(),
            });
        }
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
