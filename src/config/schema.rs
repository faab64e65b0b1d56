//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, and
//! every section has defaults so an empty file is a valid configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the framework.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Cache expiry and sweep settings.
    pub cache: CacheConfig,

    /// Navigation history and error log settings.
    pub navigation: NavigationConfig,

    /// Data API transport settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Resource strings: namespace → key → text.
    pub resources: HashMap<String, HashMap<String, String>>,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds between sweeps (bounds read staleness).
    pub sweep_interval_secs: u64,

    /// Lifetime of a compiled template, in minutes.
    pub template_expire_minutes: u64,

    /// Lifetime of a cached response when the caller gives none, in minutes.
    pub default_expire_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            template_expire_minutes: 1440,
            default_expire_minutes: 5,
        }
    }
}

/// Navigation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NavigationConfig {
    /// Maximum history entries; the oldest is evicted past this.
    pub history_capacity: usize,

    /// Maximum error log entries.
    pub error_log_capacity: usize,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            error_log_capacity: 100,
        }
    }
}

/// Transport configuration for the data API.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL that relative request URLs are joined onto.
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
