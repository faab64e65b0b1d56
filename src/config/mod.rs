//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FrameworkConfig (validated, immutable)
//!     → owned by the Framework context
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the framework is constructed
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::CacheConfig;
pub use schema::FrameworkConfig;
pub use schema::NavigationConfig;
pub use schema::ObservabilityConfig;
pub use schema::TransportConfig;
