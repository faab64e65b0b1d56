//! Application context and data API.
//!
//! # Data Flow
//! ```text
//! host application
//!     → context.rs (Framework: registration, navigation, rendering, validation)
//!     → data.rs (get / post through UrlLocks, data cache and Transport)
//! ```

pub mod context;
pub mod data;

pub use context::{Framework, FrameworkError};
pub use data::CacheDirective;
