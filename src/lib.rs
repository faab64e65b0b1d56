//! Route dispatch, expiring cache and template rendering for single-page applications.
//!
//! # Architecture Overview
//!
//! ```text
//!   location(url) ──▶ navigation ──▶ routing ──▶ partials + handlers
//!                        │                          │
//!                        └──────── events ◀─────────┘  (location / error / status)
//!
//!   render(name) ──▶ cache (templates) ──▶ template compiler ──▶ HTML
//!
//!   get / post ──▶ transport locks ──▶ cache (data) ──▶ Transport (reqwest)
//!
//!   lifecycle ──▶ cache sweeper (tokio interval) ──▶ events (service)
//!
//!   tasks ──▶ named futures on a JoinSet, waiters started as dependencies finish
//! ```

pub mod app;
pub mod cache;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod navigation;
pub mod observability;
pub mod routing;
pub mod tasks;
pub mod template;
pub mod transport;
pub mod validation;

pub use app::{CacheDirective, Framework, FrameworkError};
pub use config::schema::FrameworkConfig;
pub use events::{Event, EventKind};
pub use lifecycle::Shutdown;
pub use navigation::Navigation;
pub use routing::HandlerResult;
pub use tasks::TaskGroup;
pub use validation::ValidationOutcome;
