//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per navigation)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings
//! - Each dispatch carries a navigation id in its span

pub mod logging;
pub mod metrics;
