//! Framework events.
//!
//! # Data Flow
//! ```text
//! Dispatcher  → location, error, status
//! Data API    → get/post (begin, end), error
//! Sweeper     → service(tick)
//! Framework   → ready
//!     → bus.rs (per-kind listener lists)
//!     → host application listeners
//! ```
//!
//! # Design Decisions
//! - One enum of event kinds, each with a fixed payload
//! - Explicit `Subscription` handle for unsubscription
//! - Delivery is synchronous, in subscription order

pub mod bus;

pub use bus::{Event, EventBus, EventKind, RequestPhase, Subscription};
