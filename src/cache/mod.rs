//! Expiring caches.
//!
//! # Data Flow
//! ```text
//! write(key, value, expires_at) → expiring.rs (DashMap entry)
//! read(key)                     → stored value, expired or not
//!
//! every sweep interval:
//!     sweeper.rs → sweep each cache → evict expires_at < now
//!                → emit service(tick)
//! ```
//!
//! # Design Decisions
//! - Expiry is enforced by the sweep only: staleness is bounded by the sweep interval
//! - Expiry timestamps are absolute and only change when a key is overwritten
//! - Lifetimes too long to represent are clamped to a far-future instant
//! - Generic over the stored value so data payloads and compiled templates share one mechanism

pub mod expiring;
pub mod sweeper;

pub use expiring::{expiry_after, minutes, CacheEntry, ExpiringCache, Sweep};
pub use sweeper::{CacheSweeper, SweepReport};
