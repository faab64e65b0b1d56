//! Data API transport.
//!
//! # Data Flow
//! ```text
//! Framework::get / post
//!     → locks.rs (reject if the URL is in flight)
//!     → client.rs (Transport::execute, reqwest by default)
//!     → JSON value or NetworkError
//! ```

pub mod client;
pub mod locks;

pub use client::{HttpTransport, Method, NetworkError, Transport, TransportRequest};
pub use locks::{UrlLockGuard, UrlLocks};
