//! Lifecycle of background tasks.
//!
//! # Data Flow
//! ```text
//! Shutdown::start_sweeper → CacheSweeper::run (until signalled)
//! Shutdown::stop → broadcast → await tasks (abort after deadline)
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
