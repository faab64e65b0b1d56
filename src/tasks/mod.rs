//! Coordinated asynchronous tasks.
//!
//! # Data Flow
//! ```text
//! task(name, future)                → started by complete()
//! wait(name, waiting_for, future)   → started when `waiting_for` finishes
//! complete(callback)
//!     → begin(name), spawn on a JoinSet
//!     → on finish: end(name), start its waiters
//!     → nothing left to start: callback, complete event, TaskReport
//! ```

pub mod group;

pub use group::{TaskEvent, TaskGroup, TaskReport};
