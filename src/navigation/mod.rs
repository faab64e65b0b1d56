//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! location / redirect / back / refresh
//!     → PendingNavigation (queued while a dispatch runs)
//!     → dispatcher.rs (state update, location event)
//!     → RouteTable::find
//!     → partials + handlers in priority order
//!     → error / status events, error log
//! ```

pub mod dispatcher;
pub mod query;
pub mod state;

pub use dispatcher::{
    Callback, DispatchReport, Dispatcher, Navigation, PendingNavigation, RouteExecutionError,
};
pub use query::{QueryParams, QueryValue};
pub use state::{BoundedLog, DispatchPhase, ErrorRecord, NavigationState};
