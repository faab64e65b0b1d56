//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     route("/user/{id}", handler, partials, invoke_once)
//!     → matcher.rs (parse pattern, priority, parameter positions)
//!     → router.rs (append, stable sort by priority)
//!
//! Lookup:
//!     dispatched path
//!     → matcher.rs (normalize into tokens)
//!     → router.rs (scan table in priority order)
//!     → RouteMatch { routes, not_found }
//! ```
//!
//! # Design Decisions
//! - Every matching route is returned, not just the first
//! - Most specific routes first (priority ordering)
//! - A catch-all match alone still reports not-found

pub mod matcher;
pub mod router;

pub use matcher::{InvalidRouteError, Segment};
pub use router::{HandlerResult, PartialHandler, Route, RouteHandler, RouteMatch, RouteTable};
