//! Route table and lookup.
//!
//! # Responsibilities
//! - Store registered routes with their priority and parameter positions
//! - Keep the table ordered by priority after every registration
//! - Collect every route matching a dispatched path
//! - Decide the not-found signal for a lookup
//!
//! # Design Decisions
//! - Stable sort, so equal priorities keep insertion order
//! - Routes are shared as `Arc<Route>` so lookups never hold the table lock
//!   while callbacks run
//! - Invoke-once routes are claimed atomically during lookup

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::app::Framework;
use crate::routing::matcher::{self, InvalidRouteError, Segment, ROOT};

/// Result of a route handler or partial callback.
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Route handler, called with the framework context and positional parameters.
pub type RouteHandler = Arc<dyn Fn(&Framework, &[String]) -> HandlerResult + Send + Sync>;

/// Named partial callback, run before the handler of every route that lists it.
pub type PartialHandler = Arc<dyn Fn(&Framework) -> HandlerResult + Send + Sync>;

/// A registered route.
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    handler: RouteHandler,
    partials: Vec<String>,
    priority: i32,
    param_positions: Vec<usize>,
    invoke_once: bool,
    invocations: AtomicU32,
}

impl Route {
    /// Parse the pattern and compute priority metadata.
    pub fn new(
        pattern: &str,
        handler: RouteHandler,
        partials: Vec<String>,
        invoke_once: bool,
    ) -> Result<Self, InvalidRouteError> {
        let pattern = pattern.trim();
        let segments = matcher::parse_pattern(pattern)?;
        let priority = matcher::priority(pattern, &segments);
        let param_positions = matcher::param_positions(&segments);

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            handler,
            partials,
            priority,
            param_positions,
            invoke_once,
            invocations: AtomicU32::new(0),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn partials(&self) -> &[String] {
        &self.partials
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn param_positions(&self) -> &[usize] {
        &self.param_positions
    }

    pub fn invoke_once(&self) -> bool {
        self.invoke_once
    }

    /// How many lookups have selected this route.
    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn has_catch_all(&self) -> bool {
        self.segments.iter().any(Segment::is_catch_all)
    }

    pub(crate) fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    /// Extract positional parameters from normalized request tokens.
    /// The root sentinel becomes an empty string.
    pub fn params(&self, tokens: &[String]) -> Vec<String> {
        self.param_positions
            .iter()
            .map(|&i| match tokens.get(i).map(String::as_str) {
                Some(ROOT) | None => String::new(),
                Some(value) => value.to_string(),
            })
            .collect()
    }

    /// Claim this route for one invocation. Invoke-once routes succeed only the first time.
    fn claim(&self) -> bool {
        if self.invoke_once {
            self.invocations
                .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        } else {
            self.invocations.fetch_add(1, Ordering::Relaxed);
            true
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("priority", &self.priority)
            .field("param_positions", &self.param_positions)
            .field("partials", &self.partials)
            .field("invoke_once", &self.invoke_once)
            .field("invocations", &self.invocations())
            .finish()
    }
}

/// Routes matching one path, most specific first.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// Normalized request tokens.
    pub tokens: Vec<String>,
    /// Matched routes in table order.
    pub routes: Vec<Arc<Route>>,
    /// True unless a matched route has no catch-all segment.
    pub not_found: bool,
}

/// Priority-ordered route table.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route and re-sort the table.
    pub fn register(
        &mut self,
        pattern: &str,
        handler: RouteHandler,
        partials: Vec<String>,
        invoke_once: bool,
    ) -> Result<Arc<Route>, InvalidRouteError> {
        let route = Arc::new(Route::new(pattern, handler, partials, invoke_once)?);

        tracing::debug!(
            pattern = %route.pattern,
            priority = route.priority,
            params = route.param_positions.len(),
            invoke_once,
            "Route registered"
        );

        self.routes.push(route.clone());
        // sort_by is stable: equal priorities stay in insertion order
        self.routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(route)
    }

    /// Find every route matching `path`.
    pub fn find(&self, path: &str) -> RouteMatch {
        let tokens = matcher::normalize(path);
        let mut routes = Vec::new();
        let mut not_found = true;

        for route in &self.routes {
            if !matcher::matches(&tokens, &route.segments) {
                continue;
            }
            if !route.claim() {
                tracing::trace!(pattern = %route.pattern, "Invoke-once route already used");
                continue;
            }
            if !route.has_catch_all() {
                not_found = false;
            }
            routes.push(route.clone());
        }

        tracing::debug!(path = %path, matched = routes.len(), not_found, "Route lookup");

        RouteMatch {
            tokens,
            routes,
            not_found,
        }
    }

    /// Registered routes in priority order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> RouteHandler {
        Arc::new(|_: &Framework, _: &[String]| -> HandlerResult { Ok(()) })
    }

    fn table(patterns: &[&str]) -> RouteTable {
        let mut table = RouteTable::new();
        for pattern in patterns {
            table.register(pattern, noop(), Vec::new(), false).unwrap();
        }
        table
    }

    fn patterns(m: &RouteMatch) -> Vec<&str> {
        m.routes.iter().map(|r| r.pattern()).collect()
    }

    #[test]
    fn test_table_sorted_by_priority_stable() {
        let table = table(&["/a", "/b/{id}", "/*", "/c/d", "/e", "/f/{x}/{y}"]);
        let order: Vec<(&str, i32)> = table.routes().map(|r| (r.pattern(), r.priority())).collect();
        assert_eq!(
            order,
            vec![
                ("/*", 11),
                ("/c/d", 2),
                ("/a", 1),
                ("/b/{id}", 1),
                ("/e", 1),
                ("/f/{x}/{y}", 1),
            ]
        );
        for pair in order.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_literal_beats_param() {
        let table = table(&["/user/{id}", "/user/edit"]);
        let m = table.find("/user/edit");
        assert_eq!(patterns(&m), vec!["/user/edit", "/user/{id}"]);
        assert!(!m.not_found);
    }

    #[test]
    fn test_params_extracted_by_position() {
        let table = table(&["/{lang}/blog/{slug}"]);
        let m = table.find("/EN/blog/Hello-World/");
        assert_eq!(m.routes[0].params(&m.tokens), vec!["en", "hello-world"]);
    }

    #[test]
    fn test_root_param_value_is_empty() {
        let mut table = RouteTable::new();
        let route = table.register("/*", noop(), Vec::new(), false).unwrap();
        let m = table.find("/");
        assert_eq!(m.routes.len(), 1);
        assert!(route.params(&m.tokens).is_empty());

        let param_route = Route::new("/{page}", noop(), Vec::new(), false).unwrap();
        assert_eq!(param_route.params(&["/".to_string()]), vec![String::new()]);
    }

    #[test]
    fn test_catch_all_alone_is_not_found() {
        let table = table(&["/*", "/about"]);
        let m = table.find("/missing");
        assert_eq!(patterns(&m), vec!["/*"]);
        assert!(m.not_found);

        let m = table.find("/about");
        assert_eq!(patterns(&m), vec!["/*", "/about"]);
        assert!(!m.not_found);
    }

    #[test]
    fn test_short_request_fills_missing_param_with_empty() {
        let table = table(&["/user/{id}"]);
        let m = table.find("/user");
        assert_eq!(patterns(&m), vec!["/user/{id}"]);
        assert!(!m.not_found);
        assert_eq!(m.routes[0].params(&m.tokens), vec![String::new()]);
    }

    #[test]
    fn test_no_match() {
        let table = table(&["/about"]);
        let m = table.find("/contact");
        assert!(m.routes.is_empty());
        assert!(m.not_found);
    }

    #[test]
    fn test_invoke_once() {
        let mut table = RouteTable::new();
        let route = table.register("/welcome", noop(), Vec::new(), true).unwrap();

        assert_eq!(table.find("/welcome").routes.len(), 1);
        assert_eq!(route.invocations(), 1);

        let second = table.find("/welcome");
        assert!(second.routes.is_empty());
        assert!(second.not_found);
        assert_eq!(route.invocations(), 1);
    }

    #[test]
    fn test_register_rejects_invalid_pattern() {
        let mut table = RouteTable::new();
        let err = table.register("/user/{id", noop(), Vec::new(), false).unwrap_err();
        assert!(matches!(err, InvalidRouteError::UnbalancedBraces { .. }));
        assert!(table.is_empty());
    }
}
