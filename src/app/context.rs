//! The framework context.
//!
//! # Responsibilities
//! - Own the route table, partials, templates, caches and navigation state
//! - Expose registration, navigation, rendering and validation entry points
//! - Wire the event bus, cache sweeper and data transport together
//!
//! # Design Decisions
//! - One explicit context passed to every callback instead of a global
//! - Interior mutability (`parking_lot` locks, `DashMap`) so the context is `Send + Sync`
//! - Locks are released before any user callback or listener runs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::cache::{CacheSweeper, ExpiringCache, SweepReport};
use crate::config::validation::validate_config;
use crate::config::{ConfigError, FrameworkConfig};
use crate::events::{Event, EventBus, EventKind, Subscription};
use crate::navigation::{
    DispatchPhase, Dispatcher, ErrorRecord, Navigation, PendingNavigation, QueryParams,
};
use crate::observability::metrics;
use crate::routing::{
    HandlerResult, InvalidRouteError, PartialHandler, Route, RouteMatch, RouteTable,
};
use crate::template::{compile, CompiledTemplate, TemplateError};
use crate::transport::{HttpTransport, NetworkError, Transport, UrlLocks};
use crate::validation::{
    self, parse_properties, MessageSource, ResourceCatalog, ValidationFailure, ValidationOutcome,
    Validator,
};

const TEMPLATE_CACHE: &str = "templates";
const DATA_CACHE: &str = "data";

fn template_key(name: &str) -> String {
    format!("template.{}", name)
}

/// Failure to construct a [`Framework`].
#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] NetworkError),
}

/// Application context for routing, rendering and data access.
pub struct Framework {
    config: FrameworkConfig,
    routes: RwLock<RouteTable>,
    partials: RwLock<HashMap<String, PartialHandler>>,
    templates: RwLock<HashMap<String, String>>,
    pub(crate) template_cache: ExpiringCache<Arc<CompiledTemplate>>,
    pub(crate) data_cache: ExpiringCache<Value>,
    events: Arc<EventBus>,
    pub(crate) dispatcher: Dispatcher,
    resources: ResourceCatalog,
    validator: RwLock<Option<Validator>>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) locks: UrlLocks,
    sweeper: CacheSweeper,
    ready: AtomicBool,
}

impl Framework {
    /// Build a context using the HTTP transport described by `config.transport`.
    pub fn new(config: FrameworkConfig) -> Result<Self, FrameworkError> {
        let transport = HttpTransport::new(&config.transport)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build a context with a custom transport.
    pub fn with_transport(
        config: FrameworkConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, FrameworkError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let events = Arc::new(EventBus::new());
        let template_cache = ExpiringCache::new(TEMPLATE_CACHE);
        let data_cache = ExpiringCache::new(DATA_CACHE);
        let sweeper = CacheSweeper::new(
            events.clone(),
            Duration::from_secs(config.cache.sweep_interval_secs),
        )
        .with_cache(Arc::new(template_cache.clone()))
        .with_cache(Arc::new(data_cache.clone()));

        tracing::debug!(
            resources = config.resources.len(),
            sweep_interval_secs = config.cache.sweep_interval_secs,
            "Framework initialized"
        );

        Ok(Self {
            routes: RwLock::new(RouteTable::new()),
            partials: RwLock::new(HashMap::new()),
            templates: RwLock::new(HashMap::new()),
            template_cache,
            data_cache,
            dispatcher: Dispatcher::new(&config.navigation),
            resources: ResourceCatalog::from_map(config.resources.clone()),
            validator: RwLock::new(None),
            transport,
            locks: UrlLocks::new(),
            sweeper,
            ready: AtomicBool::new(false),
            events,
            config,
        })
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    // --- Registration ---

    /// Register a route without partials.
    pub fn route<F>(&self, pattern: &str, handler: F) -> Result<Arc<Route>, InvalidRouteError>
    where
        F: Fn(&Framework, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        self.route_with(pattern, handler, &[], false)
    }

    /// Register a route with partials run before the handler, optionally only once.
    pub fn route_with<F>(
        &self,
        pattern: &str,
        handler: F,
        partials: &[&str],
        invoke_once: bool,
    ) -> Result<Arc<Route>, InvalidRouteError>
    where
        F: Fn(&Framework, &[String]) -> HandlerResult + Send + Sync + 'static,
    {
        let partials = partials.iter().map(|p| p.to_string()).collect();
        self.routes
            .write()
            .register(pattern, Arc::new(handler), partials, invoke_once)
    }

    /// Register or replace a named partial.
    pub fn partial<F>(&self, name: &str, callback: F)
    where
        F: Fn(&Framework) -> HandlerResult + Send + Sync + 'static,
    {
        self.partials
            .write()
            .insert(name.to_string(), Arc::new(callback));
    }

    /// Register or replace template source, dropping any cached compilation.
    pub fn template(&self, name: &str, source: impl Into<String>) {
        self.templates.write().insert(name.to_string(), source.into());
        self.template_cache.remove(&template_key(name));
    }

    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.routes.read().routes().cloned().collect()
    }

    pub(crate) fn find_routes(&self, path: &str) -> RouteMatch {
        self.routes.read().find(path)
    }

    pub(crate) fn partial_handler(&self, name: &str) -> Option<PartialHandler> {
        self.partials.read().get(name).cloned()
    }

    // --- Rendering ---

    /// Compiled template for `name`, through the template cache.
    pub fn compiled(&self, name: &str) -> Result<Arc<CompiledTemplate>, TemplateError> {
        let key = template_key(name);
        if let Some(hit) = self.template_cache.read(&key) {
            return Ok(hit);
        }

        let source = self
            .templates
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotRegistered(name.to_string()))?;
        self.compile_into_cache(key, &source)
    }

    fn compile_into_cache(
        &self,
        key: String,
        source: &str,
    ) -> Result<Arc<CompiledTemplate>, TemplateError> {
        let compiled = match compile(source) {
            Ok(compiled) => Arc::new(compiled),
            Err(e) => {
                metrics::record_template_compile("error");
                return Err(e);
            }
        };
        metrics::record_template_compile("ok");

        let ttl = crate::cache::minutes(self.config.cache.template_expire_minutes);
        Ok(self.template_cache.write_for(key, compiled, ttl))
    }

    /// Render a registered template, or inline source when `name` contains `{`.
    /// Wrapper regions render against the current repository.
    pub fn render(&self, name: &str, model: &Value) -> String {
        let repository = self.repository();
        if name.contains('{') {
            return self.render_inline(name, model, Some(&repository));
        }
        self.render_with(name, model, Some(&repository))
    }

    /// Render a registered template with an explicit repository model.
    /// Failures are reported through the error event and render as `""`.
    pub fn render_with(&self, name: &str, model: &Value, repository: Option<&Value>) -> String {
        match self.compiled(name) {
            Ok(template) => template.render(model, repository),
            Err(e) => {
                self.report_error(&format!("template '{}': {}", name, e));
                String::new()
            }
        }
    }

    /// Render template source directly, cached by its text.
    pub fn render_inline(&self, source: &str, model: &Value, repository: Option<&Value>) -> String {
        let key = format!("inline.{}", source);
        let compiled = match self.template_cache.read(&key) {
            Some(hit) => Ok(hit),
            None => self.compile_into_cache(key, source),
        };
        match compiled {
            Ok(template) => template.render(model, repository),
            Err(e) => {
                self.report_error(&format!("inline template: {}", e));
                String::new()
            }
        }
    }

    /// Log, record and emit an error against the current URL.
    pub(crate) fn report_error(&self, message: &str) {
        let url = self.current_url();
        tracing::warn!(url = %url, error = %message, "Error reported");
        self.dispatcher.record_error(&url, message);
        self.events.emit(&Event::Error {
            message: message.to_string(),
            url,
        });
    }

    // --- Navigation ---

    pub fn location(&self, url: &str) -> Navigation {
        self.dispatcher.submit(self, PendingNavigation::new(url, false))
    }

    /// Navigate without recording the current URL in history.
    pub fn location_refresh(&self, url: &str) -> Navigation {
        self.dispatcher.submit(self, PendingNavigation::new(url, true))
    }

    /// Navigate, handing `model` to the next dispatch as its repository.
    pub fn redirect(&self, url: &str, model: Value) -> Navigation {
        self.dispatcher
            .submit(self, PendingNavigation::new(url, false).with_repository(model))
    }

    /// Go to the newest history entry. Returns `None` when history is empty.
    pub fn back(&self) -> Option<Navigation> {
        let url = self.dispatcher.pop_history()?;
        Some(self.location_refresh(&url))
    }

    /// Re-dispatch the current URL.
    pub fn refresh(&self) -> Navigation {
        let url = self.current_url();
        self.location_refresh(&url)
    }

    pub fn current_url(&self) -> String {
        self.dispatcher.current_url()
    }

    pub fn query(&self) -> QueryParams {
        self.dispatcher.query()
    }

    pub fn repository(&self) -> Value {
        self.dispatcher.repository()
    }

    pub fn set_repository(&self, repository: Value) {
        self.dispatcher.set_repository(repository);
    }

    pub fn history(&self) -> Vec<String> {
        self.dispatcher.history()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.dispatcher.errors()
    }

    pub fn phase(&self) -> DispatchPhase {
        self.dispatcher.phase()
    }

    // --- Resources & validation ---

    /// Resource text, or `""` when missing.
    pub fn resource(&self, namespace: &str, key: &str) -> String {
        self.resources.get(namespace, key)
    }

    pub fn set_resource(&self, namespace: &str, key: &str, text: impl Into<String>) {
        self.resources.set(namespace, key, text);
    }

    /// Install the validator used by [`Framework::validate`].
    pub fn on_validation<F>(&self, validator: F)
    where
        F: Fn(&str, &Value) -> ValidationOutcome + Send + Sync + 'static,
    {
        *self.validator.write() = Some(Arc::new(validator));
    }

    /// Validate the comma-separated `properties` of `model`.
    /// Without a validator every property is skipped.
    pub fn validate(
        &self,
        model: &Value,
        properties: &str,
        namespace: Option<&str>,
        prefix: &str,
    ) -> Vec<ValidationFailure> {
        let Some(validator) = self.validator.read().clone() else {
            return Vec::new();
        };
        let messages = MessageSource {
            resources: &self.resources,
            namespace,
            prefix,
        };
        validation::validate(model, &parse_properties(properties), validator.as_ref(), messages)
    }

    // --- Events & lifecycle ---

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, listener)
    }

    pub fn off(&self, subscription: &Subscription) -> bool {
        self.events.unsubscribe(subscription)
    }

    /// Emit `ready` once. Returns false if already ready.
    pub fn ready(&self) -> bool {
        if self.ready.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::info!(routes = self.routes.read().len(), "Framework ready");
        self.events.emit(&Event::Ready);
        true
    }

    /// Run one cache sweep now.
    pub fn sweep(&self) -> SweepReport {
        self.sweeper.tick()
    }

    pub fn sweeper(&self) -> &CacheSweeper {
        &self.sweeper
    }

    /// Start the periodic sweeper on the current tokio runtime.
    pub fn spawn_sweeper(&self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.sweeper.clone().run(shutdown))
    }

    pub fn template_cache(&self) -> &ExpiringCache<Arc<CompiledTemplate>> {
        &self.template_cache
    }

    pub fn data_cache(&self) -> &ExpiringCache<Value> {
        &self.data_cache
    }
}

impl std::fmt::Debug for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Framework")
            .field("routes", &self.routes.read().len())
            .field("partials", &self.partials.read().len())
            .field("templates", &self.templates.read().len())
            .field("url", &self.current_url())
            .field("ready", &self.ready.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportRequest;
    use futures_util::future::BoxFuture;
    use parking_lot::Mutex;
    use serde_json::json;

    struct Offline;

    impl Transport for Offline {
        fn execute(&self, _: TransportRequest) -> BoxFuture<'_, Result<Value, NetworkError>> {
            Box::pin(async { Err(NetworkError::Transport("offline".into())) })
        }
    }

    fn framework() -> Framework {
        Framework::with_transport(FrameworkConfig::default(), Arc::new(Offline)).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = FrameworkConfig::default();
        config.cache.sweep_interval_secs = 0;
        let err = Framework::with_transport(config, Arc::new(Offline)).unwrap_err();
        assert!(matches!(err, FrameworkError::Config(ConfigError::Validation(_))));
    }

    #[test]
    fn test_longest_template_lifetime_renders() {
        let mut config = FrameworkConfig::default();
        config.cache.template_expire_minutes = crate::config::validation::MAX_EXPIRE_MINUTES;
        let fw = Framework::with_transport(config, Arc::new(Offline)).unwrap();

        fw.template("greet", "Hi {name}");
        assert_eq!(fw.render("greet", &json!({"name": "Ann"})), "Hi Ann");
        assert_eq!(fw.sweep().evicted, 0);

        let mut config = FrameworkConfig::default();
        config.cache.template_expire_minutes = u64::MAX / 60;
        assert!(Framework::with_transport(config, Arc::new(Offline)).is_err());
    }

    #[test]
    fn test_template_cached_and_invalidated() {
        let fw = framework();
        fw.template("greet", "Hi {name}");
        assert_eq!(fw.render("greet", &json!({"name": "Ann"})), "Hi Ann");
        assert!(fw.template_cache().contains("template.greet"));

        fw.template("greet", "Bye {name}");
        assert!(!fw.template_cache().contains("template.greet"));
        assert_eq!(fw.render("greet", &json!({"name": "Ann"})), "Bye Ann");
    }

    #[test]
    fn test_render_failure_emits_error() {
        let fw = framework();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        fw.on(EventKind::Error, move |e| s.lock().push(e.clone()));

        assert_eq!(fw.render("missing", &json!({})), "");
        assert_eq!(fw.render("{a..b}", &json!({})), "");
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(fw.errors().len(), 2);
    }

    #[test]
    fn test_inline_render_by_source() {
        let fw = framework();
        assert_eq!(fw.render("<b>{}</b>", &json!(["x", "y"])), "<b>x</b><b>y</b>");
        assert!(fw.template_cache().contains("inline.<b>{}</b>"));
    }

    #[test]
    fn test_ready_emits_once() {
        let fw = framework();
        let count = Arc::new(Mutex::new(0));
        let c = count.clone();
        fw.on(EventKind::Ready, move |_| *c.lock() += 1);
        assert!(fw.ready());
        assert!(!fw.ready());
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_validate_with_resources() {
        let fw = framework();
        fw.set_resource("default", "email", "Bad e-mail.");
        assert!(fw.validate(&json!({}), "email", None, "").is_empty());

        fw.on_validation(|_, value| value.as_str().is_some_and(|s| s.contains('@')).into());
        let failures = fw.validate(&json!({"email": "nope"}), "email", None, "");
        assert_eq!(failures[0].error, "Bad e-mail.");
        assert_eq!(fw.resource("default", "email"), "Bad e-mail.");
    }

    #[test]
    fn test_sweep_evicts_expired_data() {
        let fw = framework();
        let past = std::time::SystemTime::now() - Duration::from_secs(1);
        fw.data_cache().write("stale", json!(1), past);
        let report = fw.sweep();
        assert_eq!(report, SweepReport { tick: 1, evicted: 1 });
        assert!(fw.data_cache().is_empty());
    }
}
