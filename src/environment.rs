//! The environment: loads ranked property sources into one nested store and serves
//! lookups and binding from it.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::binder::{Bind, BindError, Binder, FromValue};
use crate::config::{
    ConfigError, DecoderRegistry, LoadReport, Loader, NestedStore, Options, PropertySource,
    SourceResolver, SuccessThreshold, Table, Value, DEFAULT_PROFILE,
};
use crate::event::{
    Event, EventBus, POST_LOAD_ENVIRONMENT_TOPIC, PREPARE_ENVIRONMENT_TOPIC,
    PRE_LOAD_ENVIRONMENT_TOPIC,
};
use crate::Error;

/// Well-known profile names.
pub mod profiles {
    pub const DEV: &str = "dev";
    pub const TEST: &str = "test";
    pub const PROD: &str = "prod";
    pub const STAGING: &str = "staging";
    pub const INTEGRATION: &str = "integration";
    pub const DEMO: &str = "demo";
    pub const PRE: &str = "pre";
    pub const TRAINING: &str = "training";
    pub const BACKUP: &str = "backup";
    pub const DEFAULT: &str = super::DEFAULT_PROFILE;
}

/// Merged configuration from every property source, queried by dotted path.
///
/// Built once with [`start`](Self::start); [`refresh`](Self::refresh) destroys and starts
/// again. The store is not synchronized: share an `Environment` across threads only
/// behind a lock if it may be refreshed while being read.
///
/// ## Example
///
/// ```no_run
/// use nemo::{Environment, Options};
///
/// let mut env = Environment::new(Vec::new());
/// env.start(Options::new().with_search_paths(["configs"]).with_profiles(["dev"]))?;
///
/// let port = env.get_as::<u16>("server.port")?.unwrap_or(8080);
/// # Ok::<(), nemo::Error>(())
/// ```
#[derive(Debug)]
pub struct Environment {
    store: NestedStore,
    initial_sources: Vec<PropertySource>,
    sources: Vec<PropertySource>,
    profiles: Vec<String>,
    threshold: SuccessThreshold,
    binder: Binder,
    decoders: Arc<DecoderRegistry>,
    bus: Arc<EventBus>,
}

impl Environment {
    /// An empty environment with the default decoders and its own event bus.
    /// `sources` are loaded on every start, alongside the ones resolved from options.
    pub fn new(sources: Vec<PropertySource>) -> Self {
        Self::builder().with_sources(sources).build()
    }

    /// Starts a builder for injecting a decoder registry, event bus or binder.
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::default()
    }

    /// Resolves `options`, announces each phase on the event bus and loads every source.
    ///
    /// Validation errors and threshold failures are returned; notification failures are
    /// logged and ignored.
    pub fn start(&mut self, options: Options) -> Result<LoadReport, Error> {
        let resolver = SourceResolver::new(&options)?;
        self.notify(PREPARE_ENVIRONMENT_TOPIC);

        let resolution = resolver.resolve(&self.bus);
        self.threshold = options.threshold();
        self.profiles = resolution.profiles;
        self.sources = self.initial_sources.clone();
        self.sources.extend(resolution.sources);

        self.notify(PRE_LOAD_ENVIRONMENT_TOPIC);

        let report = Loader::new(&self.decoders, self.threshold)
            .load(&mut self.store, &mut self.sources)?;

        self.notify(POST_LOAD_ENVIRONMENT_TOPIC);
        Ok(report)
    }

    /// Clears the store, the resolved sources and the active profiles.
    pub fn destroy(&mut self) {
        self.store.clear();
        self.sources.clear();
        self.profiles.clear();
        self.threshold = SuccessThreshold::default();
    }

    /// Destroys the environment, then starts it again with `options`.
    pub fn refresh(&mut self, options: Options) -> Result<LoadReport, Error> {
        self.destroy();
        self.start(options)
    }

    /// Merges `map` over the current store.
    pub fn load_map(&mut self, map: Table) {
        if map.is_empty() {
            return;
        }
        self.store.merge(map);
    }

    /// Loads `sources` in the given order, stopping at the first failure.
    pub fn load_property_sources(
        &mut self,
        sources: &[PropertySource],
    ) -> Result<(), ConfigError> {
        let loader = Loader::new(&self.decoders, SuccessThreshold::All);
        for source in sources {
            if let Some(table) = loader.read(source)? {
                self.store.merge(table);
            }
        }
        Ok(())
    }

    /// Looks up the value at a dotted `path`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.store.get(path)
    }

    /// Same lookup as [`get`](Self::get).
    pub fn nested_get(&self, path: &str) -> Option<&Value> {
        self.store.get(path)
    }

    /// Looks up `path` and coerces it; `Ok(None)` when absent.
    pub fn get_as<T: FromValue>(&self, path: &str) -> Result<Option<T>, BindError> {
        match self.store.get(path) {
            Some(value) if !value.is_null() => T::from_value(value, path).map(Some),
            _ => Ok(None),
        }
    }

    /// Assigns `value` at a dotted `path`, creating intermediate tables.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        self.store.set(path, value);
    }

    /// Same assignment as [`set`](Self::set).
    pub fn nested_set(&mut self, path: &str, value: impl Into<Value>) {
        self.store.set(path, value);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.store.contains(path)
    }

    /// Profiles of the last start; `default` when none were given.
    pub fn active_profiles(&self) -> &[String] {
        &self.profiles
    }

    /// Active profiles joined with `,`.
    pub fn active_profiles_string(&self) -> String {
        self.profiles.join(",")
    }

    pub fn is_default_profile_active(&self) -> bool {
        self.profiles.iter().any(|p| p == DEFAULT_PROFILE)
    }

    /// Binds `target`'s declared fields from the values under `prefix`.
    pub fn bind<T: Bind + ?Sized>(&self, prefix: &str, target: &mut T) -> Result<(), BindError> {
        self.binder.bind(prefix, target, &self.store)
    }

    /// Deserializes the subtree under `prefix` (the whole store when blank) with serde.
    pub fn extract<T: DeserializeOwned>(&self, prefix: &str) -> Result<T, BindError> {
        let prefix = prefix.trim().trim_end_matches('.');
        let subtree = if prefix.is_empty() {
            Value::Table(self.store.as_table().clone())
        } else {
            self.store
                .get(prefix)
                .cloned()
                .unwrap_or_else(|| Value::Table(Table::new()))
        };
        let value = subtree
            .into_toml()
            .unwrap_or_else(|| toml::Value::Table(toml::Table::new()));
        value.try_into().map_err(BindError::Extract)
    }

    pub fn store(&self) -> &NestedStore {
        &self.store
    }

    /// Sources of the last start, in load order.
    pub fn sources(&self) -> &[PropertySource] {
        &self.sources
    }

    pub fn threshold(&self) -> SuccessThreshold {
        self.threshold
    }

    /// The bus lifecycle events are published on.
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn decoders(&self) -> &Arc<DecoderRegistry> {
        &self.decoders
    }

    fn notify(&self, topic: &str) {
        debug!(topic, "environment event");
        if let Err(e) = self.bus.publish(topic, &Event::Environment(self)) {
            warn!(topic, error = %e, "environment notification failed");
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Builder for an [`Environment`] with shared collaborators.
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct EnvironmentBuilder {
    sources: Vec<PropertySource>,
    decoders: Option<Arc<DecoderRegistry>>,
    bus: Option<Arc<EventBus>>,
    binder: Option<Binder>,
}

impl EnvironmentBuilder {
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = PropertySource>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn with_decoders(mut self, decoders: Arc<DecoderRegistry>) -> Self {
        self.decoders = Some(decoders);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_binder(mut self, binder: Binder) -> Self {
        self.binder = Some(binder);
        self
    }

    pub fn build(self) -> Environment {
        Environment {
            store: NestedStore::new(),
            initial_sources: self.sources,
            sources: Vec::new(),
            profiles: Vec::new(),
            threshold: SuccessThreshold::default(),
            binder: self.binder.unwrap_or_default(),
            decoders: self.decoders.unwrap_or_default(),
            bus: self.bus.unwrap_or_default(),
        }
    }
}
