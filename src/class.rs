//! Classes and the construction interceptor
//!
//! A `Class<T>` is a named declaration of a record or record-set type: its
//! `ClassConfig`, an optional initializer and an explicit parent. Every
//! instance built through `Class::construct` goes through the same steps:
//!
//! 1. a blank instance is created and seed data applied without events
//! 2. every setup plugin registered with the class's `Interceptor` runs, in
//!    registration order
//! 3. the nearest initializer runs (the class's own, else its closest
//!    ancestor's)
//!
//! # Example
//!
//! ```ignore
//! let kinds = safe_interceptors(store);
//! let todos = kinds.record_sets.extend(
//!     ClassDefinition::new("Todos").config(ClassConfig::default().with_safe("todos")),
//! );
//! let list = todos.construct(InitArgs::default())?;
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::mirror::SafeConfig;
use crate::model::{Options, Record, RecordSet};
use crate::remote::RemoteSource;

/// Per-class declaration, read once per construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Mirror instances into this slot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe: Option<SafeConfig>,
    /// Remote location used by `fetch`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Record sets only: attribute that keeps members ordered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparator: Option<String>,
}

impl ClassConfig {
    pub fn with_safe(mut self, safe: impl Into<SafeConfig>) -> Self {
        self.safe = Some(safe.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_comparator(mut self, attribute: impl Into<String>) -> Self {
        self.comparator = Some(attribute.into());
        self
    }

    /// Fill every field this config leaves unset from `parent`.
    fn inherit(self, parent: &ClassConfig) -> Self {
        Self {
            safe: self.safe.or_else(|| parent.safe.clone()),
            url: self.url.or_else(|| parent.url.clone()),
            comparator: self.comparator.or_else(|| parent.comparator.clone()),
        }
    }
}

/// Arguments passed to a construction
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitArgs {
    /// Initial attributes (records) or members (record sets)
    pub seed: Option<Value>,
    /// Free-form options handed through to plugins and initializers
    pub options: Map<String, Value>,
}

impl InitArgs {
    pub fn with_seed(seed: Value) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }
}

/// Code run against every new instance before its initializer.
pub trait SetupPlugin<T>: Send + Sync {
    fn name(&self) -> &str {
        "plugin"
    }

    fn setup(&self, instance: &mut T, config: &ClassConfig, args: &InitArgs) -> Result<()>;
}

/// `SetupPlugin` from a closure
pub struct FnPlugin<F> {
    name: String,
    f: F,
}

impl<F> FnPlugin<F> {
    pub fn new<T>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut T, &ClassConfig, &InitArgs) -> Result<()> + Send + Sync,
    {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<T, F> SetupPlugin<T> for FnPlugin<F>
where
    F: Fn(&mut T, &ClassConfig, &InitArgs) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, instance: &mut T, config: &ClassConfig, args: &InitArgs) -> Result<()> {
        (self.f)(instance, config, args)
    }
}

/// Instance initializer declared by a class
pub type Initializer<T> = Arc<dyn Fn(&mut T, &InitArgs) -> Result<()> + Send + Sync>;

/// Ordered, append-only list of setup plugins shared by every class of a base kind.
pub struct PluginRegistry<T> {
    plugins: RwLock<Vec<Arc<dyn SetupPlugin<T>>>>,
}

impl<T> PluginRegistry<T> {
    pub fn new(plugins: Vec<Arc<dyn SetupPlugin<T>>>) -> Self {
        Self {
            plugins: RwLock::new(plugins),
        }
    }

    pub fn add_plugin(&self, plugin: Arc<dyn SetupPlugin<T>>) {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every plugin against `instance`, in registration order.
    pub fn run_setup_plugins(
        &self,
        instance: &mut T,
        config: &ClassConfig,
        args: &InitArgs,
    ) -> Result<()> {
        // Snapshot so a plugin may register further plugins without deadlocking.
        let plugins = self
            .plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for plugin in plugins {
            plugin
                .setup(instance, config, args)
                .with_context(|| format!("Setup plugin {:?} failed", plugin.name()))?;
        }
        Ok(())
    }
}

/// Instances that `Class::construct` knows how to build.
pub trait Constructible: Sized {
    fn blank() -> Self;

    /// Apply construction-time data without firing events
    fn seed(&mut self, data: Value) -> Result<()>;

    /// Apply the class-level settings (url, comparator, remote source)
    fn bind_class(&mut self, config: &ClassConfig, remote: Option<Arc<dyn RemoteSource>>);
}

impl Constructible for Record {
    fn blank() -> Self {
        Record::new()
    }

    fn seed(&mut self, data: Value) -> Result<()> {
        self.set_with(data, Options::silent())
    }

    fn bind_class(&mut self, config: &ClassConfig, remote: Option<Arc<dyn RemoteSource>>) {
        if let Some(url) = &config.url {
            self.set_url(url.clone());
        }
        if let Some(remote) = remote {
            self.set_remote(remote);
        }
    }
}

impl Constructible for RecordSet {
    fn blank() -> Self {
        RecordSet::new()
    }

    fn seed(&mut self, data: Value) -> Result<()> {
        self.reset_with(data, Options::silent())
    }

    fn bind_class(&mut self, config: &ClassConfig, remote: Option<Arc<dyn RemoteSource>>) {
        self.set_comparator(config.comparator.clone());
        if let Some(url) = &config.url {
            self.set_url(url.clone());
        }
        if let Some(remote) = remote {
            self.set_remote(remote);
        }
    }
}

/// Everything a subclass declares
pub struct ClassDefinition<T> {
    name: String,
    config: ClassConfig,
    initialize: Option<Initializer<T>>,
    remote: Option<Arc<dyn RemoteSource>>,
}

impl<T> ClassDefinition<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ClassConfig::default(),
            initialize: None,
            remote: None,
        }
    }

    pub fn config(mut self, config: ClassConfig) -> Self {
        self.config = config;
        self
    }

    pub fn initialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T, &InitArgs) -> Result<()> + Send + Sync + 'static,
    {
        self.initialize = Some(Arc::new(f));
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteSource>) -> Self {
        self.remote = Some(remote);
        self
    }
}

pub struct Class<T> {
    name: String,
    config: ClassConfig,
    initialize: Option<Initializer<T>>,
    parent: Option<Arc<Class<T>>>,
    registry: Arc<PluginRegistry<T>>,
    remote: Option<Arc<dyn RemoteSource>>,
}

impl<T: Constructible> Class<T> {
    /// Declare a subclass.
    ///
    /// Unset config fields, the initializer and the remote source are taken
    /// from this class when the definition leaves them out.
    pub fn extend(self: &Arc<Self>, definition: ClassDefinition<T>) -> Arc<Self> {
        Arc::new(Self {
            name: definition.name,
            config: definition.config.inherit(&self.config),
            initialize: definition.initialize.or_else(|| self.initialize.clone()),
            parent: Some(Arc::clone(self)),
            registry: Arc::clone(&self.registry),
            remote: definition.remote.or_else(|| self.remote.clone()),
        })
    }

    /// Build an instance: seed, setup plugins, then the initializer.
    pub fn construct(&self, args: InitArgs) -> Result<T> {
        debug!(class = %self.name, seeded = args.seed.is_some(), "Constructing");

        let mut instance = T::blank();
        instance.bind_class(&self.config, self.remote.clone());
        if let Some(seed) = &args.seed {
            instance
                .seed(seed.clone())
                .with_context(|| format!("Invalid seed data for {}", self.name))?;
        }

        self.registry
            .run_setup_plugins(&mut instance, &self.config, &args)?;

        if let Some(initialize) = &self.initialize {
            initialize(&mut instance, &args)
                .with_context(|| format!("Initializer of {} failed", self.name))?;
        }
        Ok(instance)
    }

    /// `construct` with no arguments
    pub fn create(&self) -> Result<T> {
        self.construct(InitArgs::default())
    }
}

impl<T> Class<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective config, including inherited fields
    pub fn config(&self) -> &ClassConfig {
        &self.config
    }

    pub fn parent(&self) -> Option<&Arc<Class<T>>> {
        self.parent.as_ref()
    }

    /// True if this class is `name` or descends from it
    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.parent.as_ref().is_some_and(|p| p.is_a(name))
    }
}

impl<T> fmt::Debug for Class<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}

/// A base kind wrapped with setup plugins.
///
/// Every class extended from `base()` (directly or not) runs the plugins of
/// this interceptor. Plugins added later apply to constructions made after
/// the call.
pub struct Interceptor<T> {
    base: Arc<Class<T>>,
}

impl<T: Constructible> Interceptor<T> {
    pub fn wrap(plugins: Vec<Arc<dyn SetupPlugin<T>>>) -> Self {
        Self::build(Arc::new(PluginRegistry::new(plugins)), None)
    }

    /// Remote source inherited by every class of this kind
    pub fn with_remote(self, remote: Arc<dyn RemoteSource>) -> Self {
        Self::build(Arc::clone(&self.base.registry), Some(remote))
    }

    fn build(registry: Arc<PluginRegistry<T>>, remote: Option<Arc<dyn RemoteSource>>) -> Self {
        Self {
            base: Arc::new(Class {
                name: "Base".to_string(),
                config: ClassConfig::default(),
                initialize: None,
                parent: None,
                registry,
                remote,
            }),
        }
    }

    pub fn add_plugin(&self, plugin: Arc<dyn SetupPlugin<T>>) {
        self.base.registry.add_plugin(plugin);
    }

    pub fn plugin_count(&self) -> usize {
        self.base.registry.len()
    }

    pub fn base(&self) -> &Arc<Class<T>> {
        &self.base
    }

    /// Shorthand for `base().extend(definition)`
    pub fn extend(&self, definition: ClassDefinition<T>) -> Arc<Class<T>> {
        self.base.extend(definition)
    }
}
