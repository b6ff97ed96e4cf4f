//! Write-through mirroring of observable records into a key-value store
//!
//! This crate provides:
//! - **Model**: `Record` and `RecordSet`, observable objects firing typed events
//! - **Classes**: `Class`, `Interceptor` and `SetupPlugin` for per-construction setup
//! - **Mirror**: `MirrorController` and `SafePlugin`, keeping an instance and a slot in sync
//! - **Storage**: `KeyValueStore` trait with `MemoryStore`, `FsStore` and `SqliteStore` backends
//! - **Remote**: `RemoteSource` trait with the `HttpSource` fetcher
//!
//! # Example
//!
//! ```ignore
//! use safe_mirror::{safe_interceptors, ClassConfig, ClassDefinition, MemoryStore};
//!
//! let kinds = safe_interceptors(Arc::new(MemoryStore::new()));
//! let prefs = kinds.records.extend(
//!     ClassDefinition::new("Prefs").config(ClassConfig::default().with_safe("prefs")),
//! );
//!
//! let mut a = prefs.create()?;
//! a.set(json!({ "theme": "dark" }))?;   // written to slot "prefs"
//!
//! let b = prefs.create()?;               // reloaded from slot "prefs"
//! assert_eq!(b.get("theme"), Some(&json!("dark")));
//! ```
pub mod class;
pub mod mirror;
pub mod model;
pub mod remote;
pub mod storage;

pub use class::{
    Class, ClassConfig, ClassDefinition, Constructible, FnPlugin, InitArgs, Interceptor,
    PluginRegistry, SetupPlugin,
};
pub use mirror::{
    safe_interceptors, ControllerKind, FetchOptions, FetchSource, MirrorController, Mirrored,
    SafeConfig, SafeInterceptors, SafeOptions, SafePlugin,
};
pub use model::{EventKind, Handler, Options, Record, RecordSet};
pub use remote::{HttpSource, RemoteSource};
pub use storage::{
    open_default_store, open_store, FsStore, KeyValueStore, MemoryStore, SharedStore,
};
#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
