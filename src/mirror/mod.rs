//! Mirror engine
//!
//! A `MirrorController` keeps one record or record set in sync with one slot
//! of a `KeyValueStore`:
//!
//! - on construction the slot is created if absent and, optionally, its
//!   content is loaded into the instance
//! - every mirrored event writes the instance's JSON to the slot
//! - the `destroy` event removes the slot
//! - `fetch` can be served from the slot instead of the remote source
//!
//! `SafePlugin` is the setup plugin that attaches controllers to instances of
//! classes declaring a `safe` key.

mod controller;
mod kind;
mod options;
mod plugin;

pub use controller::MirrorController;
pub use kind::{ControllerKind, Mirrored};
pub use options::{FetchOptions, FetchSource, SafeConfig, SafeOptions};
pub use plugin::{safe_interceptors, SafeInterceptors, SafePlugin};
