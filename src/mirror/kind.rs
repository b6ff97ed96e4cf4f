//! Record / collection behavior selection

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::mirror::{FetchOptions, MirrorController};
use crate::model::{EventKind, Handler};

/// Which mirroring behavior a controller uses
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControllerKind {
    Record,
    Collection,
}

impl ControllerKind {
    /// Events that trigger a write-through
    pub const fn events(&self) -> &'static [EventKind] {
        match self {
            ControllerKind::Collection => &[
                EventKind::Add,
                EventKind::Reset,
                EventKind::Change,
                EventKind::Sort,
            ],
            ControllerKind::Record => &[EventKind::Change],
        }
    }

    /// Payload written to a freshly created slot
    pub const fn empty_value(&self) -> &'static str {
        match self {
            ControllerKind::Collection => "[]",
            ControllerKind::Record => "{}",
        }
    }
}

/// An instance the mirror engine can keep in sync with a slot.
#[async_trait]
pub trait Mirrored: Sized + Send + Sync + 'static {
    /// Collection-shaped instances hold ordered members and support `add`
    fn kind(&self) -> ControllerKind;

    /// Serializable snapshot of the instance
    fn to_json(&self) -> Value;

    /// Apply data read from a slot: records `set` it, collections `add` it
    fn restore(&mut self, data: Value) -> Result<()>;

    fn on(&mut self, events: &[EventKind], handler: Handler<Self>);

    /// Controller attached at construction, if any
    fn safe(&self) -> Option<&Arc<MirrorController>>;

    /// Store the controller back-reference; `fetch` consults it from then on
    fn attach_safe(&mut self, controller: Arc<MirrorController>);

    /// Delegated network fetch
    async fn fetch_remote(&mut self, options: &FetchOptions) -> Result<()>;
}
