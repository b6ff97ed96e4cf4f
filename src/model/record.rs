//! A single observable object with named attributes

use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::event::{EventKind, Handler, Listeners, Options};
use crate::mirror::{ControllerKind, FetchOptions, MirrorController, Mirrored};
use crate::remote::RemoteSource;

/// Attribute holding a record's identity
pub const ID_ATTRIBUTE: &str = "id";

#[derive(Clone, Default)]
pub struct Record {
    attributes: Map<String, Value>,
    listeners: Listeners<Record>,
    url: Option<String>,
    remote: Option<Arc<dyn RemoteSource>>,
    safe: Option<Arc<MirrorController>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record holding `attributes`; no events fire.
    pub fn from_attributes(attributes: Map<String, Value>) -> Self {
        Self {
            attributes,
            ..Self::default()
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn id(&self) -> Option<&Value> {
        self.get(ID_ATTRIBUTE).filter(|v| !v.is_null())
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Merge `attrs` (a JSON object) into the record.
    ///
    /// Fires `Change` when at least one value differs from what was held.
    /// `Value::Null` is accepted and changes nothing.
    pub fn set(&mut self, attrs: Value) -> Result<()> {
        self.set_with(attrs, Options::default())
    }

    pub fn set_with(&mut self, attrs: Value, options: Options) -> Result<()> {
        let attrs = match attrs {
            Value::Object(map) => map,
            Value::Null => return Ok(()),
            other => {
                return Err(anyhow!(
                    "Record attributes must be a JSON object, got {}",
                    other
                ));
            }
        };

        if self.merge(attrs) && !options.silent {
            self.trigger(EventKind::Change)?;
        }
        Ok(())
    }

    /// Merge without firing events; returns whether anything changed.
    pub(crate) fn merge(&mut self, attrs: Map<String, Value>) -> bool {
        let mut changed = false;
        for (name, value) in attrs {
            if self.attributes.get(&name) != Some(&value) {
                self.attributes.insert(name, value);
                changed = true;
            }
        }
        changed
    }

    pub fn unset(&mut self, name: &str) -> Result<()> {
        if self.attributes.remove(name).is_some() {
            self.trigger(EventKind::Change)?;
        }
        Ok(())
    }

    /// Remove every attribute
    pub fn clear(&mut self) -> Result<()> {
        self.clear_with(Options::default())
    }

    pub fn clear_with(&mut self, options: Options) -> Result<()> {
        if self.attributes.is_empty() {
            return Ok(());
        }
        self.attributes.clear();
        if !options.silent {
            self.trigger(EventKind::Change)?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// End of life: fires `Destroy`. Attributes are left in place.
    pub fn destroy(&mut self) -> Result<()> {
        self.trigger(EventKind::Destroy)
    }

    pub fn on(&mut self, events: &[EventKind], handler: Handler<Record>) {
        self.listeners.on(events, handler);
    }

    pub fn trigger(&self, kind: EventKind) -> Result<()> {
        self.listeners.emit(kind, self)
    }

    pub fn safe(&self) -> Option<&Arc<MirrorController>> {
        self.safe.as_ref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
    }

    pub fn set_remote(&mut self, remote: Arc<dyn RemoteSource>) {
        self.remote = Some(remote);
    }

    /// Refresh the record.
    ///
    /// A mirrored record decides between its slot and the remote source;
    /// anything else always goes to the remote source.
    pub async fn fetch(&mut self, options: FetchOptions) -> Result<()> {
        match self.safe.clone() {
            Some(safe) => safe.fetch(self, options).await,
            None => self.fetch_remote(&options).await,
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("attributes", &self.attributes)
            .field("url", &self.url)
            .field("safe", &self.safe.as_ref().map(|s| s.uid()))
            .finish()
    }
}

#[async_trait]
impl Mirrored for Record {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Record
    }

    fn to_json(&self) -> Value {
        Record::to_json(self)
    }

    fn restore(&mut self, data: Value) -> Result<()> {
        self.set(data)
    }

    fn on(&mut self, events: &[EventKind], handler: Handler<Self>) {
        Record::on(self, events, handler);
    }

    fn safe(&self) -> Option<&Arc<MirrorController>> {
        self.safe.as_ref()
    }

    fn attach_safe(&mut self, controller: Arc<MirrorController>) {
        self.safe = Some(controller);
    }

    async fn fetch_remote(&mut self, options: &FetchOptions) -> Result<()> {
        let url = options
            .url
            .clone()
            .or_else(|| self.url.clone())
            .ok_or_else(|| anyhow!("A url must be specified to fetch a record"))?;
        let remote = self
            .remote
            .clone()
            .ok_or_else(|| anyhow!("No remote source configured to fetch {}", url))?;

        debug!(url = %url, "Fetching record");
        let data = remote
            .read(&url)
            .await
            .with_context(|| format!("Failed to fetch record from {}", url))?;
        self.set(data)
    }
}
