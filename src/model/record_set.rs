//! An ordered collection of records

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use super::compare_values;
use super::event::{EventKind, Handler, Listeners, Options};
use super::record::{Record, ID_ATTRIBUTE};
use crate::mirror::{ControllerKind, FetchOptions, MirrorController, Mirrored};
use crate::remote::RemoteSource;

#[derive(Clone, Default)]
pub struct RecordSet {
    models: Vec<Record>,
    comparator: Option<String>,
    listeners: Listeners<RecordSet>,
    url: Option<String>,
    remote: Option<Arc<dyn RemoteSource>>,
    safe: Option<Arc<MirrorController>>,
}

/// Accept either an array of objects or a single object.
fn into_items(data: Value) -> Result<Vec<Map<String, Value>>> {
    let items = match data {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!("Record set items must be JSON objects, got {}", other)),
        })
        .collect()
}

fn item_id(item: &Map<String, Value>) -> Option<&Value> {
    item.get(ID_ATTRIBUTE).filter(|v| !v.is_null())
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep members ordered by the named attribute
    pub fn with_comparator(mut self, attribute: impl Into<String>) -> Self {
        self.comparator = Some(attribute.into());
        self
    }

    pub fn set_comparator(&mut self, attribute: Option<String>) {
        self.comparator = attribute;
    }

    pub fn comparator(&self) -> Option<&str> {
        self.comparator.as_deref()
    }

    pub fn models(&self) -> &[Record] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn get(&self, id: &Value) -> Option<&Record> {
        self.position(id).map(|i| &self.models[i])
    }

    fn position(&self, id: &Value) -> Option<usize> {
        self.models.iter().position(|m| m.id() == Some(id))
    }

    /// Add items that are not already members.
    ///
    /// Items whose id is already present are skipped. Fires `Add` once per
    /// added item, then `Sort` if a comparator re-ordered the set.
    pub fn add(&mut self, data: Value) -> Result<()> {
        self.add_with(data, Options::default())
    }

    pub fn add_with(&mut self, data: Value, options: Options) -> Result<()> {
        let mut added = 0;
        for item in into_items(data)? {
            if item_id(&item).is_some_and(|id| self.position(id).is_some()) {
                continue;
            }
            self.models.push(Record::from_attributes(item));
            added += 1;
        }

        let sorted = added > 0 && self.sort_in_place();
        if !options.silent {
            for _ in 0..added {
                self.trigger(EventKind::Add)?;
            }
            if sorted {
                self.trigger(EventKind::Sort)?;
            }
        }
        Ok(())
    }

    /// Smart update: merge into members with matching ids, add new items and
    /// remove members absent from `data`. A new id repeated in `data` is
    /// added once.
    pub fn set(&mut self, data: Value) -> Result<()> {
        self.set_with(data, Options::default())
    }

    pub fn set_with(&mut self, data: Value, options: Options) -> Result<()> {
        let items = into_items(data)?;
        let mut keep = HashSet::new();
        let mut fresh = Vec::new();
        let mut changed = 0;
        let mut added = 0;

        for item in items {
            match item_id(&item).and_then(|id| self.position(id)) {
                Some(i) => {
                    keep.insert(i);
                    if self.models[i].merge(item) {
                        changed += 1;
                    }
                }
                None => {
                    // Later duplicates of a new id are dropped, as in `add`.
                    let seen = item_id(&item)
                        .is_some_and(|id| fresh.iter().any(|r: &Record| r.id() == Some(id)));
                    if !seen {
                        fresh.push(Record::from_attributes(item));
                    }
                }
            }
        }

        let before = self.models.len();
        let mut index = 0;
        self.models.retain(|_| {
            let kept = keep.contains(&index);
            index += 1;
            kept
        });
        let removed = before - self.models.len();

        for record in fresh {
            self.models.push(record);
            added += 1;
        }
        let sorted = added > 0 && self.sort_in_place();

        if !options.silent {
            for _ in 0..removed {
                self.trigger(EventKind::Remove)?;
            }
            for _ in 0..added {
                self.trigger(EventKind::Add)?;
            }
            for _ in 0..changed {
                self.trigger(EventKind::Change)?;
            }
            if sorted {
                self.trigger(EventKind::Sort)?;
            }
        }
        Ok(())
    }

    /// Change attributes of the member with `id`; the change bubbles up as a
    /// `Change` on the set.
    pub fn update(&mut self, id: &Value, attrs: Value) -> Result<()> {
        let index = self
            .position(id)
            .ok_or_else(|| anyhow!("No member with id {}", id))?;
        let attrs = match attrs {
            Value::Object(map) => map,
            other => return Err(anyhow!("Record attributes must be a JSON object, got {}", other)),
        };
        if self.models[index].merge(attrs) {
            self.trigger(EventKind::Change)?;
        }
        Ok(())
    }

    /// Remove the members with the given ids; fires `Remove` per member removed.
    pub fn remove(&mut self, ids: &[Value]) -> Result<()> {
        self.remove_with(ids, Options::default())
    }

    pub fn remove_with(&mut self, ids: &[Value], options: Options) -> Result<()> {
        let before = self.models.len();
        self.models
            .retain(|m| !m.id().is_some_and(|id| ids.contains(id)));
        let removed = before - self.models.len();

        if !options.silent {
            for _ in 0..removed {
                self.trigger(EventKind::Remove)?;
            }
        }
        Ok(())
    }

    /// Drop every member silently
    pub fn remove_all_silently(&mut self) {
        self.models.clear();
    }

    /// Replace all members with `data` and fire a single `Reset`.
    pub fn reset(&mut self, data: Value) -> Result<()> {
        self.reset_with(data, Options::default())
    }

    pub fn reset_with(&mut self, data: Value, options: Options) -> Result<()> {
        self.models = into_items(data)?
            .into_iter()
            .map(Record::from_attributes)
            .collect();
        self.sort_in_place();
        if !options.silent {
            self.trigger(EventKind::Reset)?;
        }
        Ok(())
    }

    /// Re-order by the comparator and fire `Sort`.
    pub fn sort(&mut self) -> Result<()> {
        if self.comparator.is_none() {
            return Err(anyhow!("Cannot sort a set without a comparator"));
        }
        self.sort_in_place();
        self.trigger(EventKind::Sort)
    }

    fn sort_in_place(&mut self) -> bool {
        let Some(attribute) = self.comparator.as_deref() else {
            return false;
        };
        self.models.sort_by(|a, b| {
            compare_values(
                a.get(attribute).unwrap_or(&Value::Null),
                b.get(attribute).unwrap_or(&Value::Null),
            )
        });
        true
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.models.iter().map(Record::to_json).collect())
    }

    /// End of life for the whole set: fires `Destroy`.
    pub fn destroy(&mut self) -> Result<()> {
        self.trigger(EventKind::Destroy)
    }

    pub fn on(&mut self, events: &[EventKind], handler: Handler<RecordSet>) {
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

    pub async fn fetch(&mut self, options: FetchOptions) -> Result<()> {
        match self.safe.clone() {
            Some(safe) => safe.fetch(self, options).await,
            None => self.fetch_remote(&options).await,
        }
    }
}

impl fmt::Debug for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSet")
            .field("models", &self.models)
            .field("comparator", &self.comparator)
            .field("url", &self.url)
            .field("safe", &self.safe.as_ref().map(|s| s.uid()))
            .finish()
    }
}

#[async_trait]
impl Mirrored for RecordSet {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Collection
    }

    fn to_json(&self) -> Value {
        RecordSet::to_json(self)
    }

    fn restore(&mut self, data: Value) -> Result<()> {
        self.add(data)
    }

    fn on(&mut self, events: &[EventKind], handler: Handler<Self>) {
        RecordSet::on(self, events, handler);
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
            .ok_or_else(|| anyhow!("A url must be specified to fetch a record set"))?;
        let remote = self
            .remote
            .clone()
            .ok_or_else(|| anyhow!("No remote source configured to fetch {}", url))?;

        debug!(url = %url, reset = options.reset, "Fetching record set");
        let data = remote
            .read(&url)
            .await
            .with_context(|| format!("Failed to fetch record set from {}", url))?;
        if options.reset {
            self.reset(data)
        } else {
            self.set(data)
        }
    }
}
