use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::kind::{ControllerKind, Mirrored};
use super::options::{FetchOptions, FetchSource, SafeOptions};
use crate::model::{EventKind, Handler};
use crate::storage::SharedStore;

/// Keeps one mirrored instance and its slot in sync.
///
/// Owned by the instance it mirrors (through `Mirrored::safe` and the event
/// handlers it installs); it never holds a reference back to the instance.
pub struct MirrorController {
    uid: String,
    kind: ControllerKind,
    reload_on_init: bool,
    fetch_source: Option<FetchSource>,
    created_slot: bool,
    store: SharedStore,
}

impl MirrorController {
    /// Attach a controller to `context`.
    ///
    /// Returns `Ok(None)` without touching the store or the instance when
    /// `uid` is empty. An instance that already has a controller keeps it.
    pub fn attach<T: Mirrored>(
        uid: &str,
        context: &mut T,
        store: SharedStore,
        options: SafeOptions,
    ) -> Result<Option<Arc<Self>>> {
        if uid.is_empty() {
            debug!("Empty safe key, nothing to mirror");
            return Ok(None);
        }
        if let Some(existing) = context.safe() {
            warn!(
                uid,
                existing = existing.uid(),
                "Instance is already mirrored, keeping the existing controller"
            );
            return Ok(Some(Arc::clone(existing)));
        }

        let mut controller = Self {
            uid: uid.to_string(),
            kind: context.kind(),
            reload_on_init: options.reload,
            fetch_source: options.from,
            created_slot: false,
            store,
        };
        controller.created_slot = controller.ensure_uid()?;

        // Runs before any listener is installed so it cannot write through.
        if controller.reload_on_init {
            controller.reload(context)?;
        }

        let controller = Arc::new(controller);
        context.attach_safe(Arc::clone(&controller));

        let writer = Arc::clone(&controller);
        let store_handler: Handler<T> = Arc::new(move |target: &T| writer.store(target));
        context.on(controller.kind.events(), store_handler);

        let evictor = Arc::clone(&controller);
        let destroy_handler: Handler<T> = Arc::new(move |_: &T| evictor.destroy());
        context.on(&[EventKind::Destroy], destroy_handler);

        info!(
            uid = %controller.uid,
            kind = ?controller.kind,
            reload = controller.reload_on_init,
            "Safe attached"
        );
        Ok(Some(controller))
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    pub fn is_collection(&self) -> bool {
        self.kind == ControllerKind::Collection
    }

    pub fn reload_on_init(&self) -> bool {
        self.reload_on_init
    }

    pub fn fetch_source(&self) -> Option<FetchSource> {
        self.fetch_source
    }

    /// Whether attaching found no slot and wrote the empty value
    pub fn created_slot(&self) -> bool {
        self.created_slot
    }

    /// Whether the instance holds everything the slot held when attached,
    /// so writing it back loses nothing.
    pub fn covers_slot(&self) -> bool {
        self.created_slot || self.reload_on_init
    }

    /// Events that write the instance through to the slot
    pub fn events(&self) -> &'static [EventKind] {
        self.kind.events()
    }

    pub fn empty_value(&self) -> &'static str {
        self.kind.empty_value()
    }

    /// Create the slot if it does not exist yet. Returns whether it did.
    pub fn ensure_uid(&self) -> Result<bool> {
        if self.get_data()?.is_some() {
            return Ok(false);
        }
        self.create()?;
        Ok(true)
    }

    /// Write the empty value to the slot
    pub fn create(&self) -> Result<()> {
        debug!(uid = %self.uid, value = self.empty_value(), "Creating slot");
        self.store.set_item(&self.uid, self.empty_value())
    }

    /// Blank the slot while keeping the controller attached
    pub fn reset(&self) -> Result<()> {
        self.create()
    }

    /// Serialize `target` into the slot, replacing whatever was there
    pub fn store<T: Mirrored>(&self, target: &T) -> Result<()> {
        let json = serde_json::to_string(&target.to_json())?;
        debug!(uid = %self.uid, bytes = json.len(), "Storing");
        self.store.set_item(&self.uid, &json)
    }

    /// Parsed slot content; `None` when the slot is absent or empty.
    ///
    /// A slot holding something that is not JSON is an error.
    pub fn get_data(&self) -> Result<Option<Value>> {
        let Some(raw) = self.store.get_item(&self.uid)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let data = serde_json::from_str(&raw)
            .with_context(|| format!("Slot {:?} does not hold valid JSON", self.uid))?;
        Ok(Some(data))
    }

    /// Load the slot into `context` (records `set`, collections `add`).
    /// An absent slot leaves the instance untouched.
    pub fn reload<T: Mirrored>(&self, context: &mut T) -> Result<()> {
        match self.get_data()? {
            Some(data) => {
                debug!(uid = %self.uid, "Reloading from slot");
                context.restore(data)
            }
            None => Ok(()),
        }
    }

    /// Whether a fetch with `options` is answered from the slot. The
    /// per-call source wins over the configured one.
    pub fn serves_fetch(&self, options: &FetchOptions) -> bool {
        options.from.or(self.fetch_source) == Some(FetchSource::Safe)
    }

    /// Serve the fetch from the slot, or hand it to the remote source
    /// unchanged. The remote source is never consulted when the slot serves.
    pub async fn fetch<T: Mirrored>(&self, context: &mut T, options: FetchOptions) -> Result<()> {
        if self.serves_fetch(&options) {
            return self.reload(context);
        }
        context.fetch_remote(&options).await
    }

    /// Remove the slot
    pub fn destroy(&self) -> Result<()> {
        debug!(uid = %self.uid, "Removing slot");
        self.store.remove_item(&self.uid)
    }
}

impl fmt::Debug for MirrorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorController")
            .field("uid", &self.uid)
            .field("kind", &self.kind)
            .field("reload_on_init", &self.reload_on_init)
            .field("fetch_source", &self.fetch_source)
            .field("created_slot", &self.created_slot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Record, RecordSet};
    use crate::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;

    fn memory() -> (Arc<MemoryStore>, SharedStore) {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedStore = store.clone();
        (store, shared)
    }

    #[test]
    fn test_attach_creates_empty_record_slot() {
        let (store, shared) = memory();
        let mut record = Record::new();

        let safe = MirrorController::attach("prefs", &mut record, shared, SafeOptions::reloading())
            .unwrap()
            .unwrap();

        assert_eq!(safe.uid(), "prefs");
        assert!(!safe.is_collection());
        assert_eq!(store.get_item("prefs").unwrap().as_deref(), Some("{}"));
        assert!(record.safe().is_some());
    }

    #[test]
    fn test_attach_creates_empty_collection_slot() {
        let (store, shared) = memory();
        let mut set = RecordSet::new();

        let safe = MirrorController::attach("todos", &mut set, shared, SafeOptions::default())
            .unwrap()
            .unwrap();

        assert!(safe.is_collection());
        assert!(safe.created_slot());
        assert_eq!(safe.events(), ControllerKind::Collection.events());
        assert_eq!(store.get_item("todos").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_empty_uid_is_a_no_op() {
        let (store, shared) = memory();
        let mut record = Record::new();

        let safe =
            MirrorController::attach("", &mut record, shared, SafeOptions::reloading()).unwrap();

        assert!(safe.is_none());
        assert!(record.safe().is_none());
        assert!(store.is_empty());
        record.set(json!({ "a": 1 })).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_second_attach_keeps_first_controller() {
        let (store, shared) = memory();
        let mut record = Record::new();

        MirrorController::attach("first", &mut record, shared.clone(), SafeOptions::default())
            .unwrap();
        let again = MirrorController::attach("second", &mut record, shared, SafeOptions::default())
            .unwrap()
            .unwrap();

        assert_eq!(again.uid(), "first");
        assert_eq!(store.get_item("second").unwrap(), None);
    }

    #[test]
    fn test_reload_does_not_write_through() {
        let (store, shared) = memory();
        store.set_item("prefs", r#"{"theme":"dark"}"#).unwrap();
        let mut record = Record::new();

        let safe = MirrorController::attach("prefs", &mut record, shared, SafeOptions::reloading())
            .unwrap()
            .unwrap();

        assert!(!safe.created_slot());
        assert!(safe.covers_slot());
        assert_eq!(record.to_json(), json!({ "theme": "dark" }));
        assert_eq!(
            store.get_item("prefs").unwrap().as_deref(),
            Some(r#"{"theme":"dark"}"#)
        );
    }

    #[test]
    fn test_change_writes_through() {
        let (store, shared) = memory();
        let mut record = Record::new();
        MirrorController::attach("prefs", &mut record, shared, SafeOptions::default()).unwrap();

        record.set(json!({ "id": 7 })).unwrap();

        assert_eq!(
            record.safe().unwrap().get_data().unwrap(),
            Some(json!({ "id": 7 }))
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_destroy_removes_slot_and_reset_restores_it() {
        let (store, shared) = memory();
        let mut record = Record::new();
        let safe = MirrorController::attach("prefs", &mut record, shared, SafeOptions::default())
            .unwrap()
            .unwrap();

        record.destroy().unwrap();
        assert_eq!(safe.get_data().unwrap(), None);

        safe.reset().unwrap();
        assert_eq!(store.get_item("prefs").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_empty_string_slot_reads_as_none() {
        let (store, shared) = memory();
        store.set_item("blank", "").unwrap();
        let mut record = Record::new();
        let safe = MirrorController::attach("blank", &mut record, shared, SafeOptions::reloading())
            .unwrap()
            .unwrap();

        // ensure_uid treats the blank slot as absent and creates it
        assert_eq!(safe.get_data().unwrap(), Some(json!({})));
    }

    #[test]
    fn test_malformed_slot_is_an_error() {
        let (store, shared) = memory();
        store.set_item("broken", "{not json").unwrap();
        let mut record = Record::new();

        let err = MirrorController::attach("broken", &mut record, shared, SafeOptions::reloading())
            .unwrap_err();

        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_configured_fetch_source_serves_every_fetch() {
        let (store, shared) = memory();
        store.set_item("todos", r#"[{"id":1}]"#).unwrap();
        let mut set = RecordSet::new();
        let options = SafeOptions {
            reload: false,
            from: Some(FetchSource::Safe),
        };
        MirrorController::attach("todos", &mut set, shared, options).unwrap();
        assert!(set.is_empty());

        set.fetch(FetchOptions::default()).await.unwrap();

        assert_eq!(set.to_json(), json!([{ "id": 1 }]));
    }

    #[test]
    fn test_existing_slot_without_reload_is_not_covered() {
        let (store, shared) = memory();
        store.set_item("kept", r#"{"a":1}"#).unwrap();
        let mut record = Record::new();

        let safe = MirrorController::attach("kept", &mut record, shared, SafeOptions::default())
            .unwrap()
            .unwrap();

        assert!(!safe.created_slot());
        assert!(!safe.covers_slot());
    }

    #[test]
    fn test_call_source_overrides_configured_source() {
        let (_, shared) = memory();
        let mut set = RecordSet::new();
        let options = SafeOptions {
            reload: false,
            from: Some(FetchSource::Safe),
        };
        let safe = MirrorController::attach("todos", &mut set, shared, options)
            .unwrap()
            .unwrap();

        assert!(safe.serves_fetch(&FetchOptions::default()));
        let remote = FetchOptions {
            from: Some(FetchSource::Remote),
            ..FetchOptions::default()
        };
        assert!(!safe.serves_fetch(&remote));
    }
}
