#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use safe_mirror::{KeyValueStore, MemoryStore, RemoteSource};
use serde_json::Value;

/// Remote source answering every read with a fixed body
pub struct StubRemote {
    body: Value,
    calls: AtomicUsize,
}

impl StubRemote {
    pub fn new(body: Value) -> Arc<Self> {
        Arc::new(Self {
            body,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for StubRemote {
    async fn read(&self, _url: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

/// Parsed slot content
pub fn slot(store: &MemoryStore, key: &str) -> Option<Value> {
    store
        .get_item(key)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}
