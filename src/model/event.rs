//! Typed events and listener lists

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;

/// Events fired by records and record sets
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// One or more items were added to a set
    Add,
    /// Items were removed from a set
    Remove,
    /// A set's contents were replaced wholesale
    Reset,
    /// Attribute values changed
    Change,
    /// A set was re-ordered
    Sort,
    /// The instance reached end of life
    Destroy,
}

impl EventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::Add => "add",
            EventKind::Remove => "remove",
            EventKind::Reset => "reset",
            EventKind::Change => "change",
            EventKind::Sort => "sort",
            EventKind::Destroy => "destroy",
        }
    }

    /// Parse a space separated list such as `"add reset change sort"`
    pub fn parse_list(list: &str) -> Result<Vec<EventKind>> {
        list.split_whitespace().map(str::parse).collect()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(EventKind::Add),
            "remove" => Ok(EventKind::Remove),
            "reset" => Ok(EventKind::Reset),
            "change" => Ok(EventKind::Change),
            "sort" => Ok(EventKind::Sort),
            "destroy" => Ok(EventKind::Destroy),
            other => anyhow::bail!("Unknown event: {}", other),
        }
    }
}

/// Event handler; receives the instance that fired the event.
pub type Handler<T> = Arc<dyn Fn(&T) -> Result<()> + Send + Sync>;

/// Append-only listener list.
pub struct Listeners<T> {
    entries: Vec<(EventKind, Handler<T>)>,
}

impl<T> Listeners<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Subscribe `handler` to every event in `events`
    pub fn on(&mut self, events: &[EventKind], handler: Handler<T>) {
        for kind in events {
            self.entries.push((*kind, Arc::clone(&handler)));
        }
    }

    /// Call the handlers subscribed to `kind`, in subscription order.
    /// Stops at the first handler that fails.
    pub fn emit(&self, kind: EventKind, target: &T) -> Result<()> {
        for (subscribed, handler) in &self.entries {
            if *subscribed == kind {
                handler(target)?;
            }
        }
        Ok(())
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.entries.iter().filter(|(k, _)| *k == kind).count()
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(kind, _)| kind))
            .finish()
    }
}

/// Options accepted by the mutating `*_with` methods
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Apply the mutation without firing events
    pub silent: bool,
}

impl Options {
    pub const fn silent() -> Self {
        Self { silent: true }
    }
}
