//! Observable state containers
//!
//! Each resource keeps its current value in a [`StateContainer`] backed by
//! `tokio::sync::watch`. The poller and the rendering layer go through the same
//! accessors: the poller merges snapshots in, the rendering layer reads fields
//! and pushes form edits back with [`StateContainer::set_field`].

use serde_json::{Map, Value};
use tokio::sync::watch;

/// Flat field mapping as returned by JSON endpoints
pub type Record = Map<String, Value>;

pub struct StateContainer<T> {
    sender: watch::Sender<T>,
}

impl<T: Default> Default for StateContainer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> std::fmt::Debug for StateContainer<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateContainer")
            .field("value", &*self.sender.borrow())
            .finish()
    }
}

impl<T> StateContainer<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Run `f` against the current value.
    ///
    /// The value stays locked while `f` runs, so `f` must not touch this
    /// container again.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Mutate in place. `f` returns whether it changed anything; subscribers
    /// are only notified when it did.
    pub fn update(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.sender.send_if_modified(f)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T: Clone> StateContainer<T> {
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }
}

impl<T: PartialEq> StateContainer<T> {
    /// Replace the value, notifying subscribers if it differs
    pub fn set(&self, value: T) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

impl StateContainer<Record> {
    /// Merge a snapshot field by field, keeping fields the snapshot lacks
    pub fn merge(&self, snapshot: Record) -> bool {
        self.update(|current| merge_record(current, snapshot))
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.read(|record| record.get(name).cloned())
    }

    /// Field rendered as form text; missing and null fields give ""
    pub fn text(&self, name: &str) -> String {
        self.read(|record| record.get(name).map(value_text).unwrap_or_default())
    }

    pub fn set_field(&self, name: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        self.update(|record| {
            if record.get(name) == Some(&value) {
                false
            } else {
                record.insert(name.to_string(), value);
                true
            }
        })
    }
}

/// Merge `snapshot` into `target`.
///
/// Nested objects are merged recursively; every other value (arrays included)
/// replaces the previous one. Returns whether `target` changed.
pub fn merge_record(target: &mut Record, snapshot: Record) -> bool {
    let mut changed = false;

    for (key, incoming) in snapshot {
        match target.get_mut(&key) {
            Some(Value::Object(existing)) if incoming.is_object() => {
                if let Value::Object(nested) = incoming {
                    changed |= merge_record(existing, nested);
                }
            }
            Some(existing) => {
                if *existing != incoming {
                    *existing = incoming;
                    changed = true;
                }
            }
            None => {
                target.insert(key, incoming);
                changed = true;
            }
        }
    }

    changed
}

/// String form of a scalar the way a bound form field would show it
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
