//! Observers that run while a checkout attempt is in its before-processing
//! phase. Any of them can veto the attempt.

use {
    std::sync::{Arc, Mutex, PoisonError, Weak},
    thiserror::Error,
};

/// A before-processing observer rejected the checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Invalid {
    pub message: String,
}

impl Invalid {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type Hook = Arc<dyn Fn() -> Result<(), Invalid> + Send + Sync>;

struct Entry {
    id: u64,
    priority: u32,
    hook: Hook,
}

/// Priority ordered observer list. Equal priorities run in registration
/// order.
#[derive(Default)]
pub(super) struct Observers {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Observers {
    pub(super) fn add(&mut self, priority: u32, hook: Hook) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let position = self
            .entries
            .partition_point(|entry| entry.priority <= priority);
        self.entries.insert(position, Entry { id, priority, hook });
        id
    }

    pub(super) fn remove(&mut self, id: u64) -> bool {
        let len = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != len
    }

    pub(super) fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub(super) fn snapshot(&self) -> Vec<(u64, Hook)> {
        self.entries
            .iter()
            .map(|entry| (entry.id, entry.hook.clone()))
            .collect()
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(super) type Shared = Arc<Mutex<Observers>>;

pub(super) fn lock(observers: &Mutex<Observers>) -> std::sync::MutexGuard<'_, Observers> {
    observers.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keeps an observer registered. Dropping the subscription unregisters it, so
/// it must live exactly as long as the component that registered it.
#[must_use = "dropping the subscription unregisters the observer"]
pub struct Subscription {
    id: u64,
    observers: Weak<Mutex<Observers>>,
}

impl Subscription {
    pub(super) fn new(id: u64, observers: &Shared) -> Self {
        Self {
            id,
            observers: Arc::downgrade(observers),
        }
    }

    /// Unregisters the observer now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            lock(&observers).remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
