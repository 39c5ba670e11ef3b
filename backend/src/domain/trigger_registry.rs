//! Hot-swappable trigger table.
//!
//! Readers take an `Arc` snapshot under a read lock and release the lock
//! immediately; a reload builds the replacement table first and only holds the
//! write lock for the pointer swap. Snapshots already handed out stay valid.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use super::{Trigger, TriggerId};

/// Immutable, ordered set of triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerTable {
    triggers: Vec<Trigger>,
}

impl TriggerTable {
    pub fn new(triggers: Vec<Trigger>) -> Self {
        Self { triggers }
    }

    /// Look up a trigger by id. When ids repeat, the first declaration wins.
    pub fn find(&self, id: &TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|trigger| &trigger.id == id)
    }

    /// Triggers in declaration order, including shadowed duplicates.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter()
    }

    /// Ids declared more than once, in order of their second appearance.
    pub fn duplicate_ids(&self) -> Vec<TriggerId> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for trigger in &self.triggers {
            if !seen.insert(&trigger.id) && !duplicates.contains(&trigger.id) {
                duplicates.push(trigger.id.clone());
            }
        }
        duplicates
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

/// Shared handle to the current trigger table.
#[derive(Debug, Default)]
pub struct TriggerRegistry {
    current: RwLock<Arc<TriggerTable>>,
}

impl TriggerRegistry {
    pub fn new(table: TriggerTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// Return the current immutable snapshot.
    pub fn current(&self) -> Arc<TriggerTable> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // A writer only swaps an Arc, so a poisoned lock still holds a
            // complete table.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Atomically install a new table. Duplicate ids are reported by the
    /// loader that built it.
    pub fn replace(&self, table: TriggerTable) {
        let next = Arc::new(table);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Find a trigger in the current snapshot, cloning it out so no lock or
    /// snapshot is held by the caller.
    pub fn find(&self, id: &TriggerId) -> Option<Trigger> {
        self.current().find(id).cloned()
    }
}
