//! Entity registry — the names of every entity the supervisor has spawned.
//!
//! The registry is the record of what the supervisor inserted, while the
//! scene is the record of what actually exists. Only the
//! [`EntityManager`](crate::manager::EntityManager) mutates it.

use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct EntityRegistry {
    names: BTreeSet<String>,
}

impl EntityRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// Returns `true` if an entity with this name has been spawned and not
    /// yet removed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Record a spawned name. Returns `false` if it was already present.
    pub(crate) fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    /// Forget a name. Returns `true` if it was present.
    pub(crate) fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the spawned names in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
