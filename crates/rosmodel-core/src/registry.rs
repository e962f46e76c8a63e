//! # Entity Registry
//!
//! A name-keyed bank of entities of one kind.
//!
//! Looking up an absent name with [`Registry::get_or_create`] inserts a fresh
//! entity, so callers never have to pre-declare names. All data structures
//! use `BTreeMap` for deterministic, name-sorted iteration.

use crate::types::Entity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::btree_map::Entry;

/// A bank of entities keyed by unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Entity> Registry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entity called `name`, creating it if absent.
    ///
    /// Idempotent: a second call with the same name returns the same entity.
    pub fn get_or_create(&mut self, name: &str) -> &mut T {
        self.entries
            .entry(name.to_string())
            .or_insert_with(|| T::named(name))
    }

    /// Insert a fully built entity under its own name.
    ///
    /// Returns the entity previously stored under that name, if any.
    pub fn insert(&mut self, entity: T) -> Option<T> {
        match self.entries.entry(entity.name().to_string()) {
            Entry::Occupied(mut occupied) => Some(occupied.insert(entity)),
            Entry::Vacant(vacant) => {
                vacant.insert(entity);
                None
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The set of names in this bank.
    #[must_use]
    pub fn keys(&self) -> BTreeSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// `(name, entity)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, entity)| (name.as_str(), entity))
    }

    /// Entities in name order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries.values_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> FromIterator<T> for Registry<T>
where
    T: Entity,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut registry = Self::new();
        for entity in iter {
            registry.insert(entity);
        }
        registry
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Topic;

    #[test]
    fn get_or_create_is_idempotent() {
        let mut registry: Registry<Topic> = Registry::new();

        registry
            .get_or_create("/chatter")
            .publisher_node_names
            .insert("/talker".to_string());
        let again = registry.get_or_create("/chatter");

        assert!(again.publisher_node_names.contains("/talker"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.keys().len(), 1);
    }

    #[test]
    fn iteration_is_name_sorted() {
        let mut registry: Registry<Topic> = Registry::new();
        for name in ["/zeta", "/alpha", "/mid"] {
            registry.get_or_create(name);
        }

        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["/alpha", "/mid", "/zeta"]);
    }

    #[test]
    fn insert_replaces_by_name() {
        let mut registry: Registry<Topic> = Registry::new();
        let mut first = Topic::named("/a");
        first.construct_type = Some("std_msgs/String".to_string());
        assert!(registry.insert(first).is_none());

        let replaced = registry.insert(Topic::named("/a"));
        assert!(replaced.is_some_and(|t| t.construct_type.is_some()));
        assert!(registry.get("/a").is_some_and(|t| t.construct_type.is_none()));
    }
}
