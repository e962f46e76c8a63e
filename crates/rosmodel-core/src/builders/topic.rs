//! Topic builders and the topic bank.

use super::{BuilderBank, EntityBuilder, split_name};
use crate::primitives::{SNAPSHOT_SOURCE, UNKNOWN_TYPE};
use crate::types::{Entity, Provenance, Topic};
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};

/// Accumulates publishers and subscribers of one topic.
#[derive(Debug, Clone, Default)]
pub struct TopicBuilder {
    name: String,
    publishers: BTreeSet<String>,
    subscribers: BTreeSet<String>,
    construct_type: OnceCell<String>,
}

impl TopicBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn add_publisher(&mut self, node: &str) {
        self.publishers.insert(node.to_string());
    }

    pub fn add_subscriber(&mut self, node: &str) {
        self.subscribers.insert(node.to_string());
    }

    #[must_use]
    pub fn publishers(&self) -> &BTreeSet<String> {
        &self.publishers
    }

    #[must_use]
    pub fn subscribers(&self) -> &BTreeSet<String> {
        &self.subscribers
    }

    /// `(base, suffix)` of the topic name.
    #[must_use]
    pub fn name_parts(&self) -> (&str, &str) {
        split_name(&self.name)
    }

    /// Declared type, looked up once in `types`.
    ///
    /// Falls back to [`UNKNOWN_TYPE`] when the table has no entry.
    pub fn construct_type(&self, types: &BTreeMap<String, String>) -> &str {
        self.construct_type.get_or_init(|| {
            types
                .get(&self.name)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_TYPE.to_string())
        })
    }

    /// Type resolved so far, if any lookup has happened.
    #[must_use]
    pub fn resolved_type(&self) -> Option<&str> {
        self.construct_type.get().map(String::as_str)
    }
}

impl EntityBuilder for TopicBuilder {
    type Output = Topic;

    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self) -> Topic {
        let mut topic = Topic::named(&self.name);
        topic.meta.source = Provenance::single(SNAPSHOT_SOURCE);
        topic.construct_type = Some(self.resolved_type().unwrap_or(UNKNOWN_TYPE).to_string());
        topic.publisher_node_names = self.publishers.clone();
        topic.subscriber_node_names = self.subscribers.clone();
        topic
    }
}

/// Topic builders plus the type table they resolve against.
#[derive(Debug, Default)]
pub struct TopicBank {
    pub builders: BuilderBank<TopicBuilder>,
    types: BTreeMap<String, String>,
}

impl TopicBank {
    #[must_use]
    pub fn new(types: BTreeMap<String, String>) -> Self {
        Self {
            builders: BuilderBank::new(),
            types,
        }
    }

    /// Type table used for lookups.
    #[must_use]
    pub fn types(&self) -> &BTreeMap<String, String> {
        &self.types
    }

    /// Resolve a topic's type without creating a builder.
    #[must_use]
    pub fn type_of(&self, topic: &str) -> &str {
        self.types.get(topic).map(String::as_str).unwrap_or(UNKNOWN_TYPE)
    }

    /// Builder for `name`, created and typed on first use.
    pub fn get_or_create(&mut self, name: &str) -> &mut TopicBuilder {
        let types = &self.types;
        let builder = self.builders.get_or_insert_with(name, TopicBuilder::new);
        builder.construct_type(types);
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_sentinel() {
        let mut bank = TopicBank::new(BTreeMap::new());
        let builder = bank.get_or_create("/mystery");
        assert_eq!(builder.resolved_type(), Some(UNKNOWN_TYPE));
    }

    #[test]
    fn type_is_memoized() {
        let mut types = BTreeMap::new();
        types.insert("/chatter".to_string(), "std_msgs/String".to_string());
        let builder = TopicBuilder::new("/chatter");
        assert_eq!(builder.construct_type(&types), "std_msgs/String");

        types.insert("/chatter".to_string(), "changed/Type".to_string());
        assert_eq!(builder.construct_type(&types), "std_msgs/String");
    }

    #[test]
    fn repeated_facts_are_idempotent() {
        let mut bank = TopicBank::new(BTreeMap::new());
        for _ in 0..3 {
            bank.get_or_create("/chatter").add_publisher("/talker");
        }
        let topic = bank.builders.extract();
        let chatter = topic.get("/chatter");
        assert!(chatter.is_some_and(|t| t.publisher_node_names.len() == 1));
        assert!(chatter.is_some_and(|t| t.meta.source.contains(SNAPSHOT_SOURCE)));
    }
}
