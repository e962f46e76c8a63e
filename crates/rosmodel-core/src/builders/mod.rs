//! # Fact Builders
//!
//! Builders accumulate raw middleware facts for one entity name and turn
//! them into a finished [`Entity`] once every pass is done.
//!
//! - `add_*` methods record facts. They are idempotent: repeating a call
//!   with the same arguments leaves the builder unchanged.
//! - Derived properties (declared topic type, nodelet manager status,
//!   machine name) are computed on first use and memoized.
//! - A [`BuilderBank`] applies an [`ExclusionFilter`] once in
//!   [`BuilderBank::prepare`], before any derived property is read.

pub mod machine;
pub mod node;
pub mod parameter;
pub mod service;
pub mod topic;

use crate::diagnostics::{Diagnostics, Severity};
use crate::filters::ExclusionFilter;
use crate::registry::Registry;
use crate::types::Entity;
use std::collections::BTreeMap;

pub use machine::MachineBuilder;
pub use node::{NodeBuilder, NodeContext, ParameterRole, TopicRole};
pub use parameter::ParameterBuilder;
pub use service::ServiceBuilder;
pub use topic::{TopicBank, TopicBuilder};

// =============================================================================
// NAME SPLITTING
// =============================================================================

/// Split a graph name into `(base, suffix)` around its final `/`.
///
/// The suffix keeps its leading slash: `/r/move/goal` → (`/r/move`, `/goal`).
/// A name without `/` has an empty base.
#[must_use]
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('/') {
        Some(index) => (&name[..index], &name[index..]),
        None => ("", name),
    }
}

/// The final path segment of a name, without slash.
#[must_use]
pub fn last_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

// =============================================================================
// BUILDER TRAIT
// =============================================================================

/// A builder that can produce one entity.
pub trait EntityBuilder {
    type Output: Entity;

    fn name(&self) -> &str;

    /// Produce the finished entity from accumulated facts.
    fn build(&self) -> Self::Output;
}

// =============================================================================
// BUILDER BANK
// =============================================================================

/// A name-keyed set of builders of one kind.
#[derive(Debug)]
pub struct BuilderBank<B> {
    builders: BTreeMap<String, B>,
}

impl<B> Default for BuilderBank<B> {
    fn default() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }
}

impl<B: EntityBuilder> BuilderBank<B> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the builder for `name`, creating it with `create` if absent.
    pub fn get_or_insert_with(&mut self, name: &str, create: impl FnOnce(&str) -> B) -> &mut B {
        self.builders
            .entry(name.to_string())
            .or_insert_with(|| create(name))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&B> {
        self.builders.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut B> {
        self.builders.get_mut(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Builders in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &B)> {
        self.builders.iter().map(|(name, builder)| (name.as_str(), builder))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Take a builder out of the bank. Only used when topics are promoted to actions.
    pub(crate) fn remove(&mut self, name: &str) -> Option<B> {
        self.builders.remove(name)
    }

    /// Keep only builders matching `keep`. Returns the number dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&B) -> bool) -> usize {
        let before = self.builders.len();
        self.builders.retain(|_, builder| keep(builder));
        before - self.builders.len()
    }

    /// Drop excluded builders, then run `each` over the rest in name order.
    ///
    /// Returns the number of builders dropped.
    pub fn prepare(
        &mut self,
        filter: &ExclusionFilter,
        diagnostics: &mut Diagnostics,
        mut each: impl FnMut(&mut B, &mut Diagnostics),
    ) -> usize {
        let dropped = self.retain(|builder| !filter.should_exclude(builder.name()));
        if dropped > 0 {
            diagnostics.note(
                Severity::Debug,
                "prepare",
                format!("filtered out {} entities", dropped),
            );
        }
        for builder in self.builders.values_mut() {
            each(builder, diagnostics);
        }
        dropped
    }

    /// Build every entity into a registry.
    #[must_use]
    pub fn extract(&self) -> Registry<B::Output> {
        self.builders.values().map(EntityBuilder::build).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_name_keeps_suffix_slash() {
        assert_eq!(split_name("/r/move/goal"), ("/r/move", "/goal"));
        assert_eq!(split_name("/chatter"), ("", "/chatter"));
        assert_eq!(split_name("plain"), ("", "plain"));
    }

    #[test]
    fn last_segment_of_names() {
        assert_eq!(last_segment("/cam/exposure"), "exposure");
        assert_eq!(last_segment("gain"), "gain");
        assert_eq!(last_segment("/trailing/"), "");
    }

    #[test]
    fn prepare_filters_before_visiting() {
        let mut bank: BuilderBank<TopicBuilder> = BuilderBank::new();
        for name in ["/rosout", "/chatter"] {
            bank.get_or_insert_with(name, TopicBuilder::new);
        }
        let filter = ExclusionFilter::from_names(["/rosout"]);
        let mut diagnostics = Diagnostics::new();
        let mut visited = Vec::new();

        let dropped = bank.prepare(&filter, &mut diagnostics, |builder, _| {
            visited.push(builder.name().to_string());
        });

        assert_eq!(dropped, 1);
        assert_eq!(visited, vec!["/chatter".to_string()]);
        assert!(!bank.contains("/rosout"));
    }
}
