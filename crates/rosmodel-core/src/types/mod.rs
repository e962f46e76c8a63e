//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the engine:
//! - Bank kinds (`BankKind`), the closed set of registries in a model
//! - Entity metadata (`EntityMeta`, `Provenance`) and the `Entity` trait
//! - Deployment entities (`deployment`) and specification entities (`specification`)
//! - Error types (`ModelError`)
//!
//! ## Determinism Guarantees
//!
//! All collections are `BTreeMap`/`BTreeSet`, so serialized models and
//! reports come out in the same order on every run.

pub mod deployment;
pub mod specification;

use crate::primitives;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub use deployment::{
    Action, IoBinding, IoMap, Machine, Node, NodeRole, Parameter, Service, Topic,
};
pub use specification::{Catalog, NodeSpecification, PackageSpecification, TypeSpecification};

// =============================================================================
// BANK KINDS
// =============================================================================

/// Every registry a model can hold.
///
/// Deployment kinds come first, then specification kinds. `ALL` follows
/// the same order and is used for statistics and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankKind {
    Node,
    Nodelet,
    NodeletManager,
    Topic,
    Action,
    Service,
    Parameter,
    Machine,
    PackageSpecification,
    NodeSpecification,
    MessageSpecification,
    ServiceSpecification,
    ActionSpecification,
}

impl BankKind {
    /// All bank kinds in output order.
    pub const ALL: [BankKind; 13] = [
        BankKind::Node,
        BankKind::Nodelet,
        BankKind::NodeletManager,
        BankKind::Topic,
        BankKind::Action,
        BankKind::Service,
        BankKind::Parameter,
        BankKind::Machine,
        BankKind::PackageSpecification,
        BankKind::NodeSpecification,
        BankKind::MessageSpecification,
        BankKind::ServiceSpecification,
        BankKind::ActionSpecification,
    ];

    /// Whether the bank belongs to the specification model.
    #[must_use]
    pub const fn is_specification(self) -> bool {
        match self {
            BankKind::Node
            | BankKind::Nodelet
            | BankKind::NodeletManager
            | BankKind::Topic
            | BankKind::Action
            | BankKind::Service
            | BankKind::Parameter
            | BankKind::Machine => false,
            BankKind::PackageSpecification
            | BankKind::NodeSpecification
            | BankKind::MessageSpecification
            | BankKind::ServiceSpecification
            | BankKind::ActionSpecification => true,
        }
    }

    /// Stable file-stem used when a bank is written on its own.
    #[must_use]
    pub const fn output_name(self) -> &'static str {
        match self {
            BankKind::Node => "node_bank",
            BankKind::Nodelet => "nodelet_bank",
            BankKind::NodeletManager => "nodelet_manager_bank",
            BankKind::Topic => "topic_bank",
            BankKind::Action => "action_bank",
            BankKind::Service => "service_bank",
            BankKind::Parameter => "parameter_bank",
            BankKind::Machine => "machine_bank",
            BankKind::PackageSpecification => "package_specification_bank",
            BankKind::NodeSpecification => "node_specification_bank",
            BankKind::MessageSpecification => "message_specification_bank",
            BankKind::ServiceSpecification => "service_specification_bank",
            BankKind::ActionSpecification => "action_specification_bank",
        }
    }

    /// Section title for human-readable reports.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            BankKind::Node => "Nodes:",
            BankKind::Nodelet => "Nodelets:",
            BankKind::NodeletManager => "Nodelet Managers:",
            BankKind::Topic => "Topics:",
            BankKind::Action => "Actions:",
            BankKind::Service => "Services:",
            BankKind::Parameter => "Parameters:",
            BankKind::Machine => "Machines:",
            BankKind::PackageSpecification => "Package Specifications:",
            BankKind::NodeSpecification => "Node Specifications:",
            BankKind::MessageSpecification => "Message Specifications:",
            BankKind::ServiceSpecification => "Service Specifications:",
            BankKind::ActionSpecification => "Action Specifications:",
        }
    }
}

impl fmt::Display for BankKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.output_name())
    }
}

// =============================================================================
// PROVENANCE
// =============================================================================

/// The set of subsystem tags that contributed to an entity.
///
/// Tags merge, they are never overwritten. Legacy models store the set as a
/// single delimited string (`"a, b"`); [`Provenance::from_encoded`] splits it.
/// Human-readable formats accept either form on input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Provenance(BTreeSet<String>);

impl<'de> Deserialize<'de> for Provenance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Tags(Vec<String>),
            Encoded(String),
        }

        // Binary snapshots are not self-describing; they always hold the set.
        if !deserializer.is_human_readable() {
            let tags = BTreeSet::<String>::deserialize(deserializer)?;
            return Ok(tags.iter().map(String::as_str).collect());
        }
        Ok(match Stored::deserialize(deserializer)? {
            Stored::Tags(tags) => tags.iter().map(String::as_str).collect(),
            Stored::Encoded(encoded) => Self::from_encoded(&encoded),
        })
    }
}

impl<'a> FromIterator<&'a str> for Provenance {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut provenance = Self::default();
        for tag in iter {
            provenance.add(tag);
        }
        provenance
    }
}

impl Provenance {
    /// Provenance holding exactly one tag.
    #[must_use]
    pub fn single(tag: &str) -> Self {
        std::iter::once(tag).collect()
    }

    /// Parse a delimiter-joined string, trimming and dropping empty tags.
    #[must_use]
    pub fn from_encoded(encoded: &str) -> Self {
        encoded.split(primitives::PROVENANCE_DELIMITER).collect()
    }

    /// Sorted tags joined with `", "`.
    #[must_use]
    pub fn encoded(&self) -> String {
        self.0.iter().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Add a tag. Returns `true` if it was not present yet.
    pub fn add(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.0.insert(tag.to_string())
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

// =============================================================================
// ENTITY
// =============================================================================

/// Fields every modeled entity carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    /// Unique key within the entity's registry.
    pub name: String,
    /// Tags of the passes that created or changed this entity.
    #[serde(default)]
    pub source: Provenance,
    /// Bumped by exactly one for every pass that changed content.
    #[serde(default)]
    pub version: u64,
}

impl EntityMeta {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: Provenance::default(),
            version: 0,
        }
    }

    /// Record a content change made by the pass tagged `tag`.
    pub fn record_change(&mut self, tag: &str) {
        self.version = self.version.saturating_add(1);
        self.source.add(tag);
    }

    /// Reset bookkeeping for an entity created from scratch by `tag`.
    pub fn initialize(&mut self, tag: &str) {
        self.version = 0;
        self.source = Provenance::single(tag);
    }
}

/// An entity stored in a [`Registry`](crate::registry::Registry).
pub trait Entity {
    /// A fresh entity with no facts besides its name.
    fn named(name: &str) -> Self;

    fn meta(&self) -> &EntityMeta;

    fn meta_mut(&mut self) -> &mut EntityMeta;

    fn name(&self) -> &str {
        &self.meta().name
    }
}

/// Implements [`Entity`] for a struct with a `meta: EntityMeta` field and a `Default` impl.
macro_rules! impl_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::types::Entity for $ty {
                fn named(name: &str) -> Self {
                    Self {
                        meta: $crate::types::EntityMeta::new(name),
                        ..Self::default()
                    }
                }

                fn meta(&self) -> &$crate::types::EntityMeta {
                    &self.meta
                }

                fn meta_mut(&mut self) -> &mut $crate::types::EntityMeta {
                    &mut self.meta
                }
            }
        )+
    };
}

pub(crate) use impl_entity;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that abort a run.
///
/// Non-fatal findings (conflicts, lookup failures, unmatched tokens) are
/// not errors; they are recorded in [`Diagnostics`](crate::diagnostics::Diagnostics).
#[derive(Debug, Error)]
pub enum ModelError {
    /// The middleware could not be reached, or a required catalog is missing.
    #[error("Fatal startup error: {0}")]
    FatalStartup(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A configuration value is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested output or input format is not supported.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),
}

// =============================================================================
// TESTS
// =============================================================================
