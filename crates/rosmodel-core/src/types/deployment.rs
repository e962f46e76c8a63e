//! # Deployment Entities
//!
//! Entities observed on a running system: nodes, topics, actions, services,
//! parameters and machines.
//!
//! A node's plugin relationship is a [`NodeRole`] tag on the single [`Node`]
//! record, so reclassifying a node never changes its type.

use super::{EntityMeta, impl_entity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// NODE I/O
// =============================================================================

/// One named input or output of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoBinding {
    /// Declared type of the topic, service, parameter or action, if known.
    pub construct_type: Option<String>,
    /// Catalog key this name was matched to during validation.
    pub remap: Option<String>,
}

impl IoBinding {
    #[must_use]
    pub fn typed(construct_type: &str) -> Self {
        Self {
            construct_type: Some(construct_type.to_string()),
            remap: None,
        }
    }
}

/// Name of a topic, service, parameter or action mapped to its binding.
pub type IoMap = BTreeMap<String, IoBinding>;

// =============================================================================
// NODE
// =============================================================================

/// Plugin classification of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// A standalone process.
    #[default]
    Plain,
    /// Hosted inside a manager process.
    Nodelet {
        /// Name of the hosting manager, once linked.
        manager: Option<String>,
        published_bond_topics: IoMap,
        subscribed_bond_topics: IoMap,
    },
    /// Hosts nodelets.
    Manager {
        nodelets: BTreeSet<String>,
        published_bond_topics: IoMap,
        subscribed_bond_topics: IoMap,
    },
}

impl NodeRole {
    #[must_use]
    pub const fn is_nodelet(&self) -> bool {
        matches!(self, NodeRole::Nodelet { .. })
    }

    #[must_use]
    pub const fn is_manager(&self) -> bool {
        matches!(self, NodeRole::Manager { .. })
    }

    /// Bond topics this role publishes, if the role has any.
    #[must_use]
    pub fn published_bond_topics(&self) -> Option<&IoMap> {
        match self {
            NodeRole::Plain => None,
            NodeRole::Nodelet {
                published_bond_topics,
                ..
            }
            | NodeRole::Manager {
                published_bond_topics,
                ..
            } => Some(published_bond_topics),
        }
    }

    /// Bond topics this role subscribes to, if the role has any.
    #[must_use]
    pub fn subscribed_bond_topics(&self) -> Option<&IoMap> {
        match self {
            NodeRole::Plain => None,
            NodeRole::Nodelet {
                subscribed_bond_topics,
                ..
            }
            | NodeRole::Manager {
                subscribed_bond_topics,
                ..
            } => Some(subscribed_bond_topics),
        }
    }
}

/// A running node, nodelet or nodelet manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub meta: EntityMeta,
    /// Name of the node specification this instance runs.
    pub node: Option<String>,
    pub uri: Option<String>,
    pub executable_name: Option<String>,
    pub executable_file: Option<String>,
    pub cmdline: Vec<String>,
    pub launch_file: Option<String>,
    pub num_threads: Option<u32>,
    pub published_topic_names: IoMap,
    pub subscribed_topic_names: IoMap,
    pub action_servers: IoMap,
    pub action_clients: IoMap,
    pub provided_services: IoMap,
    pub client_services: IoMap,
    pub set_parameter_names: IoMap,
    pub read_parameter_names: IoMap,
    pub role: NodeRole,
}

impl Node {
    /// Every topic name this node touches, bond topics included.
    #[must_use]
    pub fn all_topic_names(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self
            .published_topic_names
            .keys()
            .chain(self.subscribed_topic_names.keys())
            .map(String::as_str)
            .collect();
        if let Some(bonds) = self.role.published_bond_topics() {
            names.extend(bonds.keys().map(String::as_str));
        }
        if let Some(bonds) = self.role.subscribed_bond_topics() {
            names.extend(bonds.keys().map(String::as_str));
        }
        names
    }
}

// =============================================================================
// TOPICS, ACTIONS, SERVICES
// =============================================================================

/// A typed publish/subscribe channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub meta: EntityMeta,
    pub construct_type: Option<String>,
    pub publisher_node_names: BTreeSet<String>,
    pub subscriber_node_names: BTreeSet<String>,
}

/// Five conventionally named topics promoted to one request/feedback construct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub meta: EntityMeta,
    /// Shared type prefix, e.g. `pkg/Move` for `pkg/MoveActionGoal`.
    pub construct_type: Option<String>,
    pub client_node_names: BTreeSet<String>,
    pub server_node_names: BTreeSet<String>,
    /// Suffix (`/goal`, ...) mapped to the full topic name it replaced.
    pub suffix_names_to_topics: BTreeMap<String, String>,
}

/// A typed request/response endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub meta: EntityMeta,
    pub construct_type: Option<String>,
    pub uri: Option<String>,
    pub service_provider_node_names: BTreeSet<String>,
    pub service_client_node_names: BTreeSet<String>,
}

// =============================================================================
// PARAMETERS & MACHINES
// =============================================================================

/// A shared key/value entry on the parameter server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub meta: EntityMeta,
    /// Value rendered as text.
    pub value: Option<String>,
    /// Primitive type tag of the value (`int`, `float`, `str`, `bool`, ...).
    pub python_type: Option<String>,
    pub launch_file: Option<String>,
    pub is_node_scope: bool,
    pub setting_node_names: BTreeSet<String>,
    pub reading_node_names: BTreeSet<String>,
}

/// A host running one or more nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub meta: EntityMeta,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub node_names: BTreeSet<String>,
}

impl_entity!(Node, Topic, Action, Service, Parameter, Machine);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entity;

    #[test]
    fn all_topic_names_includes_bonds() {
        let mut node = Node::named("/camera_nodelet");
        node.published_topic_names
            .insert("/image".to_string(), IoBinding::typed("sensor_msgs/Image"));
        let mut bonds = IoMap::new();
        bonds.insert("/mgr/bond".to_string(), IoBinding::typed("bond/Status"));
        node.role = NodeRole::Nodelet {
            manager: None,
            published_bond_topics: bonds,
            subscribed_bond_topics: IoMap::new(),
        };

        let names = node.all_topic_names();
        assert!(names.contains("/image"));
        assert!(names.contains("/mgr/bond"));
        assert!(node.role.is_nodelet());
        assert!(!node.role.is_manager());
    }

    #[test]
    fn named_entity_starts_at_version_zero() {
        let topic = Topic::named("/chatter");
        assert_eq!(topic.name(), "/chatter");
        assert_eq!(topic.meta.version, 0);
        assert!(topic.meta.source.is_empty());
    }
}
