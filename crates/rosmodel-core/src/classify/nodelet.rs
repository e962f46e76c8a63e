//! Nodelet manager and nodelet detection.

use crate::builders::{BuilderBank, EntityBuilder, NodeBuilder};
use crate::diagnostics::{Diagnostics, Severity};
use crate::primitives::{BOND_TOPIC_TYPE, NODELET_MANAGER_SERVICE_TYPES};
use std::collections::BTreeSet;

/// Plugin classification of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeClass {
    #[default]
    Plain,
    Nodelet,
    Manager,
}

/// Classify a node from the types it publishes and the service types it provides.
///
/// A manager publishes a bond topic and provides all three management
/// services. A nodelet publishes a bond topic and is not a manager.
#[must_use]
pub fn classify_node<'a>(
    published_types: impl IntoIterator<Item = &'a str>,
    service_types: impl IntoIterator<Item = &'a str>,
) -> NodeClass {
    let has_bond = published_types
        .into_iter()
        .any(|kind| kind == BOND_TOPIC_TYPE);
    if !has_bond {
        return NodeClass::Plain;
    }
    let services: BTreeSet<&str> = service_types.into_iter().collect();
    if NODELET_MANAGER_SERVICE_TYPES
        .iter()
        .all(|required| services.contains(required))
    {
        NodeClass::Manager
    } else {
        NodeClass::Nodelet
    }
}

/// Link every nodelet to the manager sharing one of its bond topics.
///
/// Managers are tried in name order; the first match wins. Returns the
/// number of links made.
pub fn link_nodelets(nodes: &mut BuilderBank<NodeBuilder>, diagnostics: &mut Diagnostics) -> usize {
    let managers: Vec<(String, BTreeSet<String>)> = nodes
        .iter()
        .filter(|(_, builder)| builder.is_nodelet_manager())
        .map(|(name, builder)| {
            (
                name.to_string(),
                builder.bond_topics().map(str::to_string).collect(),
            )
        })
        .collect();
    let nodelets: Vec<(String, BTreeSet<String>)> = nodes
        .iter()
        .filter(|(_, builder)| builder.is_nodelet())
        .map(|(name, builder)| {
            (
                name.to_string(),
                builder.bond_topics().map(str::to_string).collect(),
            )
        })
        .collect();

    let mut links = 0;
    for (nodelet, bonds) in &nodelets {
        let manager = managers
            .iter()
            .find(|(_, manager_bonds)| !manager_bonds.is_disjoint(bonds));
        let Some((manager, _)) = manager else {
            diagnostics.note(
                Severity::Warning,
                "nodelet",
                format!("no manager shares a bond topic with nodelet '{}'", nodelet),
            );
            continue;
        };
        if let Some(builder) = nodes.get_mut(nodelet) {
            builder.set_manager(manager);
        }
        if let Some(builder) = nodes.get_mut(manager) {
            builder.add_nodelet(nodelet);
        }
        tracing::debug!(nodelet = %nodelet, manager = %manager, "linked nodelet");
        links += 1;
    }
    links
}

/// Names of nodes in `nodes` classified as managers.
#[must_use]
pub fn manager_names(nodes: &BuilderBank<NodeBuilder>) -> Vec<&str> {
    nodes
        .iter()
        .filter(|(_, builder)| builder.is_nodelet_manager())
        .map(|(_, builder)| builder.name())
        .collect()
}
