//! # Models
//!
//! The two bank collections produced by a run:
//! - [`DeploymentModel`]: what a running system was observed doing
//! - [`SpecificationModel`]: what the source tree declares
//!
//! [`RosModel`] pairs them for passes that read or write both.

use crate::registry::Registry;
use crate::types::{
    Action, BankKind, Machine, Node, NodeSpecification, PackageSpecification, Parameter, Service,
    Topic, TypeSpecification,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// DEPLOYMENT MODEL
// =============================================================================

/// Entities observed on one running instance.
///
/// Nodes are split across three banks by [`NodeRole`](crate::types::NodeRole);
/// the record type is the same in each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentModel {
    pub nodes: Registry<Node>,
    pub nodelets: Registry<Node>,
    pub nodelet_managers: Registry<Node>,
    pub topics: Registry<Topic>,
    pub actions: Registry<Action>,
    pub services: Registry<Service>,
    pub parameters: Registry<Parameter>,
    pub machines: Registry<Machine>,
}

impl DeploymentModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The node bank for a node bank kind. Other kinds have no node bank.
    #[must_use]
    pub fn node_bank(&self, kind: BankKind) -> Option<&Registry<Node>> {
        match kind {
            BankKind::Node => Some(&self.nodes),
            BankKind::Nodelet => Some(&self.nodelets),
            BankKind::NodeletManager => Some(&self.nodelet_managers),
            BankKind::Topic
            | BankKind::Action
            | BankKind::Service
            | BankKind::Parameter
            | BankKind::Machine
            | BankKind::PackageSpecification
            | BankKind::NodeSpecification
            | BankKind::MessageSpecification
            | BankKind::ServiceSpecification
            | BankKind::ActionSpecification => None,
        }
    }

    /// Find a node by name in any of the three node banks.
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.nodes
            .get(name)
            .or_else(|| self.nodelets.get(name))
            .or_else(|| self.nodelet_managers.get(name))
    }

    /// Every node across the three banks, each bank in name order.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes
            .values()
            .chain(self.nodelets.values())
            .chain(self.nodelet_managers.values())
    }
}

// =============================================================================
// SPECIFICATION MODEL
// =============================================================================

/// Statically derived catalog of expected interfaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationModel {
    pub packages: Registry<PackageSpecification>,
    pub nodes: Registry<NodeSpecification>,
    pub messages: Registry<TypeSpecification>,
    pub services: Registry<TypeSpecification>,
    pub actions: Registry<TypeSpecification>,
}

impl SpecificationModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Specification bank kinds whose registry is empty.
    ///
    /// Interface-type kinds are only required when some package declares
    /// entries of that kind.
    #[must_use]
    pub fn missing_required_banks(&self) -> Vec<BankKind> {
        let declares = |f: fn(&PackageSpecification) -> bool| self.packages.values().any(f);
        let mut missing = Vec::new();
        if self.packages.is_empty() {
            missing.push(BankKind::PackageSpecification);
        }
        if self.nodes.is_empty() {
            missing.push(BankKind::NodeSpecification);
        }
        if self.messages.is_empty() && declares(|p| !p.messages.is_empty()) {
            missing.push(BankKind::MessageSpecification);
        }
        if self.services.is_empty() && declares(|p| !p.services.is_empty()) {
            missing.push(BankKind::ServiceSpecification);
        }
        if self.actions.is_empty() && declares(|p| !p.actions.is_empty()) {
            missing.push(BankKind::ActionSpecification);
        }
        missing
    }
}

// =============================================================================
// COMBINED MODEL
// =============================================================================

/// Deployment and specification models handled together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosModel {
    pub deployment: DeploymentModel,
    pub specification: SpecificationModel,
}

/// Item count of one bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BankCount {
    pub kind: BankKind,
    pub count: usize,
}

impl RosModel {
    #[must_use]
    pub fn new(deployment: DeploymentModel, specification: SpecificationModel) -> Self {
        Self {
            deployment,
            specification,
        }
    }

    /// Number of entities held by the bank of `kind`.
    #[must_use]
    pub fn bank_len(&self, kind: BankKind) -> usize {
        let d = &self.deployment;
        let s = &self.specification;
        match kind {
            BankKind::Node => d.nodes.len(),
            BankKind::Nodelet => d.nodelets.len(),
            BankKind::NodeletManager => d.nodelet_managers.len(),
            BankKind::Topic => d.topics.len(),
            BankKind::Action => d.actions.len(),
            BankKind::Service => d.services.len(),
            BankKind::Parameter => d.parameters.len(),
            BankKind::Machine => d.machines.len(),
            BankKind::PackageSpecification => s.packages.len(),
            BankKind::NodeSpecification => s.nodes.len(),
            BankKind::MessageSpecification => s.messages.len(),
            BankKind::ServiceSpecification => s.services.len(),
            BankKind::ActionSpecification => s.actions.len(),
        }
    }

    /// Item counts for every bank, in [`BankKind::ALL`] order.
    #[must_use]
    pub fn statistics(&self) -> Vec<BankCount> {
        BankKind::ALL
            .iter()
            .map(|&kind| BankCount {
                kind,
                count: self.bank_len(kind),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{MERGER_SOURCE, SNAPSHOT_SOURCE};
    use crate::types::Entity;

    #[test]
    fn specification_with_delimited_source_loads() {
        let mut spec = SpecificationModel::new();
        spec.packages.get_or_create("demo");
        let mut value = serde_json::to_value(&spec).expect("serialize");
        value["packages"]["demo"]["meta"]["source"] =
            serde_json::Value::String(format!("{}, {}", SNAPSHOT_SOURCE, MERGER_SOURCE));
        value["packages"]["demo"]["meta"]["version"] = serde_json::Value::from(2);

        let loaded: SpecificationModel = serde_json::from_value(value).expect("deserialize");
        let demo = loaded.packages.get("demo").expect("package");
        assert_eq!(demo.name(), "demo");
        assert_eq!(demo.meta.source.len(), 2);
        assert!(demo.meta.source.contains(SNAPSHOT_SOURCE));
        assert!(demo.meta.source.contains(MERGER_SOURCE));
        assert_eq!(demo.meta.version, 2);
    }

    #[test]
    fn statistics_cover_every_bank() {
        let mut model = RosModel::default();
        model.deployment.topics.get_or_create("/chatter");
        model.deployment.nodelets.get_or_create("/cam");
        model.specification.nodes.get_or_create("pkg/talker");

        let stats = model.statistics();
        assert_eq!(stats.len(), BankKind::ALL.len());
        assert_eq!(model.bank_len(BankKind::Topic), 1);
        assert_eq!(model.bank_len(BankKind::Nodelet), 1);
        assert_eq!(model.bank_len(BankKind::NodeSpecification), 1);
        assert_eq!(model.bank_len(BankKind::Machine), 0);
    }

    #[test]
    fn find_node_searches_all_role_banks() {
        let mut model = DeploymentModel::new();
        model.nodelet_managers.get_or_create("/manager");
        assert!(model.find_node("/manager").is_some());
        assert!(model.find_node("/absent").is_none());
        assert!(model.node_bank(BankKind::Topic).is_none());
    }

    #[test]
    fn empty_specification_reports_missing_banks() {
        let mut spec = SpecificationModel::new();
        assert_eq!(
            spec.missing_required_banks(),
            vec![BankKind::PackageSpecification, BankKind::NodeSpecification]
        );

        spec.packages.get_or_create("pkg").messages.push("pkg/Foo".to_string());
        spec.nodes.get_or_create("pkg/talker");
        assert_eq!(
            spec.missing_required_banks(),
            vec![BankKind::MessageSpecification]
        );
    }
}
