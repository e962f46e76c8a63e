//! Node builders.
//!
//! A node builder holds everything observed about one node name. Its
//! [`prepare`](NodeBuilder::prepare) pass resolves the URI and process
//! details, classifies the node, and moves bond and action topics out of
//! its regular topic maps.

use super::{BuilderBank, EntityBuilder, TopicBank};
use crate::classify::action::{ActionBuilder, relocate_action_topics};
use crate::classify::nodelet::{NodeClass, classify_node};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::facts::{LookupFailure, MasterClient, ProcessInfo};
use crate::filters::Filters;
use crate::primitives::{BOND_TOPIC_TYPE, SNAPSHOT_SOURCE, UNKNOWN_MACHINE, unknown_node_uri};
use crate::types::{Entity, IoBinding, IoMap, Node, NodeRole, Provenance};
use std::cell::OnceCell;
use std::collections::BTreeSet;

/// Direction of a node's topic use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicRole {
    Published,
    Subscribed,
}

/// Direction of a node's parameter use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterRole {
    Set,
    Read,
}

/// Everything a node needs from the rest of the snapshot while preparing.
pub struct NodeContext<'a> {
    pub client: &'a dyn MasterClient,
    pub filters: &'a Filters,
    /// Topic bank after action extraction.
    pub topics: &'a TopicBank,
    pub actions: &'a BuilderBank<ActionBuilder>,
}

/// Accumulates facts about one node.
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    name: String,
    pub(crate) published: IoMap,
    pub(crate) subscribed: IoMap,
    provided_services: IoMap,
    set_parameters: IoMap,
    read_parameters: IoMap,
    pub(crate) action_clients: IoMap,
    pub(crate) action_servers: IoMap,
    published_bonds: IoMap,
    subscribed_bonds: IoMap,
    uri: Option<String>,
    process: ProcessInfo,
    class: OnceCell<NodeClass>,
    machine: OnceCell<String>,
    manager: Option<String>,
    nodelets: BTreeSet<String>,
}

impl NodeBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------
    // Facts
    // -------------------------------------------------------------------------

    pub fn add_topic_name(&mut self, topic: &str, role: TopicRole, construct_type: &str) {
        let map = match role {
            TopicRole::Published => &mut self.published,
            TopicRole::Subscribed => &mut self.subscribed,
        };
        map.insert(topic.to_string(), IoBinding::typed(construct_type));
    }

    pub fn add_service(&mut self, service: &str, construct_type: &str) {
        self.provided_services
            .insert(service.to_string(), IoBinding::typed(construct_type));
    }

    pub fn add_parameter(&mut self, parameter: &str, role: ParameterRole, python_type: Option<&str>) {
        let map = match role {
            ParameterRole::Set => &mut self.set_parameters,
            ParameterRole::Read => &mut self.read_parameters,
        };
        map.insert(
            parameter.to_string(),
            IoBinding {
                construct_type: python_type.map(str::to_string),
                remap: None,
            },
        );
    }

    // -------------------------------------------------------------------------
    // Derived properties
    // -------------------------------------------------------------------------

    /// Plugin classification, computed once.
    pub fn class(&self) -> NodeClass {
        *self.class.get_or_init(|| {
            let published = self
                .published
                .values()
                .chain(self.published_bonds.values())
                .filter_map(|binding| binding.construct_type.as_deref());
            let services = self
                .provided_services
                .values()
                .filter_map(|binding| binding.construct_type.as_deref());
            classify_node(published, services)
        })
    }

    pub fn is_nodelet_manager(&self) -> bool {
        self.class() == NodeClass::Manager
    }

    pub fn is_nodelet(&self) -> bool {
        self.class() == NodeClass::Nodelet
    }

    /// URI resolved during prepare, or the placeholder.
    #[must_use]
    pub fn uri(&self) -> String {
        self.uri.clone().unwrap_or_else(|| unknown_node_uri(&self.name))
    }

    /// Host part of the URI, computed once.
    ///
    /// `http://host:11311/` → `host`. Placeholder URIs give [`UNKNOWN_MACHINE`].
    pub fn machine(&self) -> &str {
        self.machine.get_or_init(|| machine_from_uri(&self.uri()))
    }

    /// Bond topics across both directions.
    pub fn bond_topics(&self) -> impl Iterator<Item = &str> {
        self.published_bonds
            .keys()
            .chain(self.subscribed_bonds.keys())
            .map(String::as_str)
    }

    pub(crate) fn set_manager(&mut self, manager: &str) {
        self.manager = Some(manager.to_string());
    }

    pub(crate) fn add_nodelet(&mut self, nodelet: &str) {
        self.nodelets.insert(nodelet.to_string());
    }

    // -------------------------------------------------------------------------
    // Prepare
    // -------------------------------------------------------------------------

    /// Resolve lookups, classify, and relocate bond and action topics.
    pub fn prepare(&mut self, context: &NodeContext<'_>, diagnostics: &mut Diagnostics) {
        self.published
            .retain(|topic, _| !context.filters.topics.should_exclude(topic));
        self.subscribed
            .retain(|topic, _| !context.filters.topics.should_exclude(topic));
        self.provided_services.retain(|_, binding| {
            binding
                .construct_type
                .as_deref()
                .is_none_or(|kind| !context.filters.service_types.should_exclude(kind))
        });

        self.resolve_lookups(context.client, diagnostics);

        if self.class() != NodeClass::Plain {
            move_bond_topics(&mut self.published, &mut self.published_bonds);
            move_bond_topics(&mut self.subscribed, &mut self.subscribed_bonds);
        }

        relocate_action_topics(self, context.topics, context.actions, diagnostics);
    }

    fn resolve_lookups(&mut self, client: &dyn MasterClient, diagnostics: &mut Diagnostics) {
        match client.node_uri(&self.name) {
            Ok(uri) => self.uri = Some(uri),
            Err(failure) => self.report_failure("node uri", failure, diagnostics),
        }
        match client.node_process(&self.name) {
            Ok(process) => self.process = process,
            Err(failure) => {
                tracing::debug!(node = %self.name, reason = %failure, "process details unavailable");
            }
        }
    }

    fn report_failure(&self, what: &str, failure: LookupFailure, diagnostics: &mut Diagnostics) {
        diagnostics.report(Diagnostic::LookupFailed {
            what: what.to_string(),
            subject: self.name.clone(),
            reason: failure.0,
        });
    }

    fn role(&self) -> NodeRole {
        match self.class() {
            NodeClass::Plain => NodeRole::Plain,
            NodeClass::Nodelet => NodeRole::Nodelet {
                manager: self.manager.clone(),
                published_bond_topics: self.published_bonds.clone(),
                subscribed_bond_topics: self.subscribed_bonds.clone(),
            },
            NodeClass::Manager => NodeRole::Manager {
                nodelets: self.nodelets.clone(),
                published_bond_topics: self.published_bonds.clone(),
                subscribed_bond_topics: self.subscribed_bonds.clone(),
            },
        }
    }
}

impl EntityBuilder for NodeBuilder {
    type Output = Node;

    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self) -> Node {
        let mut node = Node::named(&self.name);
        node.meta.source = Provenance::single(SNAPSHOT_SOURCE);
        node.uri = Some(self.uri());
        node.executable_name = self.process.executable_name.clone();
        node.executable_file = self.process.executable_file.clone();
        node.cmdline = self.process.cmdline.clone();
        node.num_threads = self.process.num_threads;
        node.published_topic_names = self.published.clone();
        node.subscribed_topic_names = self.subscribed.clone();
        node.action_clients = self.action_clients.clone();
        node.action_servers = self.action_servers.clone();
        node.provided_services = self.provided_services.clone();
        node.set_parameter_names = self.set_parameters.clone();
        node.read_parameter_names = self.read_parameters.clone();
        node.role = self.role();
        node
    }
}

fn move_bond_topics(from: &mut IoMap, to: &mut IoMap) {
    let bonds: Vec<String> = from
        .iter()
        .filter(|(_, binding)| binding.construct_type.as_deref() == Some(BOND_TOPIC_TYPE))
        .map(|(topic, _)| topic.clone())
        .collect();
    for topic in bonds {
        if let Some(binding) = from.remove(&topic) {
            to.insert(topic, binding);
        }
    }
}

/// Host of a node URI.
#[must_use]
pub fn machine_from_uri(uri: &str) -> String {
    if uri.contains("UNKNOWN") {
        return UNKNOWN_MACHINE.to_string();
    }
    let tokens: Vec<&str> = uri.split('/').collect();
    let authority = match tokens.as_slice() {
        [.., before, last] if last.is_empty() => *before,
        [.., last] => *last,
        [] => "",
    };
    match authority.split(':').next() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => UNKNOWN_MACHINE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::RecordedFacts;
    use std::collections::BTreeMap;

    fn context<'a>(
        facts: &'a RecordedFacts,
        filters: &'a Filters,
        topics: &'a TopicBank,
        actions: &'a BuilderBank<ActionBuilder>,
    ) -> NodeContext<'a> {
        NodeContext {
            client: facts,
            filters,
            topics,
            actions,
        }
    }

    #[test]
    fn machine_from_uris() {
        assert_eq!(machine_from_uri("http://robot:40123/"), "robot");
        assert_eq!(machine_from_uri("http://10.0.0.2:40123"), "10.0.0.2");
        assert_eq!(machine_from_uri("UNKNOWN URI FOR /n"), UNKNOWN_MACHINE);
        assert_eq!(machine_from_uri(""), UNKNOWN_MACHINE);
    }

    #[test]
    fn missing_uri_uses_placeholder() {
        let facts = RecordedFacts::default();
        let filters = Filters::none();
        let topics = TopicBank::new(BTreeMap::new());
        let actions = BuilderBank::new();
        let mut diagnostics = Diagnostics::new();

        let mut builder = NodeBuilder::new("/talker");
        builder.prepare(&context(&facts, &filters, &topics, &actions), &mut diagnostics);

        assert_eq!(builder.uri(), "UNKNOWN URI FOR /talker");
        assert_eq!(builder.machine(), UNKNOWN_MACHINE);
        assert!(diagnostics
            .events()
            .iter()
            .any(|event| matches!(event, Diagnostic::LookupFailed { what, .. } if what == "node uri")));
    }

    #[test]
    fn prepare_filters_topics_and_debug_services() {
        let facts = RecordedFacts::default();
        let filters = Filters::from_config(&crate::filters::FilterConfig::default());
        let topics = TopicBank::new(BTreeMap::new());
        let actions = BuilderBank::new();
        let mut diagnostics = Diagnostics::new();

        let mut builder = NodeBuilder::new("/talker");
        builder.add_topic_name("/rosout", TopicRole::Published, "rosgraph_msgs/Log");
        builder.add_topic_name("/chatter", TopicRole::Published, "std_msgs/String");
        builder.add_service("/talker/get_loggers", "roscpp/GetLoggers");
        builder.prepare(&context(&facts, &filters, &topics, &actions), &mut diagnostics);

        let node = builder.build();
        assert!(node.published_topic_names.contains_key("/chatter"));
        assert!(!node.published_topic_names.contains_key("/rosout"));
        assert!(node.provided_services.is_empty());
    }

    #[test]
    fn manager_bond_topics_are_moved() {
        let facts = RecordedFacts::default();
        let filters = Filters::none();
        let topics = TopicBank::new(BTreeMap::new());
        let actions = BuilderBank::new();
        let mut diagnostics = Diagnostics::new();

        let mut builder = NodeBuilder::new("/manager");
        builder.add_topic_name("/manager/bond", TopicRole::Published, BOND_TOPIC_TYPE);
        builder.add_topic_name("/manager/bond", TopicRole::Subscribed, BOND_TOPIC_TYPE);
        for (service, kind) in [
            ("/manager/list", "nodelet/NodeletList"),
            ("/manager/load_nodelet", "nodelet/NodeletLoad"),
            ("/manager/unload_nodelet", "nodelet/NodeletUnload"),
        ] {
            builder.add_service(service, kind);
        }
        builder.prepare(&context(&facts, &filters, &topics, &actions), &mut diagnostics);

        let node = builder.build();
        assert!(node.role.is_manager());
        assert!(node.published_topic_names.is_empty());
        assert!(node.subscribed_topic_names.is_empty());
        assert_eq!(node.all_topic_names().len(), 1);
    }

    #[test]
    fn process_details_are_copied() {
        let mut facts = RecordedFacts::default();
        facts.processes.insert(
            "/talker".to_string(),
            ProcessInfo {
                executable_name: Some("talker".to_string()),
                executable_file: Some("/opt/ros/lib/demo/talker".to_string()),
                cmdline: vec!["/opt/ros/lib/demo/talker".to_string()],
                num_threads: Some(4),
            },
        );
        facts
            .node_uris
            .insert("/talker".to_string(), "http://robot:1234/".to_string());
        let filters = Filters::none();
        let topics = TopicBank::new(BTreeMap::new());
        let actions = BuilderBank::new();
        let mut diagnostics = Diagnostics::new();

        let mut builder = NodeBuilder::new("/talker");
        builder.prepare(&context(&facts, &filters, &topics, &actions), &mut diagnostics);
        let node = builder.build();

        assert_eq!(node.num_threads, Some(4));
        assert_eq!(node.executable_name.as_deref(), Some("talker"));
        assert_eq!(builder.machine(), "robot");
        assert!(diagnostics.is_empty());
    }
}
