//! Action grouping.
//!
//! An action is five topics sharing one base name:
//!
//! | Suffix | Published by | Type ending |
//! |---|---|---|
//! | `/goal` | client | `ActionGoal` |
//! | `/cancel` | client | |
//! | `/feedback` | server | `ActionFeedback` |
//! | `/result` | server | `ActionResult` |
//! | `/status` | server | |
//!
//! A cluster becomes an action when it has at least three known suffixes
//! and the three core types agree on one prefix. That prefix is the
//! action's construct type.

use crate::builders::{BuilderBank, EntityBuilder, NodeBuilder, TopicBank, TopicBuilder, split_name};
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::primitives::{
    ACTION_CLIENT_SUFFIXES, ACTION_CORE_SUFFIXES, ACTION_MIN_SUFFIXES, ACTION_ROLE_COUNT,
    ACTION_SERVER_SUFFIXES, SNAPSHOT_SOURCE,
};
use crate::types::{Action, Entity, IoBinding, Provenance};
use std::collections::{BTreeMap, BTreeSet};

/// Whether `suffix` is one of the five action topic suffixes.
#[must_use]
pub fn is_action_suffix(suffix: &str) -> bool {
    ACTION_CLIENT_SUFFIXES.contains(&suffix) || ACTION_SERVER_SUFFIXES.contains(&suffix)
}

/// Shared prefix of the core suffix types, if they agree.
///
/// `types` maps suffix to declared topic type. Returns `None` when a core
/// suffix is missing, its type has the wrong ending, or the prefixes differ.
#[must_use]
pub fn action_construct_type(types: &BTreeMap<&str, &str>) -> Option<String> {
    let mut prefix: Option<&str> = None;
    for (suffix, ending) in ACTION_CORE_SUFFIXES {
        let candidate = types.get(suffix)?.strip_suffix(ending)?;
        match prefix {
            Some(existing) if existing != candidate => return None,
            _ => prefix = Some(candidate),
        }
    }
    prefix.map(str::to_string)
}

// =============================================================================
// ACTION BUILDER
// =============================================================================

/// A validated action cluster and the member topic builders it absorbed.
#[derive(Debug, Clone)]
pub struct ActionBuilder {
    name: String,
    construct_type: String,
    /// Suffix → member topic builder.
    topics: BTreeMap<String, TopicBuilder>,
    clients: BTreeSet<String>,
    servers: BTreeSet<String>,
}

impl ActionBuilder {
    fn new(name: &str, construct_type: String, topics: BTreeMap<String, TopicBuilder>) -> Self {
        Self {
            name: name.to_string(),
            construct_type,
            topics,
            clients: BTreeSet::new(),
            servers: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn construct_type(&self) -> &str {
        &self.construct_type
    }

    #[must_use]
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.topics.contains_key(suffix)
    }

    #[must_use]
    pub fn clients(&self) -> &BTreeSet<String> {
        &self.clients
    }

    #[must_use]
    pub fn servers(&self) -> &BTreeSet<String> {
        &self.servers
    }

    /// Count each node's use of the member topics and keep full matches.
    ///
    /// Publishing a client suffix or subscribing to a server suffix counts
    /// toward the client role; the server role mirrors it. Anything short of
    /// [`ACTION_ROLE_COUNT`] is reported and dropped.
    fn assign_roles(&mut self, diagnostics: &mut Diagnostics) {
        let mut client_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut server_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (suffix, topic) in &self.topics {
            let (towards_client, towards_server) = if ACTION_CLIENT_SUFFIXES.contains(&suffix.as_str()) {
                (topic.publishers(), topic.subscribers())
            } else {
                (topic.subscribers(), topic.publishers())
            };
            for node in towards_client {
                *client_counts.entry(node.as_str()).or_default() += 1;
            }
            for node in towards_server {
                *server_counts.entry(node.as_str()).or_default() += 1;
            }
        }

        for (role, counts, members) in [
            ("client", client_counts, &mut self.clients),
            ("server", server_counts, &mut self.servers),
        ] {
            for (node, count) in counts {
                if count == ACTION_ROLE_COUNT {
                    members.insert(node.to_string());
                } else {
                    diagnostics.report(Diagnostic::PartialActionRole {
                        action: self.name.clone(),
                        node: node.to_string(),
                        role: role.to_string(),
                        count,
                    });
                }
            }
        }
    }
}

impl EntityBuilder for ActionBuilder {
    type Output = Action;

    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self) -> Action {
        let mut action = Action::named(&self.name);
        action.meta.source = Provenance::single(SNAPSHOT_SOURCE);
        action.construct_type = Some(self.construct_type.clone());
        action.client_node_names = self.clients.clone();
        action.server_node_names = self.servers.clone();
        action.suffix_names_to_topics = self
            .topics
            .iter()
            .map(|(suffix, topic)| (suffix.clone(), topic.name().to_string()))
            .collect();
        action
    }
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Promote qualifying topic clusters to actions.
///
/// Member topics of each valid cluster leave `topics`. Invalid clusters are
/// left untouched.
pub fn extract_actions(topics: &mut TopicBank, diagnostics: &mut Diagnostics) -> BuilderBank<ActionBuilder> {
    let mut clusters: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    for (name, _) in topics.builders.iter() {
        let (base, suffix) = split_name(name);
        if is_action_suffix(suffix) {
            clusters
                .entry(base.to_string())
                .or_default()
                .insert(suffix.to_string(), name.to_string());
        }
    }

    let mut actions = BuilderBank::new();
    for (base, members) in clusters {
        if members.len() < ACTION_MIN_SUFFIXES {
            continue;
        }
        let types: BTreeMap<&str, &str> = members
            .iter()
            .map(|(suffix, topic)| (suffix.as_str(), topics.type_of(topic)))
            .collect();
        let Some(construct_type) = action_construct_type(&types) else {
            diagnostics.note(
                Severity::Info,
                "action",
                format!("topics under '{}' do not form a valid action", base),
            );
            continue;
        };

        let absorbed: BTreeMap<String, TopicBuilder> = members
            .iter()
            .filter_map(|(suffix, topic)| {
                topics
                    .builders
                    .remove(topic)
                    .map(|builder| (suffix.clone(), builder))
            })
            .collect();
        let mut builder = ActionBuilder::new(&base, construct_type, absorbed);
        builder.assign_roles(diagnostics);
        tracing::debug!(action = %base, construct_type = %builder.construct_type, "promoted action");
        actions.get_or_insert_with(&base, |_| builder);
    }
    actions
}

/// Move a node's action member topics into its action client/server maps.
///
/// Only topics that left the topic bank are considered. A topic whose
/// action does not list the node in either role stays where it is.
pub(crate) fn relocate_action_topics(
    node: &mut NodeBuilder,
    topics: &TopicBank,
    actions: &BuilderBank<ActionBuilder>,
    diagnostics: &mut Diagnostics,
) {
    let node_name = node.name().to_string();
    let candidates: Vec<String> = node
        .published
        .keys()
        .chain(node.subscribed.keys())
        .filter(|topic| !topics.builders.contains(topic))
        .cloned()
        .collect();

    for topic in candidates {
        let (base, suffix) = split_name(&topic);
        let Some(action) = actions.get(base) else {
            continue;
        };
        if !action.has_suffix(suffix) {
            continue;
        }
        let binding = IoBinding::typed(action.construct_type());
        if action.clients().contains(&node_name) {
            node.action_clients.insert(base.to_string(), binding);
        } else if action.servers().contains(&node_name) {
            node.action_servers.insert(base.to_string(), binding);
        } else {
            diagnostics.note(
                Severity::Warning,
                "action",
                format!(
                    "node '{}' uses topic '{}' of action '{}' without holding a role",
                    node_name, topic, base
                ),
            );
            continue;
        }
        node.published.remove(&topic);
        node.subscribed.remove(&topic);
    }
}
