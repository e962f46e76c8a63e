//! # DOT Graph
//!
//! Graphviz rendering of a deployment: nodes, topics and actions, with
//! publish/subscribe and client/server edges. Everything is emitted in name
//! order so two runs over the same model produce the same file.

use crate::model::DeploymentModel;
use std::collections::BTreeSet;
use std::fmt::Write;

fn quoted(id: &str) -> String {
    format!("\"{}\"", id.replace('\\', "\\\\").replace('"', "\\\""))
}

fn node_id(name: &str) -> String {
    quoted(&format!("node-{}", name))
}

fn topic_id(name: &str) -> String {
    quoted(&format!("topic-{}", name))
}

fn action_id(name: &str) -> String {
    quoted(&format!("action-{}", name))
}

/// Render `model` as a `digraph`.
#[must_use]
pub fn deployment_dot(model: &DeploymentModel) -> String {
    let mut out = String::from("digraph rosmodel {\n");

    let node_names: BTreeSet<&str> = model.all_nodes().map(|node| node.meta.name.as_str()).collect();
    for name in &node_names {
        let _ = writeln!(
            out,
            "  {} [label={}, shape=ellipse, color=blue];",
            node_id(name),
            quoted(name)
        );
    }

    for topic in model.topics.values() {
        let name = topic.meta.name.as_str();
        let id = topic_id(name);
        let _ = writeln!(out, "  {} [label={}, shape=box, color=red];", id, quoted(name));
        for publisher in &topic.publisher_node_names {
            let _ = writeln!(out, "  {} -> {};", node_id(publisher), id);
        }
        for subscriber in &topic.subscriber_node_names {
            let _ = writeln!(out, "  {} -> {};", id, node_id(subscriber));
        }
    }

    for action in model.actions.values() {
        let name = action.meta.name.as_str();
        let id = action_id(name);
        let _ = writeln!(
            out,
            "  {} [label={}, shape=diamond, color=purple];",
            id,
            quoted(name)
        );
        for client in &action.client_node_names {
            let _ = writeln!(
                out,
                "  {} -> {} [arrowhead=vee, penwidth=3, color=purple];",
                node_id(client),
                id
            );
        }
        for server in &action.server_node_names {
            let _ = writeln!(
                out,
                "  {} -> {} [arrowhead=vee, penwidth=3, color=purple];",
                id,
                node_id(server)
            );
        }
    }

    out.push_str("}\n");
    out
}
