//! # Static Analysis Input
//!
//! The crawler's view of a workspace: launch-file node instances, the
//! channels they declare, the node types found in source, and packages.
//!
//! Names produced by the crawler may end in `?` when a segment could not be
//! resolved statically; reconciliation skips those.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const NODE_ID_PREFIX: &str = "node:";
const PACKAGE_ID_PREFIX: &str = "package:";

/// A `(name, type)` pair on a node or node type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub name: String,
    #[serde(rename = "type")]
    pub construct_type: String,
}

impl Link {
    #[must_use]
    pub fn new(name: &str, construct_type: &str) -> Self {
        Self {
            name: name.to_string(),
            construct_type: construct_type.to_string(),
        }
    }
}

/// A node instance found in a launch configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzedNode {
    pub name: String,
    /// Node type id, `node:pkg/exe`.
    pub node_type: String,
    pub package: Option<String>,
    pub argv: Vec<String>,
    pub launch_file: Option<String>,
    /// Set when the instance is loaded into a nodelet manager.
    pub nodelet_class: Option<String>,
    pub publishers: Vec<Link>,
    pub subscribers: Vec<Link>,
    pub servers: Vec<Link>,
    pub clients: Vec<Link>,
    pub reads: Vec<Link>,
    pub writes: Vec<Link>,
}

impl AnalyzedNode {
    /// Node type without its id prefix: `pkg/exe`.
    #[must_use]
    pub fn node_spec_name(&self) -> &str {
        strip_id(&self.node_type, NODE_ID_PREFIX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzedTopic {
    pub name: String,
    #[serde(rename = "type")]
    pub construct_type: String,
    pub publishers: Vec<String>,
    pub subscribers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzedService {
    pub name: String,
    #[serde(rename = "type")]
    pub construct_type: String,
    pub servers: Vec<String>,
    pub clients: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzedParameter {
    pub name: String,
    pub value: Option<String>,
    pub python_type: Option<String>,
    pub launch_file: Option<String>,
    pub node_scope: bool,
    pub writers: Vec<String>,
    pub readers: Vec<String>,
}

/// A node type as declared in package source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzedNodeType {
    /// `node:pkg/exe`.
    pub id: String,
    pub package: String,
    pub advertise: Vec<Link>,
    pub subscribe: Vec<Link>,
    pub service: Vec<Link>,
    pub client: Vec<Link>,
    pub read_param: Vec<Link>,
    pub write_param: Vec<Link>,
}

impl AnalyzedNodeType {
    #[must_use]
    pub fn spec_name(&self) -> &str {
        strip_id(&self.id, NODE_ID_PREFIX)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzedPackage {
    /// `package:name`.
    pub id: String,
    pub path: Option<String>,
    pub version: Option<String>,
    pub is_metapackage: bool,
    pub vcs_url: Option<String>,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
    pub nodes: Vec<String>,
}

impl AnalyzedPackage {
    #[must_use]
    pub fn spec_name(&self) -> &str {
        strip_id(&self.id, PACKAGE_ID_PREFIX)
    }
}

/// Everything the crawler extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticAnalysis {
    pub nodes: Vec<AnalyzedNode>,
    pub topics: Vec<AnalyzedTopic>,
    pub services: Vec<AnalyzedService>,
    pub parameters: Vec<AnalyzedParameter>,
    pub node_types: Vec<AnalyzedNodeType>,
    pub packages: Vec<AnalyzedPackage>,
}

impl StaticAnalysis {
    /// Service types that have at least one server, sorted.
    ///
    /// The second set lists services without a server; their types are not
    /// trusted to be real service definitions.
    #[must_use]
    pub fn served_service_types(&self) -> (BTreeSet<&str>, BTreeSet<&str>) {
        let mut served = BTreeSet::new();
        let mut unserved = BTreeSet::new();
        for service in &self.services {
            if service.servers.is_empty() {
                unserved.insert(service.name.as_str());
            } else {
                served.insert(service.construct_type.as_str());
            }
        }
        (served, unserved)
    }
}

fn strip_id<'a>(id: &'a str, prefix: &str) -> &'a str {
    id.strip_prefix(prefix).unwrap_or(id)
}
