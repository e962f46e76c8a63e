//! # Specification Entities
//!
//! Statically derived descriptions of what packages, node executables and
//! interface types declare, independent of any running instance.

use super::{EntityMeta, impl_entity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared name to declared type.
pub type Catalog = BTreeMap<String, String>;

/// A source package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpecification {
    pub meta: EntityMeta,
    pub directory_path: Option<String>,
    pub is_metapackage: bool,
    pub package_version: Option<String>,
    pub installed_version: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub dependencies: Vec<String>,
    pub nodes: Vec<String>,
    pub messages: Vec<String>,
    pub services: Vec<String>,
    pub actions: Vec<String>,
    pub launch_files: Vec<String>,
    pub parameter_files: Vec<String>,
}

/// A node executable and the interface it declares.
///
/// Catalogs are `None` when the source declares nothing for that sub-kind,
/// which is different from declaring an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpecification {
    pub meta: EntityMeta,
    pub package: Option<String>,
    pub file_path: Option<String>,
    /// Set once a deployed instance has been checked against (or used to fill) this entry.
    pub validated: bool,
    pub parameters: Option<Catalog>,
    pub published_topics: Option<Catalog>,
    pub subscribed_topics: Option<Catalog>,
    pub services_provided: Option<Catalog>,
    pub client_services: Option<Catalog>,
    pub action_clients: Option<Catalog>,
    pub action_servers: Option<Catalog>,
}

/// A message, service or action definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpecification {
    pub meta: EntityMeta,
    pub construct_type: Option<String>,
    pub package: Option<String>,
    pub file_path: Option<String>,
    /// Raw definition text.
    pub spec: Option<String>,
}

impl_entity!(PackageSpecification, NodeSpecification, TypeSpecification);
