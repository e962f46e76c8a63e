//! # Token Matcher
//!
//! Pairs a deployed node's observed I/O with the I/O its node specification
//! declares, and fills unvalidated specifications from the first deployed
//! instance seen.
//!
//! Names rarely agree exactly: a deployed `/cam/exposure` corresponds to a
//! declared `exposure`, and remapped names may not share a segment at all.
//! Matching therefore falls back from exact segment, to substring, to type.

use crate::builders::last_segment;
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::model::{DeploymentModel, SpecificationModel};
use crate::primitives::{INTERPRETER_PREFIX, SNAPSHOT_SOURCE, UNKNOWN_TYPE};
use crate::registry::Registry;
use crate::types::{Catalog, IoMap, Node, NodeSpecification};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// I/O KINDS
// =============================================================================

/// One kind of node I/O that is matched against a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IoKind {
    ReadParameters,
    SetParameters,
    ActionClients,
    ActionServers,
    PublishedTopics,
    SubscribedTopics,
    ProvidedServices,
}

impl IoKind {
    pub const ALL: [IoKind; 7] = [
        IoKind::ReadParameters,
        IoKind::SetParameters,
        IoKind::ActionClients,
        IoKind::ActionServers,
        IoKind::PublishedTopics,
        IoKind::SubscribedTopics,
        IoKind::ProvidedServices,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            IoKind::ReadParameters => "read parameters",
            IoKind::SetParameters => "set parameters",
            IoKind::ActionClients => "action clients",
            IoKind::ActionServers => "action servers",
            IoKind::PublishedTopics => "published topics",
            IoKind::SubscribedTopics => "subscribed topics",
            IoKind::ProvidedServices => "provided services",
        }
    }

    fn node_io(self, node: &mut Node) -> &mut IoMap {
        match self {
            IoKind::ReadParameters => &mut node.read_parameter_names,
            IoKind::SetParameters => &mut node.set_parameter_names,
            IoKind::ActionClients => &mut node.action_clients,
            IoKind::ActionServers => &mut node.action_servers,
            IoKind::PublishedTopics => &mut node.published_topic_names,
            IoKind::SubscribedTopics => &mut node.subscribed_topic_names,
            IoKind::ProvidedServices => &mut node.provided_services,
        }
    }

    /// Read and set parameters share one catalog.
    fn catalog(self, spec: &NodeSpecification) -> Option<&Catalog> {
        match self {
            IoKind::ReadParameters | IoKind::SetParameters => spec.parameters.as_ref(),
            IoKind::ActionClients => spec.action_clients.as_ref(),
            IoKind::ActionServers => spec.action_servers.as_ref(),
            IoKind::PublishedTopics => spec.published_topics.as_ref(),
            IoKind::SubscribedTopics => spec.subscribed_topics.as_ref(),
            IoKind::ProvidedServices => spec.services_provided.as_ref(),
        }
    }

    fn catalog_mut(self, spec: &mut NodeSpecification) -> &mut Option<Catalog> {
        match self {
            IoKind::ReadParameters | IoKind::SetParameters => &mut spec.parameters,
            IoKind::ActionClients => &mut spec.action_clients,
            IoKind::ActionServers => &mut spec.action_servers,
            IoKind::PublishedTopics => &mut spec.published_topics,
            IoKind::SubscribedTopics => &mut spec.subscribed_topics,
            IoKind::ProvidedServices => &mut spec.services_provided,
        }
    }
}

impl fmt::Display for IoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// MATCHING
// =============================================================================

/// Assign a catalog key to every deployed name in `io`, through its `remap`.
///
/// Names are visited in sorted order and each catalog key is consumed at
/// most once. Returns `false` if any name stayed unmatched, or if there is
/// no catalog for a non-empty map.
pub fn match_tokens(
    io: &mut IoMap,
    catalog: Option<&Catalog>,
    node: &str,
    kind: IoKind,
    diagnostics: &mut Diagnostics,
) -> bool {
    for binding in io.values_mut() {
        binding.remap = None;
    }

    let Some(catalog) = catalog else {
        for name in io.keys() {
            report_unmatched(diagnostics, node, kind, name);
        }
        return io.is_empty();
    };

    let mut available: BTreeSet<&str> = catalog.keys().map(String::as_str).collect();
    let mut valid = true;
    for (name, binding) in io.iter_mut() {
        let token = last_segment(name);
        let observed = binding.construct_type.as_deref();
        let same_type = |key: &str| observed.is_some() && catalog.get(key).map(String::as_str) == observed;

        let exact = Some(token).filter(|token| available.contains(*token) && same_type(token));
        let found = exact
            .or_else(|| {
                available
                    .iter()
                    .copied()
                    .find(|key| token.contains(*key) && same_type(key))
            })
            .or_else(|| available.iter().copied().find(|key| same_type(key)));

        match found.and_then(|key| available.take(key)) {
            Some(key) => binding.remap = Some(key.to_string()),
            None => {
                report_unmatched(diagnostics, node, kind, name);
                valid = false;
            }
        }
    }
    valid
}

fn report_unmatched(diagnostics: &mut Diagnostics, node: &str, kind: IoKind, name: &str) {
    diagnostics.report(Diagnostic::UnmatchedToken {
        node: node.to_string(),
        io_kind: kind.label().to_string(),
        name: name.to_string(),
    });
}

/// Verdict for one deployed node against its specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeValidation {
    pub node: String,
    pub spec: String,
    pub valid: bool,
    /// Whether the catalog declares at least as many parameters as the node reads or sets.
    pub parameter_count_ok: bool,
    /// I/O kinds with at least one unmatched name.
    pub failures: Vec<IoKind>,
}

/// Match every I/O kind of `node` against `spec`. Never short-circuits.
pub fn validate_node(
    node: &mut Node,
    spec: &NodeSpecification,
    diagnostics: &mut Diagnostics,
) -> NodeValidation {
    let name = node.meta.name.clone();
    tracing::info!(node = %name, spec = %spec.meta.name, "validating node");

    let declared = spec.parameters.as_ref().map_or(0, Catalog::len);
    let read = node.read_parameter_names.len();
    let set = node.set_parameter_names.len();
    let parameter_count_ok = declared >= read && declared >= set;
    if !parameter_count_ok {
        diagnostics.note(
            Severity::Warning,
            "VALIDATE",
            format!(
                "node '{}' uses more parameters than '{}' declares (read {}, set {}, declared {})",
                name, spec.meta.name, read, set, declared
            ),
        );
    }

    let failures: Vec<IoKind> = IoKind::ALL
        .into_iter()
        .filter(|kind| {
            !match_tokens(
                kind.node_io(node),
                kind.catalog(spec),
                &name,
                *kind,
                diagnostics,
            )
        })
        .collect();

    NodeValidation {
        valid: parameter_count_ok && failures.is_empty(),
        node: name,
        spec: spec.meta.name.clone(),
        parameter_count_ok,
        failures,
    }
}

// =============================================================================
// SPECIFICATION UPDATE
// =============================================================================

/// `token`, or `token_N` with the smallest free `N >= 1`.
#[must_use]
pub fn free_key(catalog: &Catalog, token: &str) -> String {
    if !catalog.contains_key(token) {
        return token.to_string();
    }
    (1_usize..)
        .map(|n| format!("{}_{}", token, n))
        .find(|key| !catalog.contains_key(key))
        .unwrap_or_else(|| token.to_string())
}

/// Fill an unvalidated specification from a deployed node and remap the
/// node's I/O onto the new keys. Existing keys are never overwritten.
pub fn update_specification_from_node(spec: &mut NodeSpecification, node: &mut Node) {
    // A parameter both read and set gets one key.
    let mut parameter_keys: BTreeMap<String, String> = BTreeMap::new();

    for kind in IoKind::ALL {
        let catalog = kind.catalog_mut(spec).get_or_insert_with(Catalog::new);
        let shares_parameters = matches!(kind, IoKind::ReadParameters | IoKind::SetParameters);
        for (name, binding) in kind.node_io(node).iter_mut() {
            if shares_parameters {
                if let Some(key) = parameter_keys.get(name) {
                    binding.remap = Some(key.clone());
                    continue;
                }
            }
            let key = free_key(catalog, last_segment(name));
            let construct_type = binding
                .construct_type
                .clone()
                .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
            catalog.insert(key.clone(), construct_type);
            if shares_parameters {
                parameter_keys.insert(name.clone(), key.clone());
            }
            binding.remap = Some(key);
        }
    }

    spec.validated = true;
    spec.meta.record_change(SNAPSHOT_SOURCE);
    tracing::info!(spec = %spec.meta.name, node = %node.meta.name, "specification filled from deployment");
}

// =============================================================================
// EXECUTABLE INDEX
// =============================================================================

/// Node specification names keyed by their executable file.
#[derive(Debug, Clone, Default)]
pub struct ExecutableIndex {
    files: BTreeMap<String, BTreeSet<String>>,
}

/// What an executable lookup found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecLookup<'a> {
    Found(&'a str),
    Ambiguous(Vec<&'a str>),
    Missing,
}

impl ExecutableIndex {
    #[must_use]
    pub fn from_specs(specs: &Registry<NodeSpecification>) -> Self {
        let mut files: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, spec) in specs.iter() {
            if let Some(file) = spec.file_path.as_deref().filter(|file| !file.is_empty()) {
                files
                    .entry(file.to_string())
                    .or_default()
                    .insert(name.to_string());
            }
        }
        Self { files }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn get(&self, file: &str) -> SpecLookup<'_> {
        match self.files.get(file) {
            None => SpecLookup::Missing,
            Some(specs) if specs.len() == 1 => specs
                .iter()
                .next()
                .map_or(SpecLookup::Missing, |spec| SpecLookup::Found(spec)),
            Some(specs) => SpecLookup::Ambiguous(specs.iter().map(String::as_str).collect()),
        }
    }

    /// Look a node up by its executable file, falling back to its executable name.
    #[must_use]
    pub fn lookup(&self, node: &Node) -> SpecLookup<'_> {
        let primary = executable_key(node).map_or(SpecLookup::Missing, |file| self.get(file));
        match primary {
            SpecLookup::Missing => node
                .executable_name
                .as_deref()
                .map_or(SpecLookup::Missing, |name| self.get(name)),
            found => found,
        }
    }
}

/// The file that identifies a node's executable.
///
/// Interpreted nodes run as `python script ...`, so the script is the key.
#[must_use]
pub fn executable_key(node: &Node) -> Option<&str> {
    let interpreted = node
        .executable_name
        .as_deref()
        .is_some_and(|name| name.starts_with(INTERPRETER_PREFIX));
    if interpreted {
        if let Some(script) = node.cmdline.get(1) {
            return Some(script);
        }
    }
    node.executable_file.as_deref()
}

// =============================================================================
// DEPLOYMENT VALIDATION
// =============================================================================

/// Outcome of validating every plain node in a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub validations: Vec<NodeValidation>,
    /// Specifications filled from a deployed node.
    pub updated_specs: Vec<String>,
    /// Nodes whose executable matched no specification.
    pub unknown: Vec<String>,
    /// Nodes whose executable matched several specifications.
    pub ambiguous: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn invalid(&self) -> impl Iterator<Item = &NodeValidation> {
        self.validations.iter().filter(|validation| !validation.valid)
    }

    #[must_use]
    pub fn all_valid(&self) -> bool {
        self.validations.iter().all(|validation| validation.valid)
    }
}

/// Validate plain nodes against their specifications, or fill specifications
/// that were never validated.
///
/// Nodelets and their managers are not validated.
pub fn validate_deployment(
    deployment: &mut DeploymentModel,
    specification: &mut SpecificationModel,
    diagnostics: &mut Diagnostics,
) -> ValidationReport {
    let index = ExecutableIndex::from_specs(&specification.nodes);
    let mut report = ValidationReport::default();

    tracing::debug!(
        nodelets = deployment.nodelets.len(),
        managers = deployment.nodelet_managers.len(),
        "skipping nodelet validation"
    );

    for node in deployment.nodes.values_mut() {
        let spec_name = match index.lookup(node) {
            SpecLookup::Found(spec) => spec.to_string(),
            SpecLookup::Ambiguous(specs) => {
                diagnostics.note(
                    Severity::Warning,
                    "VALIDATE",
                    format!(
                        "node '{}' matches several specifications ({}); skipped",
                        node.meta.name,
                        specs.join(", ")
                    ),
                );
                report.ambiguous.push(node.meta.name.clone());
                continue;
            }
            SpecLookup::Missing => {
                diagnostics.note(
                    Severity::Error,
                    "VALIDATE",
                    format!(
                        "unknown node '{}' executable '{}'; skipped",
                        node.meta.name,
                        executable_key(node).unwrap_or_default()
                    ),
                );
                report.unknown.push(node.meta.name.clone());
                continue;
            }
        };

        node.node = Some(spec_name.clone());
        let Some(spec) = specification.nodes.get_mut(&spec_name) else {
            continue;
        };
        if spec.validated {
            report.validations.push(validate_node(node, spec, diagnostics));
        } else {
            update_specification_from_node(spec, node);
            report.updated_specs.push(spec_name);
        }
    }

    tracing::info!(
        validated = report.validations.len(),
        invalid = report.invalid().count(),
        updated = report.updated_specs.len(),
        unknown = report.unknown.len(),
        "deployment validated"
    );
    report
}
