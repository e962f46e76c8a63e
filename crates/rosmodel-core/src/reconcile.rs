//! # Reconciliation Engine
//!
//! Merges a [`StaticAnalysis`] into a [`RosModel`], one catalog kind at a
//! time, in a fixed order.
//!
//! For each analyzed entity:
//! 1. Skip it if its name is incomplete (final segment `?`).
//! 2. Search the kind's banks in priority order for the same name.
//! 3. Found: [`merge_into`] with the kind's rule table ([`crate::merge`]).
//! 4. Not found: create it in the kind's creation bank, populate it, and
//!    reset its bookkeeping to version 0 with this engine's tag.

use crate::analysis::{
    AnalyzedNode, AnalyzedNodeType, AnalyzedPackage, AnalyzedParameter, AnalyzedService,
    AnalyzedTopic, Link, StaticAnalysis,
};
use crate::builders::last_segment;
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::merge::{
    ConflictPolicy, FieldRule, MergeMode, Merger, NODE_RULES, NODE_SPEC_RULES, PACKAGE_RULES,
    PARAMETER_RULES, SERVICE_RULES, SERVICE_SPEC_RULES, TOPIC_RULES,
};
use crate::model::{DeploymentModel, RosModel};
use crate::primitives::{BOND_TOPIC_TYPE, INCOMPLETE_NAME_TOKEN, MERGER_SOURCE};
use crate::registry::Registry;
use crate::types::{
    BankKind, Catalog, Entity, IoMap, Node, NodeRole, NodeSpecification, PackageSpecification,
    Parameter, Service, Topic, TypeSpecification,
};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// CATALOG KINDS
// =============================================================================

/// One kind of analyzed entity, with its bank priorities and rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CatalogKind {
    Node,
    Topic,
    Service,
    Parameter,
    NodeSpec,
    PackageSpec,
    ServiceSpec,
}

impl CatalogKind {
    /// Run order.
    pub const ORDER: [CatalogKind; 7] = [
        CatalogKind::Node,
        CatalogKind::Topic,
        CatalogKind::Service,
        CatalogKind::Parameter,
        CatalogKind::NodeSpec,
        CatalogKind::PackageSpec,
        CatalogKind::ServiceSpec,
    ];

    /// Banks searched for an existing entity, first match wins.
    #[must_use]
    pub const fn banks(self) -> &'static [BankKind] {
        match self {
            CatalogKind::Node => &[BankKind::Node, BankKind::Nodelet, BankKind::NodeletManager],
            CatalogKind::Topic => &[BankKind::Topic],
            CatalogKind::Service => &[BankKind::Service],
            CatalogKind::Parameter => &[BankKind::Parameter],
            CatalogKind::NodeSpec => &[BankKind::NodeSpecification],
            CatalogKind::PackageSpec => &[BankKind::PackageSpecification],
            CatalogKind::ServiceSpec => &[BankKind::ServiceSpecification],
        }
    }

    /// Bank new entities go into, unless the source picks another.
    #[must_use]
    pub const fn create_bank(self) -> BankKind {
        match self {
            CatalogKind::Node => BankKind::Node,
            CatalogKind::Topic => BankKind::Topic,
            CatalogKind::Service => BankKind::Service,
            CatalogKind::Parameter => BankKind::Parameter,
            CatalogKind::NodeSpec => BankKind::NodeSpecification,
            CatalogKind::PackageSpec => BankKind::PackageSpecification,
            CatalogKind::ServiceSpec => BankKind::ServiceSpecification,
        }
    }

    #[must_use]
    pub const fn rules(self) -> &'static [FieldRule] {
        match self {
            CatalogKind::Node => NODE_RULES,
            CatalogKind::Topic => TOPIC_RULES,
            CatalogKind::Service => SERVICE_RULES,
            CatalogKind::Parameter => PARAMETER_RULES,
            CatalogKind::NodeSpec => NODE_SPEC_RULES,
            CatalogKind::PackageSpec => PACKAGE_RULES,
            CatalogKind::ServiceSpec => SERVICE_SPEC_RULES,
        }
    }

    /// Log scope.
    #[must_use]
    pub const fn scope(self) -> &'static str {
        match self {
            CatalogKind::Node => "NODE",
            CatalogKind::Topic => "TOPIC",
            CatalogKind::Service => "SERVICE",
            CatalogKind::Parameter => "PARAMETER",
            CatalogKind::NodeSpec => "NODE SPEC",
            CatalogKind::PackageSpec => "PACKAGE SPEC",
            CatalogKind::ServiceSpec => "SERVICE SPEC",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scope())
    }
}

/// Whether the final path segment of `name` is the unresolved placeholder.
#[must_use]
pub fn is_incomplete_name(name: &str) -> bool {
    last_segment(name).trim() == INCOMPLETE_NAME_TOKEN
}

/// Parameter type names as the snapshot records them.
#[must_use]
pub fn normalize_parameter_type(construct_type: &str) -> String {
    construct_type.replace("double", "float").replace("string", "str")
}

// =============================================================================
// MERGE SOURCES
// =============================================================================

/// Deployment facts that node merges consult.
#[derive(Debug, Clone, Default)]
pub struct MergeContext {
    action_topics: BTreeSet<String>,
}

impl MergeContext {
    /// Collect the full topic name of every known action channel.
    #[must_use]
    pub fn from_deployment(deployment: &DeploymentModel) -> Self {
        let action_topics = deployment
            .actions
            .values()
            .flat_map(|action| {
                action
                    .suffix_names_to_topics
                    .keys()
                    .map(move |suffix| format!("{}{}", action.name(), suffix))
            })
            .collect();
        Self { action_topics }
    }

    #[must_use]
    pub fn is_action_topic(&self, topic: &str) -> bool {
        self.action_topics.contains(topic)
    }
}

/// An analyzed entity that merges into one kind of model entity.
pub trait MergeSource {
    type Target: Entity;
    const KIND: CatalogKind;

    /// Name of the model entity this source describes.
    fn target_name(&self) -> &str;

    /// The kind's registries, in [`CatalogKind::banks`] order.
    fn banks(model: &mut RosModel) -> Vec<(BankKind, &mut Registry<Self::Target>)>;

    fn create_in(&self) -> BankKind {
        Self::KIND.create_bank()
    }

    /// Every merge step of the kind.
    fn apply(&self, merger: &mut Merger<'_>, target: &mut Self::Target, context: &MergeContext);

    /// Adjust a freshly created target before it is stored.
    fn created(&self, _target: &mut Self::Target) {}
}

/// Merge `source` into an existing `target`.
///
/// Returns whether anything changed. A change bumps the target's version by
/// exactly one and adds this engine's tag to its provenance.
pub fn merge_into<S: MergeSource>(
    source: &S,
    target: &mut S::Target,
    context: &MergeContext,
    conflicts: ConflictPolicy,
    diagnostics: &mut Diagnostics,
) -> bool {
    let name = target.name().to_string();
    let mut merger = Merger::new(
        S::KIND.scope(),
        &name,
        S::KIND.rules(),
        conflicts,
        MergeMode::Merge,
        diagnostics,
    );
    source.apply(&mut merger, target, context);
    merger.finish(target.meta_mut())
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Outcome counts for one catalog kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    /// Existing entities that changed.
    pub merged: usize,
    /// Existing entities left as they were.
    pub unchanged: usize,
    pub created: usize,
    /// Incomplete names.
    pub skipped: usize,
}

impl CatalogSummary {
    fn record(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Merged(true) => self.merged += 1,
            Resolution::Merged(false) => self.unchanged += 1,
            Resolution::Created => self.created += 1,
            Resolution::Skipped => self.skipped += 1,
        }
    }
}

/// Per-kind outcome counts, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub kinds: Vec<(CatalogKind, CatalogSummary)>,
}

impl ReconcileSummary {
    #[must_use]
    pub fn get(&self, kind: CatalogKind) -> CatalogSummary {
        self.kinds
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, summary)| *summary)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Merged(bool),
    Created,
    Skipped,
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Merge into the first bank holding the source's name, or create it.
fn resolve<S: MergeSource>(
    source: &S,
    banks: &mut [(BankKind, &mut Registry<S::Target>)],
    context: &MergeContext,
    conflicts: ConflictPolicy,
    diagnostics: &mut Diagnostics,
) -> Resolution {
    let name = source.target_name();
    let scope = S::KIND.scope();
    if is_incomplete_name(name) {
        diagnostics.report(Diagnostic::IncompleteName {
            scope: scope.to_string(),
            name: name.to_string(),
        });
        return Resolution::Skipped;
    }

    if let Some((bank, registry)) = banks.iter_mut().find(|(_, registry)| registry.contains(name)) {
        if let Some(target) = registry.get_mut(name) {
            tracing::debug!(scope, bank = %bank, name, "merging");
            let changed = merge_into(source, target, context, conflicts, diagnostics);
            return Resolution::Merged(changed);
        }
    }

    let mut target = S::Target::named(name);
    let mut merger = Merger::new(
        scope,
        name,
        S::KIND.rules(),
        conflicts,
        MergeMode::Populate,
        diagnostics,
    );
    source.apply(&mut merger, &mut target, context);
    merger.finish(target.meta_mut());
    target.meta_mut().initialize(MERGER_SOURCE);
    source.created(&mut target);

    let create_in = source.create_in();
    match banks.iter_mut().find(|(bank, _)| *bank == create_in) {
        Some((_, registry)) => {
            tracing::info!(scope, bank = %create_in, name, "created");
            registry.insert(target);
            Resolution::Created
        }
        None => {
            diagnostics.note(
                Severity::Error,
                scope,
                format!("no '{}' bank to create '{}' in", create_in, name),
            );
            Resolution::Skipped
        }
    }
}

// =============================================================================
// RECONCILER
// =============================================================================

/// Reconciles static analysis into a model.
pub struct Reconciler<'a> {
    model: &'a mut RosModel,
    context: MergeContext,
    conflicts: ConflictPolicy,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        model: &'a mut RosModel,
        conflicts: ConflictPolicy,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        let context = MergeContext::from_deployment(&model.deployment);
        Self {
            model,
            context,
            conflicts,
            diagnostics,
        }
    }

    /// Run every catalog kind in [`CatalogKind::ORDER`].
    pub fn run(&mut self, analysis: &StaticAnalysis) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        for kind in CatalogKind::ORDER {
            let counts = match kind {
                CatalogKind::Node => self.catalog(&analysis.nodes),
                CatalogKind::Topic => self.catalog(&analysis.topics),
                CatalogKind::Service => self.catalog(&analysis.services),
                CatalogKind::Parameter => self.catalog(&analysis.parameters),
                CatalogKind::NodeSpec => self.catalog(&analysis.node_types),
                CatalogKind::PackageSpec => self.catalog(&analysis.packages),
                CatalogKind::ServiceSpec => self.service_specs(analysis),
            };
            tracing::info!(
                scope = kind.scope(),
                merged = counts.merged,
                unchanged = counts.unchanged,
                created = counts.created,
                skipped = counts.skipped,
                "catalog reconciled"
            );
            summary.kinds.push((kind, counts));
        }
        summary
    }

    /// Reconcile every source of one kind, in the given order.
    pub fn catalog<S: MergeSource>(&mut self, sources: &[S]) -> CatalogSummary {
        let mut summary = CatalogSummary::default();
        for source in sources {
            let mut banks = S::banks(self.model);
            let resolution = resolve(
                source,
                &mut banks,
                &self.context,
                self.conflicts,
                self.diagnostics,
            );
            summary.record(resolution);
        }
        summary
    }

    /// Catalog the types of services that have a server.
    pub fn service_specs(&mut self, analysis: &StaticAnalysis) -> CatalogSummary {
        let (served, unserved) = analysis.served_service_types();
        for service in unserved {
            self.diagnostics.note(
                Severity::Info,
                CatalogKind::ServiceSpec.scope(),
                format!("service '{}' has no server; its type is not cataloged", service),
            );
        }
        let served: Vec<ServedType<'_>> = served
            .into_iter()
            .map(|construct_type| ServedType { construct_type })
            .collect();
        self.catalog(&served)
    }
}

// =============================================================================
// PER-KIND MERGE STEPS
// =============================================================================

/// Names that are complete; incomplete ones are reported and dropped.
fn complete_names<'n>(merger: &mut Merger<'_>, names: &'n [String]) -> Vec<&'n str> {
    let scope = merger.scope();
    names
        .iter()
        .filter(|name| {
            if is_incomplete_name(name) {
                merger.diagnostics().report(Diagnostic::IncompleteName {
                    scope: scope.to_string(),
                    name: name.to_string(),
                });
                false
            } else {
                true
            }
        })
        .map(String::as_str)
        .collect()
}

/// Links whose names are complete.
fn complete_links<'n>(merger: &mut Merger<'_>, links: &'n [Link]) -> Vec<&'n Link> {
    let scope = merger.scope();
    links
        .iter()
        .filter(|link| {
            if is_incomplete_name(&link.name) {
                merger.diagnostics().report(Diagnostic::IncompleteName {
                    scope: scope.to_string(),
                    name: link.name.clone(),
                });
                false
            } else {
                true
            }
        })
        .collect()
}

impl MergeSource for AnalyzedNode {
    type Target = Node;
    const KIND: CatalogKind = CatalogKind::Node;

    fn target_name(&self) -> &str {
        &self.name
    }

    fn banks(model: &mut RosModel) -> Vec<(BankKind, &mut Registry<Node>)> {
        let deployment = &mut model.deployment;
        vec![
            (BankKind::Node, &mut deployment.nodes),
            (BankKind::Nodelet, &mut deployment.nodelets),
            (BankKind::NodeletManager, &mut deployment.nodelet_managers),
        ]
    }

    fn create_in(&self) -> BankKind {
        if self.nodelet_class.is_some() {
            BankKind::Nodelet
        } else {
            BankKind::Node
        }
    }

    fn apply(&self, merger: &mut Merger<'_>, node: &mut Node, context: &MergeContext) {
        merger.scalar("node", &mut node.node, Some(self.node_spec_name()));
        merger.fill_list("cmdline", &mut node.cmdline, &self.argv);
        merger.scalar("launch_file", &mut node.launch_file, self.launch_file.as_deref());

        for (field, slot, links) in [
            ("set_parameter_names", &mut node.set_parameter_names, &self.writes),
            ("read_parameter_names", &mut node.read_parameter_names, &self.reads),
            ("provided_services", &mut node.provided_services, &self.servers),
            ("client_services", &mut node.client_services, &self.clients),
        ] {
            for link in complete_links(merger, links) {
                merger.map_entry(field, slot, &link.name, &link.construct_type);
            }
        }

        // Channels already on the node are compared; new ones skip action
        // and bond topics.
        for (field, slot, links) in [
            ("published_topic_names", &mut node.published_topic_names, &self.publishers),
            ("subscribed_topic_names", &mut node.subscribed_topic_names, &self.subscribers),
        ] {
            for link in complete_links(merger, links) {
                if slot.contains_key(&link.name) {
                    merger.map_entry(field, slot, &link.name, &link.construct_type);
                } else if context.is_action_topic(&link.name) {
                    continue;
                } else if link.construct_type == BOND_TOPIC_TYPE {
                    merger.diagnostics().note(
                        Severity::Error,
                        Self::KIND.scope(),
                        format!(
                            "bond topic '{}' of '{}' is not added to the node",
                            link.name, self.name
                        ),
                    );
                } else {
                    merger.map_entry(field, slot, &link.name, &link.construct_type);
                }
            }
        }
    }

    fn created(&self, node: &mut Node) {
        if self.nodelet_class.is_some() {
            node.role = NodeRole::Nodelet {
                manager: None,
                published_bond_topics: IoMap::new(),
                subscribed_bond_topics: IoMap::new(),
            };
        }
    }
}

impl MergeSource for AnalyzedTopic {
    type Target = Topic;
    const KIND: CatalogKind = CatalogKind::Topic;

    fn target_name(&self) -> &str {
        &self.name
    }

    fn banks(model: &mut RosModel) -> Vec<(BankKind, &mut Registry<Topic>)> {
        vec![(BankKind::Topic, &mut model.deployment.topics)]
    }

    fn apply(&self, merger: &mut Merger<'_>, topic: &mut Topic, _context: &MergeContext) {
        merger.scalar(
            "construct_type",
            &mut topic.construct_type,
            Some(self.construct_type.as_str()),
        );
        let publishers = complete_names(merger, &self.publishers);
        merger.set_union("publisher_node_names", &mut topic.publisher_node_names, publishers);
        let subscribers = complete_names(merger, &self.subscribers);
        merger.set_union(
            "subscriber_node_names",
            &mut topic.subscriber_node_names,
            subscribers,
        );
    }
}

impl MergeSource for AnalyzedService {
    type Target = Service;
    const KIND: CatalogKind = CatalogKind::Service;

    fn target_name(&self) -> &str {
        &self.name
    }

    fn banks(model: &mut RosModel) -> Vec<(BankKind, &mut Registry<Service>)> {
        vec![(BankKind::Service, &mut model.deployment.services)]
    }

    fn apply(&self, merger: &mut Merger<'_>, service: &mut Service, _context: &MergeContext) {
        merger.scalar(
            "construct_type",
            &mut service.construct_type,
            Some(self.construct_type.as_str()),
        );
        let servers = complete_names(merger, &self.servers);
        merger.set_union(
            "service_provider_node_names",
            &mut service.service_provider_node_names,
            servers,
        );
        let clients = complete_names(merger, &self.clients);
        merger.set_union(
            "service_client_node_names",
            &mut service.service_client_node_names,
            clients,
        );
    }
}

impl MergeSource for AnalyzedParameter {
    type Target = Parameter;
    const KIND: CatalogKind = CatalogKind::Parameter;

    fn target_name(&self) -> &str {
        &self.name
    }

    fn banks(model: &mut RosModel) -> Vec<(BankKind, &mut Registry<Parameter>)> {
        vec![(BankKind::Parameter, &mut model.deployment.parameters)]
    }

    fn apply(&self, merger: &mut Merger<'_>, parameter: &mut Parameter, _context: &MergeContext) {
        merger.scalar("value", &mut parameter.value, self.value.as_deref());
        merger.scalar("python_type", &mut parameter.python_type, self.python_type.as_deref());
        merger.scalar("launch_file", &mut parameter.launch_file, self.launch_file.as_deref());
        if self.node_scope {
            merger.flag("is_node_scope", &mut parameter.is_node_scope, true);
        }
        let writers = complete_names(merger, &self.writers);
        merger.set_union("setting_node_names", &mut parameter.setting_node_names, writers);
        let readers = complete_names(merger, &self.readers);
        merger.set_union("reading_node_names", &mut parameter.reading_node_names, readers);
    }
}

impl MergeSource for AnalyzedNodeType {
    type Target = NodeSpecification;
    const KIND: CatalogKind = CatalogKind::NodeSpec;

    fn target_name(&self) -> &str {
        self.spec_name()
    }

    fn banks(model: &mut RosModel) -> Vec<(BankKind, &mut Registry<NodeSpecification>)> {
        vec![(BankKind::NodeSpecification, &mut model.specification.nodes)]
    }

    fn apply(&self, merger: &mut Merger<'_>, spec: &mut NodeSpecification, _context: &MergeContext) {
        merger.scalar("package", &mut spec.package, Some(self.package.as_str()));

        let mut parameter_calls = complete_links(merger, &self.write_param);
        parameter_calls.extend(complete_links(merger, &self.read_param));
        if !parameter_calls.is_empty() {
            let catalog = spec.parameters.get_or_insert_with(Catalog::new);
            for call in parameter_calls {
                let construct_type = normalize_parameter_type(&call.construct_type);
                merger.map_entry("parameters", catalog, &call.name, &construct_type);
            }
        }

        for (field, slot, calls) in [
            ("services_provided", &mut spec.services_provided, &self.service),
            ("client_services", &mut spec.client_services, &self.client),
        ] {
            let calls = complete_links(merger, calls);
            if calls.is_empty() {
                continue;
            }
            let catalog = slot.get_or_insert_with(Catalog::new);
            for call in calls {
                merger.map_entry(field, catalog, &call.name, &call.construct_type);
            }
        }

        // Topics are keyed by their final segment.
        for (field, slot, calls) in [
            ("published_topics", &mut spec.published_topics, &self.advertise),
            ("subscribed_topics", &mut spec.subscribed_topics, &self.subscribe),
        ] {
            let calls = complete_links(merger, calls);
            if calls.is_empty() {
                continue;
            }
            let catalog = slot.get_or_insert_with(Catalog::new);
            for call in calls {
                merger.map_entry(field, catalog, last_segment(&call.name), &call.construct_type);
            }
        }
    }
}

impl MergeSource for AnalyzedPackage {
    type Target = PackageSpecification;
    const KIND: CatalogKind = CatalogKind::PackageSpec;

    fn target_name(&self) -> &str {
        self.spec_name()
    }

    fn banks(model: &mut RosModel) -> Vec<(BankKind, &mut Registry<PackageSpecification>)> {
        vec![(BankKind::PackageSpecification, &mut model.specification.packages)]
    }

    fn apply(
        &self,
        merger: &mut Merger<'_>,
        spec: &mut PackageSpecification,
        _context: &MergeContext,
    ) {
        merger.scalar("directory_path", &mut spec.directory_path, self.path.as_deref());
        merger.scalar("installed_version", &mut spec.installed_version, self.version.as_deref());
        merger.flag("is_metapackage", &mut spec.is_metapackage, self.is_metapackage);
        merger.scalar("url", &mut spec.url, self.vcs_url.as_deref());
        merger.scalar("description", &mut spec.description, self.description.as_deref());
        let dependencies = complete_names(merger, &self.dependencies);
        merger.append_unique("dependencies", &mut spec.dependencies, dependencies);
        let nodes = complete_names(merger, &self.nodes);
        merger.append_unique("nodes", &mut spec.nodes, nodes);
    }
}

/// A service type with at least one server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServedType<'a> {
    pub construct_type: &'a str,
}

impl MergeSource for ServedType<'_> {
    type Target = TypeSpecification;
    const KIND: CatalogKind = CatalogKind::ServiceSpec;

    fn target_name(&self) -> &str {
        self.construct_type
    }

    fn banks(model: &mut RosModel) -> Vec<(BankKind, &mut Registry<TypeSpecification>)> {
        vec![(BankKind::ServiceSpecification, &mut model.specification.services)]
    }

    /// An entry that already has a type is left alone.
    fn apply(&self, merger: &mut Merger<'_>, spec: &mut TypeSpecification, _context: &MergeContext) {
        if spec.construct_type.is_some() {
            merger.diagnostics().note(
                Severity::Info,
                Self::KIND.scope(),
                format!("service spec '{}' already cataloged", self.construct_type),
            );
            return;
        }
        let package = self
            .construct_type
            .split_once('/')
            .map(|(package, _)| package)
            .filter(|package| !package.is_empty());
        merger.scalar("construct_type", &mut spec.construct_type, Some(self.construct_type));
        merger.scalar("package", &mut spec.package, package);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;

    fn model_with_topic(name: &str, construct_type: &str) -> RosModel {
        let mut model = RosModel::default();
        let topic = model.deployment.topics.get_or_create(name);
        topic.construct_type = Some(construct_type.to_string());
        model
    }

    #[test]
    fn incomplete_names() {
        assert!(is_incomplete_name("/ns/?"));
        assert!(is_incomplete_name("/ns/ ? "));
        assert!(!is_incomplete_name("/ns/a?"));
        assert!(!is_incomplete_name("/?/topic"));
    }

    #[test]
    fn parameter_types_are_normalized() {
        assert_eq!(normalize_parameter_type("double"), "float");
        assert_eq!(normalize_parameter_type("string"), "str");
        assert_eq!(normalize_parameter_type("int"), "int");
    }

    #[test]
    fn source_banks_follow_kind_priority() {
        fn kinds<S: MergeSource>(model: &mut RosModel) -> Vec<BankKind> {
            S::banks(model).into_iter().map(|(kind, _)| kind).collect()
        }
        let mut model = RosModel::default();
        assert_eq!(kinds::<AnalyzedNode>(&mut model), CatalogKind::Node.banks());
        assert_eq!(kinds::<AnalyzedTopic>(&mut model), CatalogKind::Topic.banks());
        assert_eq!(kinds::<AnalyzedService>(&mut model), CatalogKind::Service.banks());
        assert_eq!(kinds::<AnalyzedParameter>(&mut model), CatalogKind::Parameter.banks());
        assert_eq!(kinds::<AnalyzedNodeType>(&mut model), CatalogKind::NodeSpec.banks());
        assert_eq!(kinds::<AnalyzedPackage>(&mut model), CatalogKind::PackageSpec.banks());
        assert_eq!(kinds::<ServedType<'static>>(&mut model), CatalogKind::ServiceSpec.banks());
        for kind in CatalogKind::ORDER {
            assert!(kind.banks().contains(&kind.create_bank()));
        }
    }

    #[test]
    fn topic_type_conflict_keeps_deployed_value() {
        let mut model = model_with_topic("/scan", "A/C");
        let mut diagnostics = Diagnostics::new();
        let topics = vec![AnalyzedTopic {
            name: "/scan".to_string(),
            construct_type: "A/B".to_string(),
            ..AnalyzedTopic::default()
        }];

        let summary = Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .catalog(&topics);

        let scan = model.deployment.topics.get("/scan").expect("topic");
        assert_eq!(scan.construct_type.as_deref(), Some("A/C"));
        assert_eq!(scan.meta.version, 0);
        assert_eq!(diagnostics.conflicts().count(), 1);
        assert_eq!(summary.unchanged, 1);
    }

    #[test]
    fn merge_into_bumps_version_once() {
        let mut topic = Topic::named("/chatter");
        let mut diagnostics = Diagnostics::new();
        let source = AnalyzedTopic {
            name: "/chatter".to_string(),
            construct_type: "std_msgs/String".to_string(),
            publishers: vec!["/a".to_string(), "/b".to_string()],
            subscribers: vec!["/c".to_string()],
        };
        let context = MergeContext::default();

        let first = merge_into(
            &source,
            &mut topic,
            &context,
            ConflictPolicy::KeepDeployed,
            &mut diagnostics,
        );
        let second = merge_into(
            &source,
            &mut topic,
            &context,
            ConflictPolicy::KeepDeployed,
            &mut diagnostics,
        );

        assert!(first);
        assert!(!second);
        assert_eq!(topic.meta.version, 1);
        assert_eq!(topic.meta.source.encoded(), MERGER_SOURCE);
        // Compare-only fields are never filled on an existing entity.
        assert!(topic.construct_type.is_none());
    }

    #[test]
    fn missing_entity_is_created_with_merger_tag() {
        let mut model = RosModel::default();
        let mut diagnostics = Diagnostics::new();
        let topics = vec![AnalyzedTopic {
            name: "/cmd_vel".to_string(),
            construct_type: "geometry_msgs/Twist".to_string(),
            publishers: vec!["/teleop".to_string(), "/ns/?".to_string()],
            subscribers: Vec::new(),
        }];

        let summary = Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .catalog(&topics);

        let topic = model.deployment.topics.get("/cmd_vel").expect("created");
        assert_eq!(topic.construct_type.as_deref(), Some("geometry_msgs/Twist"));
        assert_eq!(topic.meta.version, 0);
        assert_eq!(topic.meta.source.encoded(), MERGER_SOURCE);
        assert_eq!(topic.publisher_node_names.len(), 1);
        assert_eq!(summary.created, 1);
        assert_eq!(diagnostics.count_at_least(Severity::Error), 1);
    }

    #[test]
    fn incomplete_entity_is_skipped() {
        let mut model = RosModel::default();
        let mut diagnostics = Diagnostics::new();
        let topics = vec![AnalyzedTopic {
            name: "/robot/?".to_string(),
            ..AnalyzedTopic::default()
        }];

        let summary = Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .catalog(&topics);

        assert!(model.deployment.topics.is_empty());
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn node_merge_skips_action_and_bond_topics() {
        let mut model = RosModel::default();
        model.deployment.nodes.get_or_create("/planner");
        let action: &mut Action = model.deployment.actions.get_or_create("/move_base");
        action
            .suffix_names_to_topics
            .insert("/goal".to_string(), "/move_base/goal".to_string());
        let mut diagnostics = Diagnostics::new();
        let nodes = vec![AnalyzedNode {
            name: "/planner".to_string(),
            node_type: "node:nav/planner".to_string(),
            publishers: vec![
                Link::new("/move_base/goal", "nav/MoveBaseActionGoal"),
                Link::new("/planner/bond", BOND_TOPIC_TYPE),
                Link::new("/plan", "nav_msgs/Path"),
            ],
            ..AnalyzedNode::default()
        }];

        let summary = Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .catalog(&nodes);

        let planner = model.deployment.nodes.get("/planner").expect("node");
        assert_eq!(planner.node.as_deref(), Some("nav/planner"));
        assert_eq!(
            planner.published_topic_names.keys().collect::<Vec<_>>(),
            vec!["/plan"]
        );
        assert_eq!(planner.meta.version, 1);
        assert_eq!(summary.merged, 1);
    }

    #[test]
    fn existing_nodelet_is_found_in_its_bank() {
        let mut model = RosModel::default();
        model.deployment.nodelets.get_or_create("/camera/rectify");
        let mut diagnostics = Diagnostics::new();
        let nodes = vec![AnalyzedNode {
            name: "/camera/rectify".to_string(),
            launch_file: Some("camera.launch".to_string()),
            ..AnalyzedNode::default()
        }];

        let summary = Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .catalog(&nodes);

        assert_eq!(summary.merged, 1);
        assert!(model.deployment.nodes.is_empty());
    }

    #[test]
    fn nodelet_instances_are_created_in_nodelet_bank() {
        let mut model = RosModel::default();
        let mut diagnostics = Diagnostics::new();
        let nodes = vec![AnalyzedNode {
            name: "/camera/rectify".to_string(),
            node_type: "node:image_proc/rectify".to_string(),
            nodelet_class: Some("image_proc/RectifyNodelet".to_string()),
            ..AnalyzedNode::default()
        }];

        Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .catalog(&nodes);

        let nodelet = model
            .deployment
            .nodelets
            .get("/camera/rectify")
            .expect("nodelet");
        assert!(nodelet.role.is_nodelet());
        assert!(model.deployment.nodes.is_empty());
    }

    #[test]
    fn node_spec_catalogs_use_final_segment_and_normalized_types() {
        let mut model = RosModel::default();
        let mut diagnostics = Diagnostics::new();
        let node_types = vec![AnalyzedNodeType {
            id: "node:demo/talker".to_string(),
            package: "demo".to_string(),
            advertise: vec![Link::new("/ns/chatter", "std_msgs/String")],
            read_param: vec![Link::new("rate", "double")],
            ..AnalyzedNodeType::default()
        }];

        Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .catalog(&node_types);

        let spec = model.specification.nodes.get("demo/talker").expect("spec");
        assert_eq!(spec.package.as_deref(), Some("demo"));
        let published = spec.published_topics.as_ref().expect("topics");
        assert_eq!(
            published.get("chatter").map(String::as_str),
            Some("std_msgs/String")
        );
        let parameters = spec.parameters.as_ref().expect("parameters");
        assert_eq!(parameters.get("rate").map(String::as_str), Some("float"));
        assert!(spec.subscribed_topics.is_none());
    }

    #[test]
    fn package_nodes_go_to_nodes() {
        let mut model = RosModel::default();
        model.specification.packages.get_or_create("demo");
        let mut diagnostics = Diagnostics::new();
        let packages = vec![AnalyzedPackage {
            id: "package:demo".to_string(),
            dependencies: vec!["roscpp".to_string()],
            nodes: vec!["talker".to_string()],
            ..AnalyzedPackage::default()
        }];

        Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .catalog(&packages);

        let demo = model.specification.packages.get("demo").expect("package");
        assert_eq!(demo.nodes, vec!["talker".to_string()]);
        assert_eq!(demo.dependencies, vec!["roscpp".to_string()]);
        assert_eq!(demo.meta.version, 1);
    }

    #[test]
    fn run_visits_every_kind_in_order() {
        let mut model = RosModel::default();
        let mut diagnostics = Diagnostics::new();
        let analysis = StaticAnalysis {
            services: vec![AnalyzedService {
                name: "/add".to_string(),
                construct_type: "demo/Add".to_string(),
                servers: vec!["/server".to_string()],
                clients: Vec::new(),
            }],
            ..StaticAnalysis::default()
        };

        let summary = Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .run(&analysis);

        let kinds: Vec<CatalogKind> = summary.kinds.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, CatalogKind::ORDER.to_vec());
        assert_eq!(summary.get(CatalogKind::Service).created, 1);
        assert_eq!(summary.get(CatalogKind::ServiceSpec).created, 1);
        let spec = model
            .specification
            .services
            .get("demo/Add")
            .expect("service spec");
        assert_eq!(spec.package.as_deref(), Some("demo"));
        assert_eq!(spec.meta.version, 0);
    }

    #[test]
    fn untyped_service_spec_is_filled_through_the_merger() {
        let mut model = RosModel::default();
        model.specification.services.get_or_create("demo/Add");
        let mut diagnostics = Diagnostics::new();
        let analysis = StaticAnalysis {
            services: vec![AnalyzedService {
                name: "/add".to_string(),
                construct_type: "demo/Add".to_string(),
                servers: vec!["/server".to_string()],
                clients: Vec::new(),
            }],
            ..StaticAnalysis::default()
        };

        let summary = Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .run(&analysis);

        let counts = summary.get(CatalogKind::ServiceSpec);
        assert_eq!(counts.merged, 1);
        assert_eq!(counts.unchanged, 0);
        let spec = model
            .specification
            .services
            .get("demo/Add")
            .expect("service spec");
        assert_eq!(spec.construct_type.as_deref(), Some("demo/Add"));
        assert_eq!(spec.package.as_deref(), Some("demo"));
        assert_eq!(spec.meta.version, 1);
        assert!(spec.meta.source.contains(MERGER_SOURCE));

        // A second run finds the type already cataloged.
        let again = Reconciler::new(&mut model, ConflictPolicy::KeepDeployed, &mut diagnostics)
            .run(&analysis);
        assert_eq!(again.get(CatalogKind::ServiceSpec).unchanged, 1);
        let spec = model.specification.services.get("demo/Add").expect("service spec");
        assert_eq!(spec.meta.version, 1);
    }
}
