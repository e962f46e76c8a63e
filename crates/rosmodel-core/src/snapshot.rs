//! # Snapshot Module
//!
//! Fact collection from a [`MasterClient`] into a [`DeploymentModel`].
//!
//! A snapshot runs in three phases:
//! - `gather`: read the system state and feed every builder bank
//! - `prepare`: filter, promote actions, classify nodes, derive machines
//! - `extract`: build entities into their banks
//!
//! Only an unreachable system state is fatal. Every other failed lookup
//! degrades to a sentinel and a diagnostic.

use crate::builders::{
    BuilderBank, EntityBuilder, MachineBuilder, NodeBuilder, NodeContext, ParameterBuilder,
    ParameterRole, ServiceBuilder, TopicBank, TopicRole,
};
use crate::classify::nodelet::manager_names;
use crate::classify::{ActionBuilder, extract_actions, link_nodelets};
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::facts::MasterClient;
use crate::filters::{ExclusionFilter, Filters};
use crate::model::{DeploymentModel, SpecificationModel};
use crate::primitives::UNKNOWN_TYPE;
use crate::types::{ModelError, NodeRole};

/// Builder banks for one snapshot run.
#[derive(Debug, Default)]
pub struct Snapshot {
    nodes: BuilderBank<NodeBuilder>,
    topics: TopicBank,
    actions: BuilderBank<ActionBuilder>,
    services: BuilderBank<ServiceBuilder>,
    parameters: BuilderBank<ParameterBuilder>,
    machines: BuilderBank<MachineBuilder>,
}

impl Snapshot {
    /// Run every phase and return the deployment model.
    ///
    /// # Errors
    /// Returns `ModelError::FatalStartup` if the system state cannot be read.
    pub fn collect(
        client: &dyn MasterClient,
        filters: &Filters,
        diagnostics: &mut Diagnostics,
    ) -> Result<DeploymentModel, ModelError> {
        let mut snapshot = Self::gather(client, diagnostics)?;
        snapshot.prepare(client, filters, diagnostics);
        let model = snapshot.extract();
        tracing::info!(
            nodes = model.nodes.len(),
            nodelets = model.nodelets.len(),
            managers = model.nodelet_managers.len(),
            topics = model.topics.len(),
            actions = model.actions.len(),
            services = model.services.len(),
            parameters = model.parameters.len(),
            "snapshot collected"
        );
        Ok(model)
    }

    // =========================================================================
    // GATHER
    // =========================================================================

    /// Read raw facts into fresh builder banks.
    ///
    /// # Errors
    /// Returns `ModelError::FatalStartup` if the system state cannot be read.
    pub fn gather(
        client: &dyn MasterClient,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, ModelError> {
        let state = client.system_state().map_err(|failure| {
            ModelError::FatalStartup(format!("cannot read system state: {}", failure))
        })?;

        let types = client.topic_types().unwrap_or_else(|failure| {
            report_lookup(diagnostics, "topic types", "/", &failure.0);
            Default::default()
        });

        let mut snapshot = Self {
            topics: TopicBank::new(types),
            ..Self::default()
        };

        // Topics
        for (role, lists) in [
            (TopicRole::Published, &state.publishers),
            (TopicRole::Subscribed, &state.subscribers),
        ] {
            for (topic, node_names) in lists {
                let construct_type = snapshot.topics.type_of(topic).to_string();
                let builder = snapshot.topics.get_or_create(topic);
                for node in node_names {
                    match role {
                        TopicRole::Published => builder.add_publisher(node),
                        TopicRole::Subscribed => builder.add_subscriber(node),
                    }
                }
                for node in node_names {
                    snapshot
                        .nodes
                        .get_or_insert_with(node, NodeBuilder::new)
                        .add_topic_name(topic, role, &construct_type);
                }
            }
        }

        // Services
        for (service, providers) in &state.services {
            let construct_type = client.service_type(service).unwrap_or_else(|failure| {
                report_lookup(diagnostics, "service type", service, &failure.0);
                UNKNOWN_TYPE.to_string()
            });
            let builder = snapshot
                .services
                .get_or_insert_with(service, ServiceBuilder::new);
            builder.set_type(&construct_type);
            for node in providers {
                builder.add_provider(node);
            }
            for node in providers {
                snapshot
                    .nodes
                    .get_or_insert_with(node, NodeBuilder::new)
                    .add_service(service, &construct_type);
            }
        }

        // Parameters
        match client.parameter_names() {
            Ok(names) => {
                for name in names {
                    snapshot
                        .parameters
                        .get_or_insert_with(&name, ParameterBuilder::new);
                }
            }
            Err(failure) => report_lookup(diagnostics, "parameter names", "/", &failure.0),
        }
        match client.parameter_callers() {
            Ok(callers) => {
                for (parameter, node_names) in &callers.setters {
                    let builder = snapshot
                        .parameters
                        .get_or_insert_with(parameter, ParameterBuilder::new);
                    for node in node_names {
                        builder.add_setter(node);
                    }
                }
                for (parameter, node_names) in &callers.readers {
                    let builder = snapshot
                        .parameters
                        .get_or_insert_with(parameter, ParameterBuilder::new);
                    for node in node_names {
                        builder.add_reader(node);
                    }
                }
            }
            Err(failure) => report_lookup(diagnostics, "parameter callers", "/", &failure.0),
        }

        tracing::debug!(
            nodes = snapshot.nodes.len(),
            topics = snapshot.topics.builders.len(),
            services = snapshot.services.len(),
            parameters = snapshot.parameters.len(),
            "facts gathered"
        );
        Ok(snapshot)
    }

    // =========================================================================
    // PREPARE
    // =========================================================================

    /// Filter, classify and derive, in pass order.
    pub fn prepare(
        &mut self,
        client: &dyn MasterClient,
        filters: &Filters,
        diagnostics: &mut Diagnostics,
    ) {
        let Self {
            nodes,
            topics,
            actions,
            services,
            parameters,
            machines,
        } = self;
        let allow_all = ExclusionFilter::allow_all();

        // Actions are promoted before the topic filter, so a filtered member
        // topic cannot break an otherwise valid action.
        *actions = extract_actions(topics, diagnostics);

        topics.builders.prepare(&filters.topics, diagnostics, |_, _| {});

        let dropped = services.retain(|builder| {
            !filters
                .service_types
                .should_exclude(builder.construct_type())
        });
        if dropped > 0 {
            diagnostics.note(
                Severity::Debug,
                "prepare",
                format!("filtered out {} services by type", dropped),
            );
        }
        services.prepare(&allow_all, diagnostics, |builder, diagnostics| {
            builder.prepare(client, diagnostics);
        });

        parameters.prepare(&allow_all, diagnostics, |builder, diagnostics| {
            builder.prepare(client, diagnostics);
        });
        for (name, builder) in parameters.iter() {
            for (role, node_names) in [
                (ParameterRole::Set, builder.setters()),
                (ParameterRole::Read, builder.readers()),
            ] {
                for node in node_names {
                    nodes
                        .get_or_insert_with(node, NodeBuilder::new)
                        .add_parameter(name, role, builder.python_type());
                }
            }
        }

        let context = NodeContext {
            client,
            filters,
            topics: &*topics,
            actions: &*actions,
        };
        nodes.prepare(&filters.nodes, diagnostics, |builder, diagnostics| {
            builder.prepare(&context, diagnostics);
        });
        let links = link_nodelets(nodes, diagnostics);
        tracing::debug!(
            managers = ?manager_names(nodes),
            links,
            "nodelets linked"
        );

        for (name, builder) in nodes.iter() {
            machines
                .get_or_insert_with(builder.machine(), MachineBuilder::new)
                .add_node(name);
        }
        machines.prepare(&allow_all, diagnostics, |builder, diagnostics| {
            builder.prepare(client, diagnostics);
        });
    }

    // =========================================================================
    // EXTRACT
    // =========================================================================

    /// Build every entity. Nodes land in the bank matching their role.
    #[must_use]
    pub fn extract(&self) -> DeploymentModel {
        let mut model = DeploymentModel::new();
        for (_, builder) in self.nodes.iter() {
            let node = builder.build();
            let bank = match node.role {
                NodeRole::Plain => &mut model.nodes,
                NodeRole::Nodelet { .. } => &mut model.nodelets,
                NodeRole::Manager { .. } => &mut model.nodelet_managers,
            };
            bank.insert(node);
        }
        model.topics = self.topics.builders.extract();
        model.actions = self.actions.extract();
        model.services = self.services.extract();
        model.parameters = self.parameters.extract();
        model.machines = self.machines.extract();
        model
    }
}

/// Refuse to validate against a missing or partial catalog.
///
/// # Errors
/// Returns `ModelError::FatalStartup` naming every empty required bank.
pub fn require_specification(specification: &SpecificationModel) -> Result<(), ModelError> {
    let missing = specification.missing_required_banks();
    if missing.is_empty() {
        return Ok(());
    }
    let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
    Err(ModelError::FatalStartup(format!(
        "specification catalog is empty for: {}",
        names.join(", ")
    )))
}

fn report_lookup(diagnostics: &mut Diagnostics, what: &str, subject: &str, reason: &str) {
    diagnostics.report(Diagnostic::LookupFailed {
        what: what.to_string(),
        subject: subject.to_string(),
        reason: reason.to_string(),
    });
}
