//! # Human-Readable Report
//!
//! One section per bank: a title, an underline, then every entity in name
//! order as indented `key : value` rows. Lists and maps get one `- ` row per
//! item.

use crate::model::{DeploymentModel, SpecificationModel};
use crate::registry::Registry;
use crate::types::{
    Action, BankKind, Catalog, Entity, IoBinding, IoMap, Machine, Node, NodeRole,
    NodeSpecification, PackageSpecification, Parameter, Service, Topic, TypeSpecification,
};

const FIELD_INDENT: &str = "        ";
const ITEM_INDENT: &str = "            - ";

// =============================================================================
// ROW WRITER
// =============================================================================

/// Accumulates the rows of one entity.
#[derive(Debug, Default)]
pub struct Rows {
    lines: Vec<String>,
}

impl Rows {
    fn header<T: Entity + ?Sized>(entity: &T) -> Self {
        let meta = entity.meta();
        let mut rows = Self::default();
        rows.lines
            .push(format!("  {}", "-".repeat(meta.name.len() + 7)));
        rows.lines.push(format!("   name : {}", meta.name));
        rows.text("source", &meta.source.encoded());
        rows.text("version", &meta.version.to_string());
        rows
    }

    pub fn text(&mut self, key: &str, value: &str) {
        self.lines.push(format!("{}{} : {}", FIELD_INDENT, key, value));
    }

    pub fn optional(&mut self, key: &str, value: Option<&str>) {
        self.text(key, value.unwrap_or("None"));
    }

    pub fn flag(&mut self, key: &str, value: bool) {
        self.text(key, if value { "True" } else { "False" });
    }

    pub fn list<'a>(&mut self, key: &str, items: impl IntoIterator<Item = &'a String>) {
        self.lines.push(format!("{}{} :", FIELD_INDENT, key));
        for item in items {
            self.lines.push(format!("{}{}", ITEM_INDENT, item));
        }
    }

    pub fn catalog(&mut self, key: &str, catalog: Option<&Catalog>) {
        match catalog {
            None => self.text(key, "None"),
            Some(catalog) => {
                self.lines.push(format!("{}{} :", FIELD_INDENT, key));
                for (name, construct_type) in catalog {
                    self.lines
                        .push(format!("{}{} : {}", ITEM_INDENT, name, construct_type));
                }
            }
        }
    }

    pub fn io(&mut self, key: &str, io: &IoMap) {
        self.lines.push(format!("{}{} :", FIELD_INDENT, key));
        for (name, binding) in io {
            self.lines
                .push(format!("{}{} : {}", ITEM_INDENT, name, binding_text(binding)));
        }
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}

fn binding_text(binding: &IoBinding) -> String {
    let construct_type = binding.construct_type.as_deref().unwrap_or("None");
    match binding.remap.as_deref() {
        Some(remap) => format!("{} (as {})", construct_type, remap),
        None => construct_type.to_string(),
    }
}

// =============================================================================
// DESCRIBE
// =============================================================================

/// An entity that can write its own report rows.
pub trait Describe: Entity {
    /// Rows for every field beyond name, source and version.
    fn describe(&self, rows: &mut Rows);

    fn report(&self) -> String {
        let mut rows = Rows::header(self);
        self.describe(&mut rows);
        rows.finish()
    }
}

impl Describe for Node {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("node", self.node.as_deref());
        rows.optional("uri", self.uri.as_deref());
        rows.optional("executable_name", self.executable_name.as_deref());
        rows.optional("executable_file", self.executable_file.as_deref());
        rows.list("cmdline", &self.cmdline);
        rows.optional("launch_file", self.launch_file.as_deref());
        rows.optional(
            "num_threads",
            self.num_threads.map(|n| n.to_string()).as_deref(),
        );
        rows.io("published_topic_names", &self.published_topic_names);
        rows.io("subscribed_topic_names", &self.subscribed_topic_names);
        rows.io("action_servers", &self.action_servers);
        rows.io("action_clients", &self.action_clients);
        rows.io("provided_services", &self.provided_services);
        rows.io("client_services", &self.client_services);
        rows.io("set_parameter_names", &self.set_parameter_names);
        rows.io("read_parameter_names", &self.read_parameter_names);
        match &self.role {
            NodeRole::Plain => {}
            NodeRole::Nodelet {
                manager,
                published_bond_topics,
                subscribed_bond_topics,
            } => {
                rows.optional("nodelet_manager_name", manager.as_deref());
                rows.io("published_bond_topics", published_bond_topics);
                rows.io("subscribed_bond_topics", subscribed_bond_topics);
            }
            NodeRole::Manager {
                nodelets,
                published_bond_topics,
                subscribed_bond_topics,
            } => {
                rows.list("nodelet_names", nodelets);
                rows.io("published_bond_topics", published_bond_topics);
                rows.io("subscribed_bond_topics", subscribed_bond_topics);
            }
        }
    }
}

impl Describe for Topic {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("construct_type", self.construct_type.as_deref());
        rows.list("publisher_node_names", &self.publisher_node_names);
        rows.list("subscriber_node_names", &self.subscriber_node_names);
    }
}

impl Describe for Action {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("construct_type", self.construct_type.as_deref());
        rows.list("client_node_names", &self.client_node_names);
        rows.list("server_node_names", &self.server_node_names);
        rows.catalog("suffix_names_to_topics", Some(&self.suffix_names_to_topics));
    }
}

impl Describe for Service {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("construct_type", self.construct_type.as_deref());
        rows.optional("uri", self.uri.as_deref());
        rows.list(
            "service_provider_node_names",
            &self.service_provider_node_names,
        );
        rows.list("service_client_node_names", &self.service_client_node_names);
    }
}

impl Describe for Parameter {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("value", self.value.as_deref());
        rows.optional("python_type", self.python_type.as_deref());
        rows.optional("launch_file", self.launch_file.as_deref());
        rows.flag("is_node_scope", self.is_node_scope);
        rows.list("setting_node_names", &self.setting_node_names);
        rows.list("reading_node_names", &self.reading_node_names);
    }
}

impl Describe for Machine {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("hostname", self.hostname.as_deref());
        rows.optional("ip_address", self.ip_address.as_deref());
        rows.list("node_names", &self.node_names);
    }
}

impl Describe for PackageSpecification {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("directory_path", self.directory_path.as_deref());
        rows.flag("is_metapackage", self.is_metapackage);
        rows.optional("package_version", self.package_version.as_deref());
        rows.optional("installed_version", self.installed_version.as_deref());
        rows.optional("url", self.url.as_deref());
        rows.optional("description", self.description.as_deref());
        rows.list("dependencies", &self.dependencies);
        rows.list("nodes", &self.nodes);
        rows.list("messages", &self.messages);
        rows.list("services", &self.services);
        rows.list("actions", &self.actions);
        rows.list("launch_files", &self.launch_files);
        rows.list("parameter_files", &self.parameter_files);
    }
}

impl Describe for NodeSpecification {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("package", self.package.as_deref());
        rows.optional("file_path", self.file_path.as_deref());
        rows.flag("validated", self.validated);
        rows.catalog("parameters", self.parameters.as_ref());
        rows.catalog("published_topics", self.published_topics.as_ref());
        rows.catalog("subscribed_topics", self.subscribed_topics.as_ref());
        rows.catalog("services_provided", self.services_provided.as_ref());
        rows.catalog("client_services", self.client_services.as_ref());
        rows.catalog("action_clients", self.action_clients.as_ref());
        rows.catalog("action_servers", self.action_servers.as_ref());
    }
}

impl Describe for TypeSpecification {
    fn describe(&self, rows: &mut Rows) {
        rows.optional("construct_type", self.construct_type.as_deref());
        rows.optional("package", self.package.as_deref());
        rows.optional("file_path", self.file_path.as_deref());
        rows.optional("spec", self.spec.as_deref());
    }
}

// =============================================================================
// BANK REPORTS
// =============================================================================

/// One bank as a titled section.
#[must_use]
pub fn bank_report<T: Describe>(kind: BankKind, registry: &Registry<T>) -> String {
    let title = kind.title();
    let mut sections = vec![title.to_string(), "-".repeat(title.len()), String::new()];
    for entity in registry.values() {
        sections.push(entity.report());
        sections.push(String::new());
    }
    sections.join("\n")
}

/// Every deployment bank, in [`BankKind::ALL`] order.
#[must_use]
pub fn deployment_report(model: &DeploymentModel) -> String {
    [
        bank_report(BankKind::Node, &model.nodes),
        bank_report(BankKind::Nodelet, &model.nodelets),
        bank_report(BankKind::NodeletManager, &model.nodelet_managers),
        bank_report(BankKind::Topic, &model.topics),
        bank_report(BankKind::Action, &model.actions),
        bank_report(BankKind::Service, &model.services),
        bank_report(BankKind::Parameter, &model.parameters),
        bank_report(BankKind::Machine, &model.machines),
    ]
    .join("\n")
}

/// Every specification bank, in [`BankKind::ALL`] order.
#[must_use]
pub fn specification_report(model: &SpecificationModel) -> String {
    [
        bank_report(BankKind::PackageSpecification, &model.packages),
        bank_report(BankKind::NodeSpecification, &model.nodes),
        bank_report(BankKind::MessageSpecification, &model.messages),
        bank_report(BankKind::ServiceSpecification, &model.services),
        bank_report(BankKind::ActionSpecification, &model.actions),
    ]
    .join("\n")
}
