//! # Merge Policies
//!
//! Declarative per-kind field rules and the [`Merger`] that applies them.
//!
//! Every field a reconciliation step touches is named in its kind's rule
//! table. The merger looks the field up, checks the value shape against the
//! rule's [`MergePolicy`], and records whether anything changed. A merge
//! that changed anything bumps the entity's version exactly once and adds
//! the merger's provenance tag.
//!
//! ## Policies
//!
//! | Policy | Behavior |
//! |---|---|
//! | `FillIfEmpty` | copy when the target is empty; on disagreement apply the [`ConflictPolicy`] |
//! | `CompareOnly` | never copy; log disagreement |
//! | `AppendUnique` | extend a list with unseen items |
//! | `SetUnion` | union of sets |
//! | `MapUnion` | add unseen keys; log type disagreement on shared keys |
//! | `MonotonicCounter` | the version field |

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::primitives::MERGER_SOURCE;
use crate::types::{EntityMeta, IoBinding};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// POLICIES
// =============================================================================

/// How one field combines an incoming value with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    FillIfEmpty,
    CompareOnly,
    AppendUnique,
    SetUnion,
    MapUnion,
    MonotonicCounter,
}

/// What a `FillIfEmpty` field does when both sides hold different values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Keep the observed value and log the conflict.
    #[default]
    KeepDeployed,
    /// Take the specified value, log the conflict, count it as a change.
    PreferSpecified,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::KeepDeployed => f.write_str("keep-deployed"),
            ConflictPolicy::PreferSpecified => f.write_str("prefer-specified"),
        }
    }
}

/// One named field and its policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub policy: MergePolicy,
}

const fn rule(field: &'static str, policy: MergePolicy) -> FieldRule {
    FieldRule { field, policy }
}

const VERSION: FieldRule = rule("version", MergePolicy::MonotonicCounter);

// =============================================================================
// RULE TABLES
// =============================================================================

pub const NODE_RULES: &[FieldRule] = &[
    rule("node", MergePolicy::FillIfEmpty),
    rule("cmdline", MergePolicy::FillIfEmpty),
    rule("launch_file", MergePolicy::FillIfEmpty),
    rule("set_parameter_names", MergePolicy::MapUnion),
    rule("read_parameter_names", MergePolicy::MapUnion),
    rule("provided_services", MergePolicy::MapUnion),
    rule("client_services", MergePolicy::MapUnion),
    rule("published_topic_names", MergePolicy::MapUnion),
    rule("subscribed_topic_names", MergePolicy::MapUnion),
    VERSION,
];

pub const TOPIC_RULES: &[FieldRule] = &[
    rule("construct_type", MergePolicy::CompareOnly),
    rule("publisher_node_names", MergePolicy::SetUnion),
    rule("subscriber_node_names", MergePolicy::SetUnion),
    VERSION,
];

pub const SERVICE_RULES: &[FieldRule] = &[
    rule("construct_type", MergePolicy::CompareOnly),
    rule("service_provider_node_names", MergePolicy::SetUnion),
    rule("service_client_node_names", MergePolicy::SetUnion),
    VERSION,
];

pub const PARAMETER_RULES: &[FieldRule] = &[
    rule("value", MergePolicy::CompareOnly),
    rule("python_type", MergePolicy::CompareOnly),
    rule("launch_file", MergePolicy::FillIfEmpty),
    rule("is_node_scope", MergePolicy::FillIfEmpty),
    rule("setting_node_names", MergePolicy::SetUnion),
    rule("reading_node_names", MergePolicy::SetUnion),
    VERSION,
];

pub const NODE_SPEC_RULES: &[FieldRule] = &[
    rule("package", MergePolicy::CompareOnly),
    rule("parameters", MergePolicy::MapUnion),
    rule("services_provided", MergePolicy::MapUnion),
    rule("client_services", MergePolicy::MapUnion),
    rule("published_topics", MergePolicy::MapUnion),
    rule("subscribed_topics", MergePolicy::MapUnion),
    VERSION,
];

pub const PACKAGE_RULES: &[FieldRule] = &[
    rule("directory_path", MergePolicy::CompareOnly),
    rule("installed_version", MergePolicy::CompareOnly),
    rule("is_metapackage", MergePolicy::CompareOnly),
    rule("url", MergePolicy::FillIfEmpty),
    rule("description", MergePolicy::FillIfEmpty),
    rule("dependencies", MergePolicy::AppendUnique),
    rule("nodes", MergePolicy::AppendUnique),
    VERSION,
];

/// Service specifications only ever gain their type and package.
pub const SERVICE_SPEC_RULES: &[FieldRule] = &[
    rule("construct_type", MergePolicy::FillIfEmpty),
    rule("package", MergePolicy::FillIfEmpty),
    VERSION,
];

// =============================================================================
// TYPED MAP VALUES
// =============================================================================

/// A map value that carries a type name.
pub trait TypedValue {
    fn type_name(&self) -> Option<&str>;
    fn from_type(construct_type: &str) -> Self;
}

impl TypedValue for String {
    fn type_name(&self) -> Option<&str> {
        Some(self)
    }

    fn from_type(construct_type: &str) -> Self {
        construct_type.to_string()
    }
}

impl TypedValue for IoBinding {
    fn type_name(&self) -> Option<&str> {
        self.construct_type.as_deref()
    }

    fn from_type(construct_type: &str) -> Self {
        IoBinding::typed(construct_type)
    }
}

// =============================================================================
// MERGER
// =============================================================================

/// Whether the target already existed or was created for this merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Reconcile into an existing entity.
    Merge,
    /// Fill a freshly created entity; `CompareOnly` fields are copied too.
    Populate,
}

/// Applies one kind's rule table to one entity.
pub struct Merger<'d> {
    scope: &'static str,
    entity: String,
    rules: &'static [FieldRule],
    conflicts: ConflictPolicy,
    mode: MergeMode,
    changed: bool,
    diagnostics: &'d mut Diagnostics,
}

impl<'d> Merger<'d> {
    pub fn new(
        scope: &'static str,
        entity: &str,
        rules: &'static [FieldRule],
        conflicts: ConflictPolicy,
        mode: MergeMode,
        diagnostics: &'d mut Diagnostics,
    ) -> Self {
        Self {
            scope,
            entity: entity.to_string(),
            rules,
            conflicts,
            mode,
            changed: false,
            diagnostics,
        }
    }

    /// Whether any field changed so far.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Log through the merger's sink.
    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut *self.diagnostics
    }

    #[must_use]
    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// Look up `field` and check its policy is one of `accepted`.
    fn policy(&mut self, field: &str, accepted: &[MergePolicy]) -> Option<MergePolicy> {
        let found = self.rules.iter().find(|rule| rule.field == field);
        match found {
            Some(rule) if accepted.contains(&rule.policy) => Some(rule.policy),
            Some(rule) => {
                self.diagnostics.note(
                    Severity::Error,
                    self.scope,
                    format!(
                        "field '{}' has policy {:?}, which does not fit this value",
                        field, rule.policy
                    ),
                );
                None
            }
            None => {
                self.diagnostics.note(
                    Severity::Error,
                    self.scope,
                    format!("field '{}' has no merge rule", field),
                );
                None
            }
        }
    }

    fn conflict(&mut self, field: &str, deployed: &str, specified: &str, overwritten: bool) {
        self.diagnostics.report(Diagnostic::Conflict {
            scope: self.scope.to_string(),
            entity: self.entity.clone(),
            field: field.to_string(),
            deployed: deployed.to_string(),
            specified: specified.to_string(),
            overwritten,
        });
    }

    /// Merge an optional text field.
    pub fn scalar(&mut self, field: &str, slot: &mut Option<String>, incoming: Option<&str>) {
        let Some(policy) = self.policy(field, &[MergePolicy::FillIfEmpty, MergePolicy::CompareOnly])
        else {
            return;
        };
        let Some(incoming) = incoming.map(str::trim).filter(|value| !value.is_empty()) else {
            return;
        };
        let fills = policy == MergePolicy::FillIfEmpty || self.mode == MergeMode::Populate;
        match slot.as_deref() {
            None | Some("") => {
                if fills {
                    *slot = Some(incoming.to_string());
                    self.changed = true;
                }
            }
            Some(current) if current.trim() == incoming => {}
            Some(current) => {
                let overwrite = policy == MergePolicy::FillIfEmpty
                    && self.conflicts == ConflictPolicy::PreferSpecified;
                let current = current.to_string();
                self.conflict(field, &current, incoming, overwrite);
                if overwrite {
                    *slot = Some(incoming.to_string());
                    self.changed = true;
                }
            }
        }
    }

    /// Merge a flag. `false` counts as empty.
    pub fn flag(&mut self, field: &str, slot: &mut bool, incoming: bool) {
        let Some(policy) = self.policy(field, &[MergePolicy::FillIfEmpty, MergePolicy::CompareOnly])
        else {
            return;
        };
        if *slot == incoming {
            return;
        }
        let fills = policy == MergePolicy::FillIfEmpty || self.mode == MergeMode::Populate;
        if !*slot && fills {
            *slot = true;
            self.changed = true;
            return;
        }
        let overwrite =
            policy == MergePolicy::FillIfEmpty && self.conflicts == ConflictPolicy::PreferSpecified;
        self.conflict(field, &slot.to_string(), &incoming.to_string(), overwrite);
        if overwrite {
            *slot = incoming;
            self.changed = true;
        }
    }

    /// Fill an empty list wholesale.
    pub fn fill_list(&mut self, field: &str, slot: &mut Vec<String>, incoming: &[String]) {
        if self.policy(field, &[MergePolicy::FillIfEmpty]).is_none() {
            return;
        }
        if slot.is_empty() && !incoming.is_empty() {
            *slot = incoming.to_vec();
            self.changed = true;
        }
    }

    /// Append items not already present, in order.
    pub fn append_unique<'a>(
        &mut self,
        field: &str,
        slot: &mut Vec<String>,
        incoming: impl IntoIterator<Item = &'a str>,
    ) {
        if self.policy(field, &[MergePolicy::AppendUnique]).is_none() {
            return;
        }
        for item in incoming {
            if !slot.iter().any(|existing| existing == item) {
                slot.push(item.to_string());
                self.changed = true;
            }
        }
    }

    /// Union into a set.
    pub fn set_union<'a>(
        &mut self,
        field: &str,
        slot: &mut BTreeSet<String>,
        incoming: impl IntoIterator<Item = &'a str>,
    ) {
        if self.policy(field, &[MergePolicy::SetUnion]).is_none() {
            return;
        }
        for item in incoming {
            if slot.insert(item.to_string()) {
                self.changed = true;
            }
        }
    }

    /// Add one typed key; compare types when the key already exists.
    pub fn map_entry<V: TypedValue>(
        &mut self,
        field: &str,
        slot: &mut BTreeMap<String, V>,
        key: &str,
        construct_type: &str,
    ) {
        if self.policy(field, &[MergePolicy::MapUnion]).is_none() {
            return;
        }
        match slot.get(key) {
            None => {
                slot.insert(key.to_string(), V::from_type(construct_type));
                self.changed = true;
            }
            Some(existing) => {
                let current = existing.type_name().unwrap_or_default().to_string();
                if current != construct_type {
                    self.conflict(&format!("{}[{}]", field, key), &current, construct_type, false);
                }
            }
        }
    }

    /// Close the merge: bump the version once if anything changed.
    ///
    /// Returns whether anything changed.
    pub fn finish(self, meta: &mut EntityMeta) -> bool {
        let counts = self
            .rules
            .iter()
            .any(|rule| rule.policy == MergePolicy::MonotonicCounter);
        if self.changed && counts {
            meta.record_change(MERGER_SOURCE);
        }
        self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entity, Topic};

    fn merger<'d>(
        rules: &'static [FieldRule],
        conflicts: ConflictPolicy,
        diagnostics: &'d mut Diagnostics,
    ) -> Merger<'d> {
        Merger::new("TOPIC", "/scan", rules, conflicts, MergeMode::Merge, diagnostics)
    }

    #[test]
    fn compare_only_never_copies() {
        let mut diagnostics = Diagnostics::new();
        let mut topic = Topic::named("/scan");
        topic.construct_type = Some("A/C".to_string());

        let mut m = merger(TOPIC_RULES, ConflictPolicy::PreferSpecified, &mut diagnostics);
        m.scalar("construct_type", &mut topic.construct_type, Some("A/B"));
        let changed = m.finish(&mut topic.meta);

        assert!(!changed);
        assert_eq!(topic.construct_type.as_deref(), Some("A/C"));
        assert_eq!(topic.meta.version, 0);
        assert_eq!(diagnostics.conflicts().count(), 1);
    }

    #[test]
    fn fill_if_empty_respects_conflict_policy() {
        for (policy, expected) in [
            (ConflictPolicy::KeepDeployed, "old.launch"),
            (ConflictPolicy::PreferSpecified, "new.launch"),
        ] {
            let mut diagnostics = Diagnostics::new();
            let mut slot = Some("old.launch".to_string());
            let mut m = Merger::new(
                "PARAMETER",
                "/rate",
                PARAMETER_RULES,
                policy,
                MergeMode::Merge,
                &mut diagnostics,
            );
            m.scalar("launch_file", &mut slot, Some("new.launch"));
            assert_eq!(m.changed(), policy == ConflictPolicy::PreferSpecified);
            assert_eq!(slot.as_deref(), Some(expected));
            assert_eq!(diagnostics.conflicts().count(), 1);
        }
    }

    #[test]
    fn changed_merge_bumps_version_once() {
        let mut diagnostics = Diagnostics::new();
        let mut topic = Topic::named("/scan");
        let mut m = merger(TOPIC_RULES, ConflictPolicy::KeepDeployed, &mut diagnostics);
        m.set_union("publisher_node_names", &mut topic.publisher_node_names, ["/a", "/b"]);
        m.set_union("subscriber_node_names", &mut topic.subscriber_node_names, ["/c"]);
        assert!(m.finish(&mut topic.meta));

        assert_eq!(topic.meta.version, 1);
        assert!(topic.meta.source.contains(MERGER_SOURCE));
        assert_eq!(topic.meta.source.len(), 1);
    }

    #[test]
    fn map_union_keeps_existing_type() {
        let mut diagnostics = Diagnostics::new();
        let mut catalog: BTreeMap<String, String> = BTreeMap::new();
        catalog.insert("rate".to_string(), "int".to_string());
        let mut m = Merger::new(
            "NODE SPEC",
            "demo/talker",
            NODE_SPEC_RULES,
            ConflictPolicy::PreferSpecified,
            MergeMode::Merge,
            &mut diagnostics,
        );
        m.map_entry("parameters", &mut catalog, "rate", "float");
        m.map_entry("parameters", &mut catalog, "frame", "str");
        assert!(m.changed());
        assert_eq!(catalog.get("rate").map(String::as_str), Some("int"));
        assert_eq!(catalog.get("frame").map(String::as_str), Some("str"));
        assert_eq!(diagnostics.conflicts().count(), 1);
    }

    #[test]
    fn populate_fills_compare_only_fields() {
        let mut diagnostics = Diagnostics::new();
        let mut slot = None;
        let mut m = Merger::new(
            "TOPIC",
            "/scan",
            TOPIC_RULES,
            ConflictPolicy::KeepDeployed,
            MergeMode::Populate,
            &mut diagnostics,
        );
        m.scalar("construct_type", &mut slot, Some("sensor_msgs/LaserScan"));
        assert!(m.changed());
        assert_eq!(slot.as_deref(), Some("sensor_msgs/LaserScan"));
    }

    #[test]
    fn unknown_field_is_reported_not_applied() {
        let mut diagnostics = Diagnostics::new();
        let mut set = BTreeSet::new();
        let mut m = merger(TOPIC_RULES, ConflictPolicy::KeepDeployed, &mut diagnostics);
        m.set_union("construct_type", &mut set, ["x"]);
        m.set_union("nonexistent", &mut set, ["y"]);
        assert!(!m.changed());
        assert!(set.is_empty());
        assert_eq!(diagnostics.count_at_least(Severity::Error), 2);
    }

    #[test]
    fn append_unique_preserves_order() {
        let mut diagnostics = Diagnostics::new();
        let mut deps = vec!["roscpp".to_string()];
        let mut m = Merger::new(
            "PACKAGE SPEC",
            "demo",
            PACKAGE_RULES,
            ConflictPolicy::KeepDeployed,
            MergeMode::Merge,
            &mut diagnostics,
        );
        m.append_unique("dependencies", &mut deps, ["std_msgs", "roscpp", "rospy"]);
        assert_eq!(deps, vec!["roscpp", "std_msgs", "rospy"]);
    }
}
