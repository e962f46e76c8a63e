//! # Middleware Facts
//!
//! The read-only interface to the running middleware, and a recorded
//! implementation of it.
//!
//! Every method is a blocking call. A failure of one call is a
//! [`LookupFailure`]; callers substitute a sentinel and continue. Only a
//! failure of [`MasterClient::system_state`] aborts a snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single failed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure(pub String);

impl LookupFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel or endpoint name mapped to the node names using it.
pub type NameLists = BTreeMap<String, Vec<String>>;

/// Publishers, subscribers and service providers at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemState {
    pub publishers: NameLists,
    pub subscribers: NameLists,
    pub services: NameLists,
}

/// Nodes that set and read each parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterCallers {
    pub setters: NameLists,
    pub readers: NameLists,
}

/// A parameter's current value and its primitive type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamValue {
    pub value: String,
    pub type_tag: String,
}

/// Process details for a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessInfo {
    pub executable_name: Option<String>,
    pub executable_file: Option<String>,
    pub cmdline: Vec<String>,
    pub num_threads: Option<u32>,
}

/// A resolved host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    pub ip_address: String,
}

// =============================================================================
// MASTER CLIENT TRAIT
// =============================================================================

/// Read-only access to the middleware master.
///
/// The optional lookups have default implementations that report the
/// feature as unavailable.
pub trait MasterClient {
    /// Current publishers, subscribers and service providers.
    fn system_state(&self) -> Result<SystemState, LookupFailure>;

    /// Topic name to declared type.
    fn topic_types(&self) -> Result<BTreeMap<String, String>, LookupFailure>;

    fn parameter_names(&self) -> Result<Vec<String>, LookupFailure>;

    /// Which nodes set and read which parameters.
    fn parameter_callers(&self) -> Result<ParameterCallers, LookupFailure> {
        Err(LookupFailure::new("parameter callers are not tracked"))
    }

    fn node_uri(&self, node: &str) -> Result<String, LookupFailure>;

    fn service_uri(&self, service: &str) -> Result<String, LookupFailure>;

    fn service_type(&self, service: &str) -> Result<String, LookupFailure>;

    fn parameter_value(&self, parameter: &str) -> Result<ParamValue, LookupFailure>;

    fn node_process(&self, _node: &str) -> Result<ProcessInfo, LookupFailure> {
        Err(LookupFailure::new("process inspection is not available"))
    }

    fn resolve_host(&self, _host: &str) -> Result<HostInfo, LookupFailure> {
        Err(LookupFailure::new("host resolution is not available"))
    }
}

// =============================================================================
// RECORDED FACTS
// =============================================================================

/// A captured middleware state, usable as an offline [`MasterClient`].
///
/// Absent entries behave like failed lookups, so a partial capture
/// exercises the same degradation paths as a flaky live system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordedFacts {
    /// `None` models an unreachable master.
    pub system_state: Option<SystemState>,
    pub topic_types: BTreeMap<String, String>,
    pub parameters: BTreeMap<String, ParamValue>,
    pub parameter_callers: Option<ParameterCallers>,
    pub node_uris: BTreeMap<String, String>,
    pub service_uris: BTreeMap<String, String>,
    pub service_types: BTreeMap<String, String>,
    pub processes: BTreeMap<String, ProcessInfo>,
    pub hosts: BTreeMap<String, HostInfo>,
}

fn recorded<T: Clone>(
    map: &BTreeMap<String, T>,
    key: &str,
    what: &str,
) -> Result<T, LookupFailure> {
    map.get(key)
        .cloned()
        .ok_or_else(|| LookupFailure::new(format!("no recorded {} for '{}'", what, key)))
}

impl MasterClient for RecordedFacts {
    fn system_state(&self) -> Result<SystemState, LookupFailure> {
        self.system_state
            .clone()
            .ok_or_else(|| LookupFailure::new("master is unreachable"))
    }

    fn topic_types(&self) -> Result<BTreeMap<String, String>, LookupFailure> {
        Ok(self.topic_types.clone())
    }

    fn parameter_names(&self) -> Result<Vec<String>, LookupFailure> {
        Ok(self.parameters.keys().cloned().collect())
    }

    fn parameter_callers(&self) -> Result<ParameterCallers, LookupFailure> {
        self.parameter_callers
            .clone()
            .ok_or_else(|| LookupFailure::new("parameter callers were not recorded"))
    }

    fn node_uri(&self, node: &str) -> Result<String, LookupFailure> {
        recorded(&self.node_uris, node, "node uri")
    }

    fn service_uri(&self, service: &str) -> Result<String, LookupFailure> {
        recorded(&self.service_uris, service, "service uri")
    }

    fn service_type(&self, service: &str) -> Result<String, LookupFailure> {
        recorded(&self.service_types, service, "service type")
    }

    fn parameter_value(&self, parameter: &str) -> Result<ParamValue, LookupFailure> {
        recorded(&self.parameters, parameter, "parameter value")
    }

    fn node_process(&self, node: &str) -> Result<ProcessInfo, LookupFailure> {
        recorded(&self.processes, node, "process")
    }

    fn resolve_host(&self, host: &str) -> Result<HostInfo, LookupFailure> {
        recorded(&self.hosts, host, "host")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_system_state_is_a_failure() {
        let facts = RecordedFacts::default();
        assert!(facts.system_state().is_err());
        assert!(facts.parameter_callers().is_err());
        assert!(facts.parameter_names().is_ok_and(|names| names.is_empty()));
    }

    #[test]
    fn recorded_lookups() {
        let mut facts = RecordedFacts::default();
        facts
            .node_uris
            .insert("/talker".to_string(), "http://host:1234/".to_string());

        assert_eq!(
            facts.node_uri("/talker"),
            Ok("http://host:1234/".to_string())
        );
        let failure = facts.node_uri("/listener").err();
        assert!(failure.is_some_and(|f| f.0.contains("/listener")));
    }
}
