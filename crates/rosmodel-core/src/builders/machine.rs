//! Machine builders, one per host seen in node URIs.

use super::EntityBuilder;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::facts::MasterClient;
use crate::primitives::{SNAPSHOT_SOURCE, UNKNOWN_HOSTNAME, UNKNOWN_IP_ADDRESS, UNKNOWN_MACHINE};
use crate::types::{Entity, Machine, Provenance};
use std::collections::BTreeSet;
use std::net::IpAddr;

#[derive(Debug, Clone, Default)]
pub struct MachineBuilder {
    name: String,
    hostname: Option<String>,
    ip_address: Option<String>,
    nodes: BTreeSet<String>,
}

impl MachineBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn add_node(&mut self, node: &str) {
        self.nodes.insert(node.to_string());
    }

    /// Resolve hostname and address.
    ///
    /// Without a resolver the machine name itself fills whichever field it
    /// looks like, and the other gets its sentinel.
    pub fn prepare(&mut self, client: &dyn MasterClient, diagnostics: &mut Diagnostics) {
        if self.name == UNKNOWN_MACHINE {
            self.hostname = Some(UNKNOWN_HOSTNAME.to_string());
            self.ip_address = Some(UNKNOWN_IP_ADDRESS.to_string());
            return;
        }
        match client.resolve_host(&self.name) {
            Ok(host) => {
                self.hostname = Some(host.hostname);
                self.ip_address = Some(host.ip_address);
            }
            Err(failure) => {
                diagnostics.report(Diagnostic::LookupFailed {
                    what: "host".to_string(),
                    subject: self.name.clone(),
                    reason: failure.0,
                });
                let (hostname, ip_address) = if self.name.parse::<IpAddr>().is_ok() {
                    (UNKNOWN_HOSTNAME.to_string(), self.name.clone())
                } else {
                    (self.name.clone(), UNKNOWN_IP_ADDRESS.to_string())
                };
                self.hostname = Some(hostname);
                self.ip_address = Some(ip_address);
            }
        }
    }
}

impl EntityBuilder for MachineBuilder {
    type Output = Machine;

    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self) -> Machine {
        let mut machine = Machine::named(&self.name);
        machine.meta.source = Provenance::single(SNAPSHOT_SOURCE);
        machine.hostname = self.hostname.clone();
        machine.ip_address = self.ip_address.clone();
        machine.node_names = self.nodes.clone();
        machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{HostInfo, RecordedFacts};

    #[test]
    fn resolved_host() {
        let mut facts = RecordedFacts::default();
        facts.hosts.insert(
            "robot".to_string(),
            HostInfo {
                hostname: "robot.local".to_string(),
                ip_address: "10.0.0.2".to_string(),
            },
        );
        let mut builder = MachineBuilder::new("robot");
        builder.add_node("/talker");
        builder.prepare(&facts, &mut Diagnostics::new());
        let machine = builder.build();

        assert_eq!(machine.hostname.as_deref(), Some("robot.local"));
        assert_eq!(machine.ip_address.as_deref(), Some("10.0.0.2"));
        assert!(machine.node_names.contains("/talker"));
    }

    #[test]
    fn unresolved_address_keeps_what_it_can() {
        let facts = RecordedFacts::default();
        let mut by_ip = MachineBuilder::new("10.0.0.7");
        by_ip.prepare(&facts, &mut Diagnostics::new());
        let machine = by_ip.build();
        assert_eq!(machine.hostname.as_deref(), Some(UNKNOWN_HOSTNAME));
        assert_eq!(machine.ip_address.as_deref(), Some("10.0.0.7"));

        let mut unknown = MachineBuilder::new(UNKNOWN_MACHINE);
        unknown.prepare(&facts, &mut Diagnostics::new());
        assert_eq!(unknown.build().ip_address.as_deref(), Some(UNKNOWN_IP_ADDRESS));
    }
}
