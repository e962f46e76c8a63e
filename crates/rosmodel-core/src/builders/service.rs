//! Service builders.

use super::EntityBuilder;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::facts::MasterClient;
use crate::primitives::{SNAPSHOT_SOURCE, UNKNOWN_TYPE, unknown_service_uri};
use crate::types::{Entity, Provenance, Service};
use std::collections::BTreeSet;

/// Accumulates providers of one service.
#[derive(Debug, Clone, Default)]
pub struct ServiceBuilder {
    name: String,
    construct_type: Option<String>,
    uri: Option<String>,
    providers: BTreeSet<String>,
}

impl ServiceBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn add_provider(&mut self, node: &str) {
        self.providers.insert(node.to_string());
    }

    /// Record the declared type. The first recorded type sticks.
    pub fn set_type(&mut self, construct_type: &str) {
        if self.construct_type.is_none() {
            self.construct_type = Some(construct_type.to_string());
        }
    }

    #[must_use]
    pub fn construct_type(&self) -> &str {
        self.construct_type.as_deref().unwrap_or(UNKNOWN_TYPE)
    }

    /// Resolve the service URI, substituting a placeholder on failure.
    pub fn prepare(&mut self, client: &dyn MasterClient, diagnostics: &mut Diagnostics) {
        match client.service_uri(&self.name) {
            Ok(uri) => self.uri = Some(uri),
            Err(failure) => {
                diagnostics.report(Diagnostic::LookupFailed {
                    what: "service uri".to_string(),
                    subject: self.name.clone(),
                    reason: failure.0,
                });
                self.uri = Some(unknown_service_uri(&self.name));
            }
        }
    }
}

impl EntityBuilder for ServiceBuilder {
    type Output = Service;

    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self) -> Service {
        let mut service = Service::named(&self.name);
        service.meta.source = Provenance::single(SNAPSHOT_SOURCE);
        service.construct_type = Some(self.construct_type().to_string());
        service.uri = self.uri.clone();
        service.service_provider_node_names = self.providers.clone();
        service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::RecordedFacts;

    #[test]
    fn unavailable_uri_gets_placeholder() {
        let mut builder = ServiceBuilder::new("/add_two_ints");
        builder.set_type("demo/AddTwoInts");
        builder.add_provider("/server");
        let mut diagnostics = Diagnostics::new();

        builder.prepare(&RecordedFacts::default(), &mut diagnostics);
        let service = builder.build();

        assert_eq!(
            service.uri.as_deref(),
            Some("Service URI /add_two_ints is unavailable")
        );
        assert_eq!(service.construct_type.as_deref(), Some("demo/AddTwoInts"));
        assert_eq!(diagnostics.events().len(), 1);
    }

    #[test]
    fn first_type_sticks() {
        let mut builder = ServiceBuilder::new("/s");
        builder.set_type("a/A");
        builder.set_type("b/B");
        assert_eq!(builder.construct_type(), "a/A");
        assert_eq!(ServiceBuilder::new("/t").construct_type(), UNKNOWN_TYPE);
    }
}
