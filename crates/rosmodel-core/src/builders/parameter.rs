//! Parameter builders.

use super::EntityBuilder;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::facts::{MasterClient, ParamValue};
use crate::primitives::{SNAPSHOT_SOURCE, UNKNOWN_PARAMETER_VALUE, UNKNOWN_TYPE};
use crate::types::{Entity, Parameter, Provenance};
use std::collections::BTreeSet;

/// Accumulates the value and callers of one parameter.
#[derive(Debug, Clone, Default)]
pub struct ParameterBuilder {
    name: String,
    value: Option<ParamValue>,
    setters: BTreeSet<String>,
    readers: BTreeSet<String>,
}

impl ParameterBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn add_setter(&mut self, node: &str) {
        self.setters.insert(node.to_string());
    }

    pub fn add_reader(&mut self, node: &str) {
        self.readers.insert(node.to_string());
    }

    #[must_use]
    pub fn setters(&self) -> &BTreeSet<String> {
        &self.setters
    }

    #[must_use]
    pub fn readers(&self) -> &BTreeSet<String> {
        &self.readers
    }

    /// Primitive type tag of the fetched value.
    #[must_use]
    pub fn python_type(&self) -> Option<&str> {
        self.value.as_ref().map(|value| value.type_tag.as_str())
    }

    /// Fetch the current value. A failed lookup records the sentinels.
    pub fn prepare(&mut self, client: &dyn MasterClient, diagnostics: &mut Diagnostics) {
        let value = client.parameter_value(&self.name).unwrap_or_else(|failure| {
            diagnostics.report(Diagnostic::LookupFailed {
                what: "parameter value".to_string(),
                subject: self.name.clone(),
                reason: failure.0,
            });
            ParamValue {
                value: UNKNOWN_PARAMETER_VALUE.to_string(),
                type_tag: UNKNOWN_TYPE.to_string(),
            }
        });
        self.value = Some(value);
    }
}

impl EntityBuilder for ParameterBuilder {
    type Output = Parameter;

    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self) -> Parameter {
        let mut parameter = Parameter::named(&self.name);
        parameter.meta.source = Provenance::single(SNAPSHOT_SOURCE);
        parameter.value = self.value.as_ref().map(|value| value.value.clone());
        parameter.python_type = self.python_type().map(str::to_string);
        parameter.setting_node_names = self.setters.clone();
        parameter.reading_node_names = self.readers.clone();
        parameter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::RecordedFacts;

    #[test]
    fn value_and_type_are_fetched() {
        let mut facts = RecordedFacts::default();
        facts.parameters.insert(
            "/rate".to_string(),
            ParamValue {
                value: "10".to_string(),
                type_tag: "int".to_string(),
            },
        );
        let mut builder = ParameterBuilder::new("/rate");
        builder.add_setter("/talker");
        builder.add_reader("/listener");
        let mut diagnostics = Diagnostics::new();

        builder.prepare(&facts, &mut diagnostics);
        let parameter = builder.build();

        assert_eq!(parameter.value.as_deref(), Some("10"));
        assert_eq!(parameter.python_type.as_deref(), Some("int"));
        assert!(parameter.setting_node_names.contains("/talker"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn missing_value_degrades() {
        let mut builder = ParameterBuilder::new("/gone");
        let mut diagnostics = Diagnostics::new();
        builder.prepare(&RecordedFacts::default(), &mut diagnostics);
        let parameter = builder.build();

        assert_eq!(builder.python_type(), Some(UNKNOWN_TYPE));
        assert_eq!(parameter.value.as_deref(), Some(UNKNOWN_PARAMETER_VALUE));
        assert_eq!(parameter.python_type.as_deref(), Some(UNKNOWN_TYPE));
        assert_eq!(diagnostics.events().len(), 1);
    }
}
