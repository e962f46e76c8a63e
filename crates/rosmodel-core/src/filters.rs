//! # Exclusion Filters
//!
//! Name and type predicates applied once, during `prepare()`, so excluded
//! entities never reach classification.
//!
//! Filters are plain values built from a [`FilterConfig`] and handed to the
//! snapshot collector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const BASE_NODES: [&str; 1] = ["/roslaunch"];
const DEBUG_NODES: [&str; 1] = ["/rosout"];
const DEBUG_TOPICS: [&str; 3] = ["/rosout", "/rosout_agg", "/statistics"];
const TF_TOPICS: [&str; 2] = ["/tf", "/tf_static"];
const DEBUG_SERVICE_TYPES: [&str; 2] = ["roscpp/GetLoggers", "roscpp/SetLoggerLevel"];

/// A set of excluded names (or types).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionFilter {
    excluded: BTreeSet<String>,
}

impl ExclusionFilter {
    /// A filter that excludes nothing.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: names.into_iter().map(|n| n.as_ref().to_string()).collect(),
        }
    }

    /// Whether `name` should be dropped.
    #[must_use]
    pub fn should_exclude(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded
            .extend(names.into_iter().map(|n| n.as_ref().to_string()));
    }
}

/// User-facing filter switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Drop logging and statistics plumbing.
    pub filter_debug: bool,
    /// Drop the transform tree topics.
    pub filter_tf: bool,
    pub extra_nodes: Vec<String>,
    pub extra_topics: Vec<String>,
    pub extra_service_types: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_debug: true,
            filter_tf: false,
            extra_nodes: Vec::new(),
            extra_topics: Vec::new(),
            extra_service_types: Vec::new(),
        }
    }
}

/// The three predicates used while collecting facts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Applied to node names.
    pub nodes: ExclusionFilter,
    /// Applied to topic names.
    pub topics: ExclusionFilter,
    /// Applied to service *types*, not names.
    pub service_types: ExclusionFilter,
}

impl Filters {
    /// Filters that keep everything.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        let mut nodes = ExclusionFilter::from_names(BASE_NODES);
        let mut topics = ExclusionFilter::allow_all();
        let mut service_types = ExclusionFilter::allow_all();
        if config.filter_debug {
            nodes.extend(DEBUG_NODES);
            topics.extend(DEBUG_TOPICS);
            service_types.extend(DEBUG_SERVICE_TYPES);
        }
        if config.filter_tf {
            topics.extend(TF_TOPICS);
        }
        nodes.extend(&config.extra_nodes);
        topics.extend(&config.extra_topics);
        service_types.extend(&config.extra_service_types);
        Self {
            nodes,
            topics,
            service_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_filters_debug_but_not_tf() {
        let filters = Filters::from_config(&FilterConfig::default());
        assert!(filters.nodes.should_exclude("/roslaunch"));
        assert!(filters.nodes.should_exclude("/rosout"));
        assert!(filters.topics.should_exclude("/rosout_agg"));
        assert!(!filters.topics.should_exclude("/tf"));
        assert!(filters.service_types.should_exclude("roscpp/GetLoggers"));
    }

    #[test]
    fn tf_and_extras() {
        let config = FilterConfig {
            filter_debug: false,
            filter_tf: true,
            extra_nodes: vec!["/snapshot".to_string()],
            ..FilterConfig::default()
        };
        let filters = Filters::from_config(&config);
        assert!(filters.topics.should_exclude("/tf_static"));
        assert!(!filters.topics.should_exclude("/rosout"));
        assert!(filters.nodes.should_exclude("/snapshot"));
        assert!(filters.nodes.should_exclude("/roslaunch"));
    }

    #[test]
    fn none_keeps_everything() {
        let filters = Filters::none();
        assert!(!filters.nodes.should_exclude("/roslaunch"));
    }
}
