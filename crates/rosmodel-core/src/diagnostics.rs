//! # Diagnostics
//!
//! The log sink every pass writes its non-fatal findings to.
//!
//! Each event is mirrored to `tracing` at the level its severity implies and
//! kept in memory, so callers can summarize a run and tests can assert on
//! exactly what was reported. A sink is passed explicitly; there is no
//! process-wide logger state in this crate.

use serde::Serialize;
use std::fmt;

/// Severity of a recorded finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Two sources disagree on a field value.
    Conflict {
        scope: String,
        entity: String,
        field: String,
        deployed: String,
        specified: String,
        /// Whether the specified value replaced the deployed one.
        overwritten: bool,
    },
    /// A name ends in the unresolved placeholder and was skipped.
    IncompleteName { scope: String, name: String },
    /// A single middleware lookup failed and a sentinel was used instead.
    LookupFailed {
        what: String,
        subject: String,
        reason: String,
    },
    /// A deployed I/O name found no catalog counterpart.
    UnmatchedToken {
        node: String,
        io_kind: String,
        name: String,
    },
    /// A node touched only part of an action's topics.
    PartialActionRole {
        action: String,
        node: String,
        role: String,
        count: usize,
    },
    /// Anything else worth surfacing.
    Note {
        severity: Severity,
        scope: String,
        message: String,
    },
}

impl Diagnostic {
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::Conflict { .. }
            | Diagnostic::IncompleteName { .. }
            | Diagnostic::PartialActionRole { .. } => Severity::Error,
            Diagnostic::LookupFailed { .. } | Diagnostic::UnmatchedToken { .. } => {
                Severity::Warning
            }
            Diagnostic::Note { severity, .. } => *severity,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Conflict {
                scope,
                entity,
                field,
                deployed,
                specified,
                overwritten,
            } => write!(
                f,
                "[{}] {} field '{}': specified '{}' does not match deployed '{}'{}",
                scope,
                entity,
                field,
                specified,
                deployed,
                if *overwritten { " (overwritten)" } else { "" }
            ),
            Diagnostic::IncompleteName { scope, name } => {
                write!(f, "[{}] incomplete name '{}' skipped", scope, name)
            }
            Diagnostic::LookupFailed {
                what,
                subject,
                reason,
            } => write!(f, "lookup of {} for '{}' failed: {}", what, subject, reason),
            Diagnostic::UnmatchedToken {
                node,
                io_kind,
                name,
            } => write!(
                f,
                "{} of node '{}': '{}' has no catalog counterpart",
                io_kind, node, name
            ),
            Diagnostic::PartialActionRole {
                action,
                node,
                role,
                count,
            } => write!(
                f,
                "node '{}' touches {} of 5 topics of action '{}' as {}",
                node, count, action, role
            ),
            Diagnostic::Note { scope, message, .. } => write!(f, "[{}] {}", scope, message),
        }
    }
}

/// Collects diagnostics and forwards them to `tracing`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Error => tracing::error!(%diagnostic),
            Severity::Warning => tracing::warn!(%diagnostic),
            Severity::Info => tracing::info!(%diagnostic),
            Severity::Debug => tracing::debug!(%diagnostic),
        }
        self.events.push(diagnostic);
    }

    /// Record a free-form note.
    pub fn note(&mut self, severity: Severity, scope: &str, message: impl Into<String>) {
        self.report(Diagnostic::Note {
            severity,
            scope: scope.to_string(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    /// Number of recorded events at `severity` or above.
    #[must_use]
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.events
            .iter()
            .filter(|event| event.severity() >= severity)
            .count()
    }

    /// Conflicts recorded so far.
    pub fn conflicts(&self) -> impl Iterator<Item = &Diagnostic> {
        self.events
            .iter()
            .filter(|event| matches!(event, Diagnostic::Conflict { .. }))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_counts() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.note(Severity::Info, "test", "hello");
        diagnostics.report(Diagnostic::IncompleteName {
            scope: "NODE".to_string(),
            name: "/ns/?".to_string(),
        });
        diagnostics.report(Diagnostic::UnmatchedToken {
            node: "/n".to_string(),
            io_kind: "read parameters".to_string(),
            name: "/n/x".to_string(),
        });

        assert_eq!(diagnostics.events().len(), 3);
        assert_eq!(diagnostics.count_at_least(Severity::Warning), 2);
        assert_eq!(diagnostics.count_at_least(Severity::Error), 1);
        assert_eq!(diagnostics.conflicts().count(), 0);
    }

    #[test]
    fn conflict_display_names_both_values() {
        let conflict = Diagnostic::Conflict {
            scope: "TOPIC".to_string(),
            entity: "/scan".to_string(),
            field: "construct_type".to_string(),
            deployed: "A/C".to_string(),
            specified: "A/B".to_string(),
            overwritten: false,
        };
        let text = conflict.to_string();
        assert!(text.contains("A/B"));
        assert!(text.contains("A/C"));
        assert!(!text.contains("overwritten"));
    }
}
