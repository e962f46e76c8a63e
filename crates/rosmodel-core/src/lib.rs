//! # rosmodel-core
//!
//! The classification and reconciliation engine for rosmodel.
//!
//! This crate turns observed facts about a running ROS computation graph into
//! a typed deployment model, merges a statically extracted specification into
//! it, and validates deployed nodes against their node specifications.
//!
//! ## Passes
//!
//! 1. `snapshot`: fact builders populated from a [`MasterClient`]
//! 2. `classify`: nodelet managers, nodelets and actions
//! 3. `reconcile`: static analysis merged in, one catalog kind at a time
//! 4. `matcher`: deployed I/O paired with declared I/O
//!
//! ## Architectural Constraints
//!
//! - Synchronous, single-threaded, run to completion
//! - BTreeMap only: every observable output is name-sorted
//! - Filters, diagnostics and the middleware client are passed in; there is
//!   no global state
//! - File I/O lives in the app layer

// =============================================================================
// MODULES
// =============================================================================

pub mod analysis;
pub mod builders;
pub mod classify;
pub mod diagnostics;
pub mod facts;
pub mod filters;
pub mod formats;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod primitives;
pub mod reconcile;
pub mod registry;
pub mod snapshot;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Action, BankKind, Catalog, Entity, EntityMeta, IoBinding, IoMap, Machine, ModelError, Node,
    NodeRole, NodeSpecification, PackageSpecification, Parameter, Provenance, Service, Topic,
    TypeSpecification,
};

// =============================================================================
// RE-EXPORTS: Models
// =============================================================================

pub use model::{BankCount, DeploymentModel, RosModel, SpecificationModel};
pub use registry::Registry;

// =============================================================================
// RE-EXPORTS: Collaborators
// =============================================================================

pub use analysis::StaticAnalysis;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use facts::{LookupFailure, MasterClient, RecordedFacts};
pub use filters::{FilterConfig, Filters};

// =============================================================================
// RE-EXPORTS: Passes
// =============================================================================

pub use matcher::{NodeValidation, ValidationReport, validate_deployment};
pub use merge::ConflictPolicy;
pub use reconcile::{
    CatalogKind, CatalogSummary, MergeContext, MergeSource, ReconcileSummary, Reconciler,
    merge_into,
};
pub use snapshot::{Snapshot, require_specification};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    ModelKind, deployment_dot, deployment_from_bytes, deployment_report, deployment_to_bytes,
    is_snapshot, specification_from_bytes, specification_report, specification_to_bytes,
};

#[cfg(feature = "crypto-hash")]
pub use formats::model_digest;
