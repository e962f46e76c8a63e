//! # Formats
//!
//! Pure transformations of complete models into bytes or text. Reading and
//! writing files is the app layer's job.
//!
//! - `persistence`: binary snapshot (header + postcard)
//! - `report`: human-readable bank listing
//! - `dot`: Graphviz digraph of a deployment

pub mod dot;
pub mod persistence;
pub mod report;

pub use dot::deployment_dot;
pub use persistence::{
    ModelKind, SnapshotHeader, deployment_from_bytes, deployment_to_bytes, is_snapshot,
    snapshot_kind, specification_from_bytes, specification_to_bytes,
};
pub use report::{Describe, bank_report, deployment_report, specification_report};

/// BLAKE3 hex digest of a binary snapshot.
///
/// # Requires
///
/// This function is only available with the `crypto-hash` feature enabled.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn model_digest(snapshot: &[u8]) -> String {
    blake3::hash(snapshot).to_hex().to_string()
}
