//! # Binary Snapshot Format
//!
//! Format: Header (6 bytes) + postcard-serialized model.
//! - 4 bytes: Magic ("RMDL")
//! - 1 byte: Version
//! - 1 byte: Model kind (deployment = 1, specification = 2)
//!
//! File I/O lives in the app layer; everything here is a pure transformation.
//!
//! The size limit and header are checked before any payload is decoded.

use crate::model::{DeploymentModel, SpecificationModel};
use crate::primitives;
use crate::types::ModelError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Header length in bytes.
pub const HEADER_SIZE: usize = 6;

// =============================================================================
// MODEL KIND
// =============================================================================

/// Which model a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Deployment,
    Specification,
}

impl ModelKind {
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            ModelKind::Deployment => 1,
            ModelKind::Specification => 2,
        }
    }

    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(ModelKind::Deployment),
            2 => Some(ModelKind::Specification),
            _ => None,
        }
    }
}

// =============================================================================
// FILE HEADER
// =============================================================================

/// The header that precedes every snapshot payload.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
    pub kind: u8,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new(kind: ModelKind) -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
            kind: kind.to_byte(),
        }
    }

    /// Check magic, version and that the snapshot holds `expected`.
    pub fn validate(&self, expected: ModelKind) -> Result<(), ModelError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(ModelError::Deserialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(ModelError::Deserialization(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        match ModelKind::from_byte(self.kind) {
            Some(kind) if kind == expected => Ok(()),
            Some(kind) => Err(ModelError::Deserialization(format!(
                "Snapshot holds a {:?} model, expected {:?}",
                kind, expected
            ))),
            None => Err(ModelError::Deserialization(format!(
                "Unknown model kind byte: {}",
                self.kind
            ))),
        }
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes[5] = self.kind;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let Some(header) = bytes.get(..HEADER_SIZE) else {
            return Err(ModelError::Deserialization(
                "Header too short".to_string(),
            ));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
            kind: header[5],
        })
    }
}

/// Whether `bytes` starts with the snapshot magic.
#[must_use]
pub fn is_snapshot(bytes: &[u8]) -> bool {
    bytes.starts_with(primitives::MAGIC_BYTES)
}

/// The model kind recorded in a snapshot header, if the header is readable.
#[must_use]
pub fn snapshot_kind(bytes: &[u8]) -> Option<ModelKind> {
    if !is_snapshot(bytes) {
        return None;
    }
    bytes.get(5).copied().and_then(ModelKind::from_byte)
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

fn encode<T: Serialize>(kind: ModelKind, model: &T) -> Result<Vec<u8>, ModelError> {
    let payload =
        postcard::to_stdvec(model).map_err(|e| ModelError::Serialization(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&SnapshotHeader::new(kind).to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

fn decode<T: DeserializeOwned>(kind: ModelKind, bytes: &[u8]) -> Result<T, ModelError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ModelError::Deserialization(format!(
            "Data too short: minimum {} bytes required",
            HEADER_SIZE
        )));
    }
    if bytes.len() > primitives::MAX_SNAPSHOT_SIZE {
        return Err(ModelError::Deserialization(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            primitives::MAX_SNAPSHOT_SIZE
        )));
    }

    SnapshotHeader::from_bytes(bytes)?.validate(kind)?;

    let payload = &bytes[HEADER_SIZE..];
    postcard::from_bytes(payload).map_err(|e| {
        ModelError::Deserialization(format!("Failed to deserialize model data: {}", e))
    })
}

/// Serialize a deployment model (header + payload).
pub fn deployment_to_bytes(model: &DeploymentModel) -> Result<Vec<u8>, ModelError> {
    encode(ModelKind::Deployment, model)
}

pub fn deployment_from_bytes(bytes: &[u8]) -> Result<DeploymentModel, ModelError> {
    decode(ModelKind::Deployment, bytes)
}

/// Serialize a specification model (header + payload).
pub fn specification_to_bytes(model: &SpecificationModel) -> Result<Vec<u8>, ModelError> {
    encode(ModelKind::Specification, model)
}

pub fn specification_from_bytes(bytes: &[u8]) -> Result<SpecificationModel, ModelError> {
    decode(ModelKind::Specification, bytes)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IoBinding, NodeRole};

    fn sample_deployment() -> DeploymentModel {
        let mut model = DeploymentModel::new();
        let node = model.nodes.get_or_create("/talker");
        node.published_topic_names
            .insert("/chatter".to_string(), IoBinding::typed("std_msgs/String"));
        node.meta.record_change(primitives::SNAPSHOT_SOURCE);
        let manager = model.nodelet_managers.get_or_create("/manager");
        manager.role = NodeRole::Manager {
            nodelets: ["/cam".to_string()].into_iter().collect(),
            published_bond_topics: Default::default(),
            subscribed_bond_topics: Default::default(),
        };
        model.topics.get_or_create("/chatter").construct_type =
            Some("std_msgs/String".to_string());
        model
    }

    #[test]
    fn header_roundtrip() {
        let header = SnapshotHeader::new(ModelKind::Specification);
        let bytes = header.to_bytes();
        let restored = SnapshotHeader::from_bytes(&bytes).expect("parse header");

        assert_eq!(restored.magic, *primitives::MAGIC_BYTES);
        assert_eq!(restored.version, primitives::FORMAT_VERSION);
        assert!(restored.validate(ModelKind::Specification).is_ok());
        assert!(restored.validate(ModelKind::Deployment).is_err());
    }

    #[test]
    fn bytes_roundtrip_bit_exact() {
        let model = sample_deployment();

        let bytes1 = deployment_to_bytes(&model).expect("first serialize");
        let restored = deployment_from_bytes(&bytes1).expect("deserialize");
        let bytes2 = deployment_to_bytes(&restored).expect("second serialize");

        assert_eq!(restored, model);
        assert_eq!(
            bytes1, bytes2,
            "save -> load -> save must produce identical bytes"
        );
        assert_eq!(snapshot_kind(&bytes1), Some(ModelKind::Deployment));
    }

    #[test]
    fn wrong_kind_rejected() {
        let bytes = specification_to_bytes(&SpecificationModel::new()).expect("serialize");
        assert!(deployment_from_bytes(&bytes).is_err());
        assert!(specification_from_bytes(&bytes).is_ok());
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = vec![0u8; 10];
        bytes[0..4].copy_from_slice(b"XXXX");

        assert!(!is_snapshot(&bytes));
        assert!(deployment_from_bytes(&bytes).is_err());
        assert!(deployment_from_bytes(b"RMD").is_err());
    }
}
