//! # Model File I/O
//!
//! Reading captures and models from disk, and writing a model in every
//! requested [`OutputFormat`].
//!
//! A model file is read as a binary snapshot when it starts with the
//! snapshot magic, and as JSON otherwise.

use crate::config::OutputFormat;
use rosmodel_core::primitives::MAX_SNAPSHOT_SIZE;
use rosmodel_core::{
    DeploymentModel, ModelError, SpecificationModel, deployment_dot, deployment_from_bytes,
    deployment_report, deployment_to_bytes, is_snapshot, specification_from_bytes,
    specification_report, specification_to_bytes,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a model file, binary or JSON.
pub const MAX_MODEL_FILE_SIZE: u64 = MAX_SNAPSHOT_SIZE as u64;

/// Maximum size of a fact capture or analysis file (100 MB).
pub const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

// =============================================================================
// PATH VALIDATION
// =============================================================================

/// Reject files larger than `max_size` before reading them.
pub fn validate_file_size(path: &Path, max_size: u64) -> Result<(), ModelError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ModelError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(ModelError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize `path` and require a regular file.
pub fn validate_file_path(path: &Path) -> Result<PathBuf, ModelError> {
    let canonical = path
        .canonicalize()
        .map_err(|e| ModelError::Io(format!("Invalid file path '{}': {}", path.display(), e)))?;

    if !canonical.is_file() {
        return Err(ModelError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Create the output directory if needed and return its canonical form.
pub fn prepare_target_dir(path: &Path) -> Result<PathBuf, ModelError> {
    std::fs::create_dir_all(path).map_err(|e| {
        ModelError::Io(format!(
            "Cannot create output directory '{}': {}",
            path.display(),
            e
        ))
    })?;

    let canonical = path.canonicalize().map_err(|e| {
        ModelError::Io(format!(
            "Invalid output directory '{}': {}",
            path.display(),
            e
        ))
    })?;

    if !canonical.is_dir() {
        return Err(ModelError::Io(format!(
            "Output path '{}' is not a directory",
            path.display()
        )));
    }

    Ok(canonical)
}

fn read_bounded(path: &Path, max_size: u64) -> Result<Vec<u8>, ModelError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, max_size)?;
    std::fs::read(&path)
        .map_err(|e| ModelError::Io(format!("Cannot read '{}': {}", path.display(), e)))
}

// =============================================================================
// READING
// =============================================================================

/// Read a JSON input such as a fact capture or a static analysis.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let bytes = read_bounded(path, MAX_INPUT_FILE_SIZE)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ModelError::Deserialization(format!("{}: {}", path.display(), e)))
}

/// Load a deployment model from a binary snapshot or JSON.
pub fn load_deployment(path: &Path) -> Result<DeploymentModel, ModelError> {
    let bytes = read_bounded(path, MAX_MODEL_FILE_SIZE)?;
    let model = if is_snapshot(&bytes) {
        deployment_from_bytes(&bytes)?
    } else {
        serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Deserialization(format!("{}: {}", path.display(), e)))?
    };
    tracing::debug!(path = %path.display(), "deployment model loaded");
    Ok(model)
}

/// Load a specification model from a binary snapshot or JSON.
pub fn load_specification(path: &Path) -> Result<SpecificationModel, ModelError> {
    let bytes = read_bounded(path, MAX_MODEL_FILE_SIZE)?;
    let model = if is_snapshot(&bytes) {
        specification_from_bytes(&bytes)?
    } else {
        serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Deserialization(format!("{}: {}", path.display(), e)))?
    };
    tracing::debug!(path = %path.display(), "specification model loaded");
    Ok(model)
}

// =============================================================================
// WRITING
// =============================================================================

/// Where and how to write a set of models.
#[derive(Debug, Clone)]
pub struct OutputPlan<'a> {
    pub target: &'a Path,
    pub base_name: &'a str,
    pub formats: &'a [OutputFormat],
}

impl OutputPlan<'_> {
    #[must_use]
    pub fn file_name(&self, part: &str, format: OutputFormat) -> PathBuf {
        self.target
            .join(format!("{}_{}.{}", self.base_name, part, format.extension()))
    }

    /// Write every present model in every format. Returns the written paths.
    ///
    /// The DOT format only applies to deployments.
    pub fn write(
        &self,
        deployment: Option<&DeploymentModel>,
        specification: Option<&SpecificationModel>,
    ) -> Result<Vec<PathBuf>, ModelError> {
        let mut written = Vec::new();
        for &format in self.formats {
            if let Some(model) = deployment {
                let data = match format {
                    OutputFormat::Json => to_json(model)?,
                    OutputFormat::Binary => deployment_to_bytes(model)?,
                    OutputFormat::Human => deployment_report(model).into_bytes(),
                    OutputFormat::Dot => deployment_dot(model).into_bytes(),
                };
                written.push(self.write_file("deployment", format, &data)?);
            }
            if let Some(model) = specification {
                let data = match format {
                    OutputFormat::Json => to_json(model)?,
                    OutputFormat::Binary => specification_to_bytes(model)?,
                    OutputFormat::Human => specification_report(model).into_bytes(),
                    OutputFormat::Dot => continue,
                };
                written.push(self.write_file("specification", format, &data)?);
            }
        }
        Ok(written)
    }

    fn write_file(&self, part: &str, format: OutputFormat, data: &[u8]) -> Result<PathBuf, ModelError> {
        let path = self.file_name(part, format);
        std::fs::write(&path, data)
            .map_err(|e| ModelError::Io(format!("Write file '{}': {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), bytes = data.len(), %format, "model written");
        Ok(path)
    }
}

fn to_json<T: Serialize>(model: &T) -> Result<Vec<u8>, ModelError> {
    serde_json::to_vec_pretty(model).map_err(|e| ModelError::Serialization(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
