//! # Configuration
//!
//! Optional `rosmodel.toml`. Every field has a default, so a missing file
//! and an empty file mean the same thing.
//!
//! ```toml
//! [filters]
//! filter_debug = true
//! filter_tf = false
//! extra_nodes = ["/diagnostics_agg"]
//!
//! [merge]
//! conflict_policy = "keep-deployed"
//!
//! [output]
//! base_name = "ros_model"
//! formats = ["json", "binary", "human"]
//! ```

use rosmodel_core::{ConflictPolicy, FilterConfig, ModelError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// OUTPUT FORMATS
// =============================================================================

/// A file format the CLI can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    Json,
    /// Headered postcard snapshot.
    Binary,
    /// Indented text report.
    Human,
    /// Graphviz rendering of the deployment.
    Dot,
}

impl OutputFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Binary => "rmdl",
            OutputFormat::Human => "txt",
            OutputFormat::Dot => "dot",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Json => "json",
            OutputFormat::Binary => "binary",
            OutputFormat::Human => "human",
            OutputFormat::Dot => "dot",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "binary" => Ok(OutputFormat::Binary),
            "human" => Ok(OutputFormat::Human),
            "dot" => Ok(OutputFormat::Dot),
            other => Err(ModelError::UnknownFormat(format!(
                "{}. Use: json, binary, human, dot",
                other
            ))),
        }
    }
}

/// Parse a `--conflict-policy` value.
pub fn parse_conflict_policy(s: &str) -> Result<ConflictPolicy, ModelError> {
    match s {
        "keep-deployed" => Ok(ConflictPolicy::KeepDeployed),
        "prefer-specified" => Ok(ConflictPolicy::PreferSpecified),
        other => Err(ModelError::Config(format!(
            "unknown conflict policy '{}'. Use: keep-deployed, prefer-specified",
            other
        ))),
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// `[merge]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub conflict_policy: ConflictPolicy,
}

/// `[output]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Stem shared by every written file.
    pub base_name: String,
    pub formats: Vec<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_name: "ros_model".to_string(),
            formats: vec![OutputFormat::Json, OutputFormat::Binary, OutputFormat::Human],
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub filters: FilterConfig,
    pub merge: MergeConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ModelError> {
        let config: Self = toml::from_str(text).map_err(|e| ModelError::Config(e.to_string()))?;
        if config.output.base_name.trim().is_empty() {
            return Err(ModelError::Config("output.base_name is empty".to_string()));
        }
        Ok(config)
    }

    /// Load `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ModelError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let path = crate::io::validate_file_path(path)?;
        crate::io::validate_file_size(&path, MAX_CONFIG_FILE_SIZE)?;
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ModelError::Io(format!("Cannot read config '{}': {}", path.display(), e)))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

// =============================================================================
// TESTS
// =============================================================================
