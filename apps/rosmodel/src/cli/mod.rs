//! # rosmodel CLI Module
//!
//! ## Available Commands
//!
//! - `snapshot` - Build a deployment model from a fact capture and validate it
//! - `merge` - Reconcile a static analysis into a deployment model
//! - `convert` - Re-emit models in other formats
//! - `stats` - Show item counts per bank
//! - `hash` - Compute the BLAKE3 fingerprint of a deployment model

mod commands;

use crate::config::{AppConfig, OutputFormat, parse_conflict_policy};
use clap::{Parser, Subcommand};
use rosmodel_core::{ConflictPolicy, ModelError};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// rosmodel - ROS computation graph models
///
/// Snapshots a running graph into a typed deployment model, merges
/// statically extracted specifications into it, and validates deployed
/// nodes against their node specifications.
#[derive(Parser, Debug)]
#[command(name = "rosmodel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a rosmodel.toml configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log threshold when RUST_LOG is not set
    #[arg(long, global = true, value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: Option<String>,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a deployment model from recorded middleware facts
    Snapshot {
        /// Fact capture (JSON)
        #[arg(short, long)]
        facts: PathBuf,

        /// Specification model used for validation
        #[arg(short, long)]
        spec: PathBuf,

        /// Output directory
        #[arg(short, long)]
        target: PathBuf,

        /// Keep logging and statistics plumbing
        #[arg(long)]
        no_filter_debug: bool,

        /// Drop transform tree topics
        #[arg(long)]
        filter_tf: bool,
    },

    /// Reconcile a static analysis into a deployment model
    Merge {
        /// Deployment model (binary or JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Specification model (binary or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// Static analysis (JSON)
        #[arg(short, long)]
        analysis: PathBuf,

        /// Output directory
        #[arg(short, long)]
        target: PathBuf,

        /// keep-deployed or prefer-specified
        #[arg(long, value_parser = parse_conflict_policy)]
        conflict_policy: Option<ConflictPolicy>,
    },

    /// Load models and write them in other formats
    Convert {
        /// Deployment model (binary or JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Specification model (binary or JSON)
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        target: PathBuf,

        /// Output formats (json, binary, human, dot); defaults to the config
        #[arg(short, long)]
        format: Vec<OutputFormat>,
    },

    /// Show item counts per bank
    Stats {
        /// Deployment model (binary or JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Specification model (binary or JSON)
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },

    /// Compute BLAKE3 fingerprint of a deployment model
    Hash {
        /// Deployment model (binary or JSON)
        #[arg(short, long)]
        model: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), ModelError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Snapshot {
            facts,
            spec,
            target,
            no_filter_debug,
            filter_tf,
        }) => {
            if no_filter_debug {
                config.filters.filter_debug = false;
            }
            if filter_tf {
                config.filters.filter_tf = true;
            }
            cmd_snapshot(&config, &facts, &spec, &target, json_mode)
        }
        Some(Commands::Merge {
            model,
            spec,
            analysis,
            target,
            conflict_policy,
        }) => {
            if let Some(policy) = conflict_policy {
                config.merge.conflict_policy = policy;
            }
            cmd_merge(&config, &model, &spec, &analysis, &target, json_mode)
        }
        Some(Commands::Convert {
            model,
            spec,
            target,
            format,
        }) => {
            if !format.is_empty() {
                config.output.formats = format;
            }
            cmd_convert(&config, &model, spec.as_deref(), &target, json_mode)
        }
        Some(Commands::Stats { model, spec }) => cmd_stats(&model, spec.as_deref(), json_mode),
        Some(Commands::Hash { model }) => cmd_hash(&model, json_mode),
        None => {
            println!("No command given. Run `rosmodel --help` for usage.");
            Ok(())
        }
    }
}
