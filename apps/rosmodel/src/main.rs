//! # rosmodel
//!
//! The binary for ROS computation graph modeling.
//!
//! ## Usage
//!
//! ```bash
//! # Snapshot a recorded graph and validate it against a specification
//! rosmodel snapshot -f facts.json -s spec.rmdl -t out/
//!
//! # Merge a static analysis into the snapshot
//! rosmodel merge -m out/ros_model_deployment.rmdl -s spec.rmdl -a analysis.json -t merged/
//!
//! # Inspect
//! rosmodel stats -m merged/ros_model_deployment.rmdl --json-mode
//! rosmodel hash -m merged/ros_model_deployment.rmdl
//! ```

use clap::Parser;
use rosmodel::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // ROSMODEL_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ROSMODEL_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let level = cli.log_level.as_deref().unwrap_or("info");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rosmodel={level},rosmodel_core={level}").into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        println!("rosmodel v{}", env!("CARGO_PKG_VERSION"));
        println!();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
