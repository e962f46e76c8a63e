//! CLI, configuration and file I/O tests for the rosmodel binary crate.

#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use rosmodel::cli::{
    Cli, Commands, cmd_convert, cmd_hash, cmd_merge, cmd_snapshot, cmd_stats, deployment_digest,
};
use rosmodel::config::{AppConfig, OutputFormat};
use rosmodel::io::{OutputPlan, load_deployment, load_specification};
use rosmodel_core::{ConflictPolicy, DeploymentModel, ModelError, SpecificationModel};
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// FIXTURES
// =============================================================================

const FACTS: &str = r#"{
    "system_state": {
        "publishers": { "/chatter": ["/talker"] },
        "subscribers": { "/chatter": ["/listener"] }
    },
    "topic_types": { "/chatter": "std_msgs/String" },
    "node_uris": {
        "/talker": "http://robot:40001/",
        "/listener": "http://robot:40002/"
    },
    "processes": {
        "/talker": { "executable_file": "/opt/demo/lib/talker" }
    }
}"#;

const ANALYSIS: &str = r#"{
    "topics": [
        {
            "name": "/chatter",
            "type": "std_msgs/String",
            "publishers": ["/talker"],
            "subscribers": ["/recorder"]
        }
    ]
}"#;

fn specification() -> SpecificationModel {
    let mut spec = SpecificationModel::new();
    spec.packages.get_or_create("demo");
    let talker = spec.nodes.get_or_create("demo/talker");
    talker.package = Some("demo".to_string());
    talker.file_path = Some("/opt/demo/lib/talker".to_string());
    spec
}

fn deployment() -> DeploymentModel {
    let mut model = DeploymentModel::new();
    let topic = model.topics.get_or_create("/chatter");
    topic.construct_type = Some("std_msgs/String".to_string());
    topic.publisher_node_names.insert("/talker".to_string());
    model
}

fn write_models(
    dir: &Path,
    formats: &[OutputFormat],
    deployment: Option<&DeploymentModel>,
    specification: Option<&SpecificationModel>,
) {
    OutputPlan {
        target: dir,
        base_name: "fixture",
        formats,
    }
    .write(deployment, specification)
    .unwrap();
}

fn config_with(formats: &[OutputFormat]) -> AppConfig {
    let mut config = AppConfig::default();
    config.output.formats = formats.to_vec();
    config
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[test]
fn config_absent_means_defaults() {
    let config = AppConfig::load(None).unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.merge.conflict_policy, ConflictPolicy::KeepDeployed);
}

#[test]
fn config_loads_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rosmodel.toml");
    std::fs::write(
        &path,
        "[filters]\nfilter_debug = false\n\n[output]\nbase_name = \"lab\"\nformats = [\"json\"]\n",
    )
    .unwrap();

    let config = AppConfig::load(Some(&path)).unwrap();
    assert!(!config.filters.filter_debug);
    assert_eq!(config.output.base_name, "lab");
    assert_eq!(config.output.formats, vec![OutputFormat::Json]);
}

#[test]
fn config_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = AppConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ModelError::Io(_))));
}

// =============================================================================
// ARGUMENT PARSING
// =============================================================================

#[test]
fn merge_flags_parse() {
    let cli = Cli::try_parse_from([
        "rosmodel",
        "merge",
        "-m",
        "dep.rmdl",
        "-s",
        "spec.rmdl",
        "-a",
        "analysis.json",
        "-t",
        "out",
        "--conflict-policy",
        "prefer-specified",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::Merge {
            conflict_policy, ..
        }) => assert_eq!(conflict_policy, Some(ConflictPolicy::PreferSpecified)),
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn convert_formats_parse_and_reject_unknown() {
    let cli = Cli::try_parse_from([
        "rosmodel", "convert", "-m", "dep.json", "-t", "out", "-f", "dot", "-f", "human",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Convert { format, spec, .. }) => {
            assert_eq!(format, vec![OutputFormat::Dot, OutputFormat::Human]);
            assert!(spec.is_none());
        }
        other => panic!("unexpected command: {:?}", other),
    }

    let bad = Cli::try_parse_from(["rosmodel", "convert", "-m", "a", "-t", "b", "-f", "yaml"]);
    assert!(bad.is_err());
}

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = Cli::try_parse_from([
        "rosmodel",
        "stats",
        "-m",
        "dep.rmdl",
        "--json-mode",
        "--log-level",
        "debug",
        "-q",
    ])
    .unwrap();
    assert!(cli.json_mode);
    assert!(cli.quiet);
    assert_eq!(cli.log_level.as_deref(), Some("debug"));

    let bad = Cli::try_parse_from(["rosmodel", "--log-level", "loud", "stats", "-m", "x"]);
    assert!(bad.is_err());
}

// =============================================================================
// MODEL FILES
// =============================================================================

#[test]
fn json_and_binary_models_load_the_same() {
    let dir = TempDir::new().unwrap();
    let model = deployment();
    write_models(
        dir.path(),
        &[OutputFormat::Json, OutputFormat::Binary],
        Some(&model),
        None,
    );

    let from_json = load_deployment(&dir.path().join("fixture_deployment.json")).unwrap();
    let from_binary = load_deployment(&dir.path().join("fixture_deployment.rmdl")).unwrap();
    assert_eq!(from_json, model);
    assert_eq!(from_binary, model);
    assert_eq!(
        deployment_digest(&from_json).unwrap(),
        deployment_digest(&from_binary).unwrap()
    );
}

#[test]
fn snapshot_kind_is_checked_on_load() {
    let dir = TempDir::new().unwrap();
    write_models(dir.path(), &[OutputFormat::Binary], None, Some(&specification()));

    let path = dir.path().join("fixture_specification.rmdl");
    assert!(load_specification(&path).is_ok());
    assert!(matches!(
        load_deployment(&path),
        Err(ModelError::Deserialization(_))
    ));
}

#[test]
fn malformed_json_is_deserialization_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        load_deployment(&path),
        Err(ModelError::Deserialization(_))
    ));
}

#[test]
fn dot_output_is_deployment_only() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in");
    std::fs::create_dir(&input).unwrap();
    write_models(
        &input,
        &[OutputFormat::Binary],
        Some(&deployment()),
        Some(&specification()),
    );

    let out = dir.path().join("out");
    cmd_convert(
        &config_with(&[OutputFormat::Dot, OutputFormat::Human]),
        &input.join("fixture_deployment.rmdl"),
        Some(&input.join("fixture_specification.rmdl")),
        &out,
        true,
    )
    .unwrap();

    assert!(out.join("ros_model_deployment.dot").is_file());
    assert!(out.join("ros_model_deployment.txt").is_file());
    assert!(out.join("ros_model_specification.txt").is_file());
    assert!(!out.join("ros_model_specification.dot").exists());

    let dot = std::fs::read_to_string(out.join("ros_model_deployment.dot")).unwrap();
    assert!(dot.contains("topic-/chatter"));
}

// =============================================================================
// COMMANDS
// =============================================================================

#[test]
fn snapshot_builds_deployment_and_fills_specification() {
    let dir = TempDir::new().unwrap();
    let facts = dir.path().join("facts.json");
    std::fs::write(&facts, FACTS).unwrap();
    write_models(dir.path(), &[OutputFormat::Binary], None, Some(&specification()));

    let out = dir.path().join("snapshot");
    cmd_snapshot(
        &config_with(&[OutputFormat::Binary]),
        &facts,
        &dir.path().join("fixture_specification.rmdl"),
        &out,
        true,
    )
    .unwrap();

    let deployment = load_deployment(&out.join("ros_model_deployment.rmdl")).unwrap();
    let chatter = deployment.topics.get("/chatter").unwrap();
    assert_eq!(chatter.construct_type.as_deref(), Some("std_msgs/String"));
    assert!(chatter.subscriber_node_names.contains("/listener"));
    let talker = deployment.nodes.get("/talker").unwrap();
    assert_eq!(talker.node.as_deref(), Some("demo/talker"));

    let spec = load_specification(&out.join("ros_model_specification.rmdl")).unwrap();
    let talker_spec = spec.nodes.get("demo/talker").unwrap();
    assert!(talker_spec.validated);
    let published = talker_spec.published_topics.as_ref().unwrap();
    assert_eq!(
        published.get("chatter").map(String::as_str),
        Some("std_msgs/String")
    );
}

#[test]
fn snapshot_requires_a_populated_specification() {
    let dir = TempDir::new().unwrap();
    let facts = dir.path().join("facts.json");
    std::fs::write(&facts, FACTS).unwrap();
    write_models(
        dir.path(),
        &[OutputFormat::Json],
        None,
        Some(&SpecificationModel::new()),
    );

    let result = cmd_snapshot(
        &AppConfig::default(),
        &facts,
        &dir.path().join("fixture_specification.json"),
        &dir.path().join("out"),
        true,
    );
    assert!(matches!(result, Err(ModelError::FatalStartup(_))));
}

#[test]
fn snapshot_of_unreachable_master_is_fatal() {
    let dir = TempDir::new().unwrap();
    let facts = dir.path().join("facts.json");
    std::fs::write(&facts, "{}").unwrap();
    write_models(dir.path(), &[OutputFormat::Json], None, Some(&specification()));

    let result = cmd_snapshot(
        &AppConfig::default(),
        &facts,
        &dir.path().join("fixture_specification.json"),
        &dir.path().join("out"),
        true,
    );
    assert!(matches!(result, Err(ModelError::FatalStartup(_))));
}

#[test]
fn merge_adds_analyzed_links() {
    let dir = TempDir::new().unwrap();
    write_models(
        dir.path(),
        &[OutputFormat::Json],
        Some(&deployment()),
        Some(&specification()),
    );
    let analysis = dir.path().join("analysis.json");
    std::fs::write(&analysis, ANALYSIS).unwrap();

    let out = dir.path().join("merged");
    cmd_merge(
        &config_with(&[OutputFormat::Json]),
        &dir.path().join("fixture_deployment.json"),
        &dir.path().join("fixture_specification.json"),
        &analysis,
        &out,
        true,
    )
    .unwrap();

    let merged = load_deployment(&out.join("ros_model_deployment.json")).unwrap();
    let chatter = merged.topics.get("/chatter").unwrap();
    assert!(chatter.subscriber_node_names.contains("/recorder"));
    assert_eq!(chatter.meta.version, 1);
}

#[test]
fn stats_and_hash_read_either_format() {
    let dir = TempDir::new().unwrap();
    write_models(
        dir.path(),
        &[OutputFormat::Json, OutputFormat::Binary],
        Some(&deployment()),
        None,
    );

    for file in ["fixture_deployment.json", "fixture_deployment.rmdl"] {
        let path = dir.path().join(file);
        cmd_stats(&path, None, true).unwrap();
        cmd_hash(&path, true).unwrap();
    }

    let digest = deployment_digest(&deployment()).unwrap();
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}
