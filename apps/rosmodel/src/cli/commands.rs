//! # CLI Command Implementations
//!
//! Each command loads its inputs, runs one core pass, writes the results
//! and prints a summary (plain text, or JSON with `--json-mode`).

use crate::config::AppConfig;
use crate::io::{OutputPlan, load_deployment, load_specification, prepare_target_dir, read_json};
use rosmodel_core::{
    BankCount, DeploymentModel, Diagnostics, Filters, ModelError, RecordedFacts, Reconciler,
    RosModel, Severity, SpecificationModel, Snapshot, StaticAnalysis, deployment_to_bytes,
    model_digest, require_specification, validate_deployment,
};
use std::path::{Path, PathBuf};

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn diagnostics_json(diagnostics: &Diagnostics) -> serde_json::Value {
    serde_json::json!({
        "total": diagnostics.events().len(),
        "warnings": diagnostics.count_at_least(Severity::Warning),
        "errors": diagnostics.count_at_least(Severity::Error),
        "conflicts": diagnostics.conflicts().count(),
    })
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    println!(
        "Diagnostics:  {} ({} warnings, {} conflicts)",
        diagnostics.events().len(),
        diagnostics.count_at_least(Severity::Warning),
        diagnostics.conflicts().count()
    );
}

fn print_written(written: &[PathBuf]) {
    println!();
    println!("Written:");
    for path in written {
        println!("  {}", path.display());
    }
}

fn print_statistics(statistics: &[BankCount]) {
    for count in statistics.iter().filter(|count| count.count > 0) {
        println!("  {:<28} {}", count.kind.to_string(), count.count);
    }
}

fn output_plan<'a>(config: &'a AppConfig, target: &'a Path) -> OutputPlan<'a> {
    OutputPlan {
        target,
        base_name: &config.output.base_name,
        formats: &config.output.formats,
    }
}

// =============================================================================
// SNAPSHOT COMMAND
// =============================================================================

/// Build, classify and validate a deployment model from recorded facts.
pub fn cmd_snapshot(
    config: &AppConfig,
    facts: &Path,
    spec: &Path,
    target: &Path,
    json_mode: bool,
) -> Result<(), ModelError> {
    let facts: RecordedFacts = read_json(facts)?;
    let mut specification = load_specification(spec)?;
    require_specification(&specification)?;
    let target = prepare_target_dir(target)?;

    let filters = Filters::from_config(&config.filters);
    let mut diagnostics = Diagnostics::new();
    let mut deployment = Snapshot::collect(&facts, &filters, &mut diagnostics)?;
    let report = validate_deployment(&mut deployment, &mut specification, &mut diagnostics);

    let written = output_plan(config, &target).write(Some(&deployment), Some(&specification))?;
    let model = RosModel::new(deployment, specification);
    let invalid: Vec<&str> = report
        .invalid()
        .map(|validation| validation.node.as_str())
        .collect();

    if json_mode {
        print_json(&serde_json::json!({
            "statistics": model.statistics(),
            "validation": report,
            "diagnostics": diagnostics_json(&diagnostics),
            "written": written,
        }));
        return Ok(());
    }

    println!("Snapshot");
    println!("========");
    print_statistics(&model.statistics());
    println!();
    println!("Validated:    {}", report.validations.len());
    println!("Invalid:      {}", invalid.len());
    for node in &invalid {
        println!("  {}", node);
    }
    println!("Specs filled: {}", report.updated_specs.len());
    println!("Unknown:      {}", report.unknown.len());
    println!("Ambiguous:    {}", report.ambiguous.len());
    print_diagnostics(&diagnostics);
    print_written(&written);

    Ok(())
}

// =============================================================================
// MERGE COMMAND
// =============================================================================

/// Reconcile a static analysis into a deployment and specification.
pub fn cmd_merge(
    config: &AppConfig,
    model: &Path,
    spec: &Path,
    analysis: &Path,
    target: &Path,
    json_mode: bool,
) -> Result<(), ModelError> {
    let deployment = load_deployment(model)?;
    let specification = load_specification(spec)?;
    let analysis: StaticAnalysis = read_json(analysis)?;
    let target = prepare_target_dir(target)?;

    let mut model = RosModel::new(deployment, specification);
    let mut diagnostics = Diagnostics::new();
    let policy = config.merge.conflict_policy;
    let summary = Reconciler::new(&mut model, policy, &mut diagnostics).run(&analysis);

    let written =
        output_plan(config, &target).write(Some(&model.deployment), Some(&model.specification))?;

    if json_mode {
        let kinds: Vec<serde_json::Value> = summary
            .kinds
            .iter()
            .map(|(kind, counts)| {
                serde_json::json!({
                    "kind": kind.to_string(),
                    "merged": counts.merged,
                    "unchanged": counts.unchanged,
                    "created": counts.created,
                    "skipped": counts.skipped,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "conflict_policy": policy.to_string(),
            "kinds": kinds,
            "statistics": model.statistics(),
            "diagnostics": diagnostics_json(&diagnostics),
            "written": written,
        }));
        return Ok(());
    }

    println!("Merge ({})", policy);
    println!("=====");
    println!(
        "  {:<16} {:>8} {:>10} {:>8} {:>8}",
        "kind", "merged", "unchanged", "created", "skipped"
    );
    for (kind, counts) in &summary.kinds {
        println!(
            "  {:<16} {:>8} {:>10} {:>8} {:>8}",
            kind.to_string(),
            counts.merged,
            counts.unchanged,
            counts.created,
            counts.skipped
        );
    }
    println!();
    print_diagnostics(&diagnostics);
    print_written(&written);

    Ok(())
}

// =============================================================================
// CONVERT COMMAND
// =============================================================================

/// Load models and write them in the configured formats.
pub fn cmd_convert(
    config: &AppConfig,
    model: &Path,
    spec: Option<&Path>,
    target: &Path,
    json_mode: bool,
) -> Result<(), ModelError> {
    let deployment = load_deployment(model)?;
    let specification = spec.map(load_specification).transpose()?;
    let target = prepare_target_dir(target)?;

    let written = output_plan(config, &target).write(Some(&deployment), specification.as_ref())?;

    if json_mode {
        print_json(&serde_json::json!({ "written": written }));
    } else {
        println!("Converted {} file(s)", written.len());
        print_written(&written);
    }

    Ok(())
}

// =============================================================================
// STATS COMMAND
// =============================================================================

/// Show item counts per bank.
pub fn cmd_stats(model: &Path, spec: Option<&Path>, json_mode: bool) -> Result<(), ModelError> {
    let deployment = load_deployment(model)?;
    let model = RosModel::new(deployment, specification_or_default(spec)?);
    let statistics = model.statistics();

    if json_mode {
        print_json(&serde_json::json!({ "statistics": statistics }));
        return Ok(());
    }

    let total: usize = statistics.iter().map(|count| count.count).sum();
    println!("rosmodel Statistics");
    println!("===================");
    print_statistics(&statistics);
    println!();
    println!("Total:        {}", total);

    Ok(())
}

// =============================================================================
// HASH COMMAND
// =============================================================================

/// Compute the BLAKE3 fingerprint of a deployment model's binary snapshot.
pub fn cmd_hash(model: &Path, json_mode: bool) -> Result<(), ModelError> {
    let deployment = load_deployment(model)?;
    let digest = deployment_digest(&deployment)?;

    if json_mode {
        print_json(&serde_json::json!({
            "algorithm": "blake3",
            "hash": digest,
        }));
    } else {
        println!("BLAKE3: {}", digest);
    }

    Ok(())
}

/// Fingerprint of the binary snapshot of `deployment`.
pub fn deployment_digest(deployment: &DeploymentModel) -> Result<String, ModelError> {
    let bytes = deployment_to_bytes(deployment)?;
    Ok(model_digest(&bytes))
}

/// Load a specification if one is given, else an empty one.
pub fn specification_or_default(spec: Option<&Path>) -> Result<SpecificationModel, ModelError> {
    Ok(spec.map(load_specification).transpose()?.unwrap_or_default())
}
