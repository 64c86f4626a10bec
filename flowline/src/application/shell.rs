// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Shell
//!
//! Glue between the validated CLI and the orchestrator: select or merge
//! pipelines, apply configured validation overrides, run the pre-flight,
//! execute or stop at a dry run, and report. Every failure path names its
//! phase (build / pre-flight / execution) and the offending entry or
//! node; the caller maps the returned error to an exit code.

use crate::application::registry::PipelineRegistry;
use crate::infrastructure::config::AppSettings;
use crate::infrastructure::logging::tracing_logger;
use crate::infrastructure::metadata::{provider_for, write_export};
use flowline_bootstrap::{spawn_signal_handler, ExportFormat, ValidatedCommand};
use flowline_domain::pipeline::DryRunSummary;
use flowline_domain::{CancellationToken, Pipeline, PipelineError, PipelineResult};
use std::path::PathBuf;

/// Executes one validated command against the registry.
pub async fn execute(
    command: &ValidatedCommand,
    registry: &PipelineRegistry,
    settings: &AppSettings,
) -> Result<(), PipelineError> {
    match command {
        ValidatedCommand::List => list(registry),
        ValidatedCommand::Export {
            pipeline,
            format,
            output,
        } => export(registry, settings, pipeline, *format, output.clone()).await,
        ValidatedCommand::Run { pipeline, dry_run } => run(registry, settings, pipeline.as_deref(), *dry_run).await,
    }
}

fn list(registry: &PipelineRegistry) -> Result<(), PipelineError> {
    if registry.is_empty() {
        println!("no pipelines registered");
        return Ok(());
    }
    println!("registered pipelines:");
    for (name, description) in registry.names() {
        if description.is_empty() {
            println!("  {}", name);
        } else {
            println!("  {}  -  {}", name, description);
        }
    }
    Ok(())
}

/// Builds one registered pipeline and applies its configured overrides.
fn prepare(registry: &PipelineRegistry, settings: &AppSettings, name: &str) -> Result<Pipeline, PipelineError> {
    let mut pipeline = registry.build(name)?;
    pipeline.set_logger(tracing_logger());
    if let Some(section) = settings.pipeline(name) {
        for (entry_key, level) in &section.validation {
            pipeline.set_inspection_override(entry_key.clone(), *level);
        }
    }
    Ok(pipeline)
}

/// Resolves the selection: one named pipeline, or the merge of all.
fn select(
    registry: &PipelineRegistry,
    settings: &AppSettings,
    name: Option<&str>,
) -> Result<Pipeline, PipelineError> {
    match name {
        Some(name) => {
            let mut pipeline = prepare(registry, settings, name)?;
            pipeline.build()?;
            Ok(pipeline)
        }
        None => {
            if registry.is_empty() {
                return Err(PipelineError::invalid_config("no pipelines are registered"));
            }
            let mut prepared = Vec::new();
            for (name, _) in registry.names() {
                prepared.push((name.to_string(), prepare(registry, settings, name)?));
            }
            // Merge analyzes the union; cross-pipeline collisions fail here.
            let mut merged = Pipeline::merge(prepared)?;
            merged.set_logger(tracing_logger());
            Ok(merged)
        }
    }
}

async fn export(
    registry: &PipelineRegistry,
    settings: &AppSettings,
    name: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<(), PipelineError> {
    let pipeline = select(registry, settings, Some(name))?;
    let dag = pipeline.export_dag()?;

    let provider_name = match format {
        ExportFormat::Json => "json",
        ExportFormat::Mermaid => "mermaid",
    };
    let provider = provider_for(provider_name)
        .ok_or_else(|| PipelineError::internal_error(format!("no provider named '{}'", provider_name)))?;
    let directory = output.unwrap_or_else(|| settings.metadata.output_dir.clone());

    let path = write_export(provider.as_ref(), &dag, &directory).await?;
    println!("exported '{}' to {}", name, path.display());
    Ok(())
}

async fn run(
    registry: &PipelineRegistry,
    settings: &AppSettings,
    name: Option<&str>,
    dry_run: bool,
) -> Result<(), PipelineError> {
    let pipeline = select(registry, settings, name)?;
    let display_name = pipeline.name().unwrap_or("<unnamed>").to_string();

    // Pre-flight: aggregate every defect before refusing to run.
    let validation = pipeline.validate_external_inputs().await?;
    if !validation.is_valid() {
        eprintln!("pre-flight validation failed for '{}':", display_name);
        for error in validation.errors() {
            eprintln!("  - {}", error);
        }
        return Err(PipelineError::ValidationFailed(validation.summary()));
    }
    tracing::info!("pre-flight passed for '{}'", display_name);

    if dry_run {
        let result = PipelineResult::dry_run_success(DryRunSummary {
            node_count: pipeline.nodes().len(),
            layer_count: pipeline.layers().map_or(0, |layers| layers.len()),
            validated_input_count: pipeline.validated_input_count(),
        });
        println!("{}: {}", display_name, result);
        return Ok(());
    }

    let token = CancellationToken::new();
    let signal_handle = spawn_signal_handler(token.clone());
    let result = pipeline.run(&token).await;
    signal_handle.abort();

    report(&display_name, &result);
    if result.success() {
        Ok(())
    } else {
        Err(result
            .error()
            .cloned()
            .unwrap_or_else(|| PipelineError::internal_error("run failed without a recorded error")))
    }
}

fn report(name: &str, result: &PipelineResult) {
    let started = result.started_at().format("%Y-%m-%dT%H:%M:%S%.3fZ");
    println!("{} (started {}): {}", name, started, result);
    for node in result.node_results() {
        if !node.ran() {
            println!("  - {}: not run", node.name());
        } else if node.success() {
            println!(
                "  - {}: ok ({} in / {} out, {:.1}ms)",
                node.name(),
                node.input_count(),
                node.output_count(),
                node.elapsed().as_secs_f64() * 1000.0
            );
        } else {
            let message = node.error().map_or_else(|| "failed".to_string(), |error| error.to_string());
            println!("  - {}: FAILED ({})", node.name(), message);
        }
    }
}
