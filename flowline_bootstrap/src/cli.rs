// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parsing and Validation
//!
//! Clap-based argument parsing followed by a validation pass that turns
//! the raw parse into a [`ValidatedCli`]. Validation rejects pipeline
//! names outside the registry's naming alphabet before any registry
//! lookup happens, so a typo'd or hostile name fails with a clear usage
//! error instead of a confusing "not found".

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while parsing or validating CLI arguments.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid value for --{arg}: {reason}")]
    InvalidValue { arg: String, reason: String },

    #[error("invalid pipeline name '{name}': {reason}")]
    InvalidPipelineName { name: String, reason: String },
}

/// Output format of a DAG export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Mermaid,
}

#[derive(Debug, Parser)]
#[command(
    name = "flowline",
    about = "Declarative, typed data-pipeline orchestrator",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the base configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a named pipeline, or merge and run all registered pipelines
    Run {
        /// Pipeline to run; all registered pipelines are merged when omitted
        pipeline: Option<String>,

        /// Build and validate only; skip execution
        #[arg(long)]
        dry_run: bool,
    },

    /// List registered pipelines
    List,

    /// Build a pipeline and export its DAG structure
    Export {
        /// Pipeline to export
        pipeline: String,

        /// Export format
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Output directory (defaults to the configured metadata directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Validated command, ready for the application shell.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run {
        pipeline: Option<String>,
        dry_run: bool,
    },
    List,
    Export {
        pipeline: String,
        format: ExportFormat,
        output: Option<PathBuf>,
    },
}

/// Parsed and validated CLI arguments.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub config: Option<PathBuf>,
    pub verbose: u8,
}

/// Parses the process arguments and validates them.
///
/// Clap handles `--help` and `--version` itself and exits the process.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate_cli(Cli::parse())
}

/// Checks a pipeline name against the registry naming alphabet.
///
/// Names are lowercase identifiers with `_`, `-` and `.` separators; the
/// same alphabet the registry accepts at registration time.
pub fn validate_pipeline_name(name: &str) -> Result<(), ParseError> {
    if name.is_empty() {
        return Err(ParseError::InvalidPipelineName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }
    if name.len() > 128 {
        return Err(ParseError::InvalidPipelineName {
            name: name.to_string(),
            reason: "name exceeds 128 characters".to_string(),
        });
    }
    let valid = name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if !valid {
        return Err(ParseError::InvalidPipelineName {
            name: name.to_string(),
            reason: "only ASCII alphanumerics, '_', '-' and '.' are allowed".to_string(),
        });
    }
    Ok(())
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let command = match cli.command {
        Commands::Run { pipeline, dry_run } => {
            if let Some(ref name) = pipeline {
                validate_pipeline_name(name)?;
            }
            ValidatedCommand::Run { pipeline, dry_run }
        }
        Commands::List => ValidatedCommand::List,
        Commands::Export {
            pipeline,
            format,
            output,
        } => {
            validate_pipeline_name(&pipeline)?;
            ValidatedCommand::Export {
                pipeline,
                format,
                output,
            }
        }
    };

    Ok(ValidatedCli {
        command,
        config: cli.config,
        verbose: cli.verbose,
    })
}
