// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flowline Driver
//!
//! Minimal driver over the orchestrator: parse and validate arguments,
//! load the layered configuration, initialize tracing, eagerly build the
//! catalog, register the demo pipelines, and hand the validated command
//! to the application shell. Every failure maps to a sysexits-style exit
//! code; success is 0.

use flowline::application::{shell, PipelineRegistry};
use flowline::demo::{register_demo_pipelines, ReviewsCatalog};
use flowline::infrastructure::config::AppSettings;
use flowline::infrastructure::logging::init_tracing;
use flowline_bootstrap::{bootstrap_cli, result_to_exit_code, ExitCode};
use flowline_domain::catalog::{verify_unique_keys, Catalog};
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(error) => {
            eprintln!("argument error: {}", error);
            return ExitCode::UsageError.into();
        }
    };

    let settings = match AppSettings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("configuration error: {}", error);
            return ExitCode::Config.into();
        }
    };

    if let Err(error) = init_tracing(&settings.logging, cli.verbose) {
        eprintln!("logging error: {}", error);
        return ExitCode::Software.into();
    }

    // Eager catalog initialization: every handle exists before any
    // pipeline is wired, so nothing races a lazy first touch.
    let catalog = Arc::new(ReviewsCatalog::new(settings.catalog.data_dir.clone()));
    catalog.init_eager();
    if let Err(error) = verify_unique_keys(catalog.as_ref()) {
        eprintln!("catalog error: {}", error);
        return ExitCode::Config.into();
    }

    let mut registry = PipelineRegistry::new();
    if let Err(error) = register_demo_pipelines(&mut registry, Arc::clone(&catalog), &settings) {
        eprintln!("registration error: {}", error);
        return ExitCode::Config.into();
    }

    let outcome = shell::execute(&cli.command, &registry, &settings).await;
    if let Err(error) = &outcome {
        tracing::error!("{}", error);
    }
    result_to_exit_code(outcome)
}
