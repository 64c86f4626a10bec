// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Infrastructure
//!
//! Tracing subscriber initialization from the `logging` configuration
//! section, plus the bridge that backs the domain's logger port with
//! `tracing` so pipelines and nodes log through the same subscriber as
//! the rest of the binary.
//!
//! Precedence: `RUST_LOG` wins when set; otherwise the configured minimum
//! level plus per-target overrides, escalated by `-v`/`-vv`.

use crate::infrastructure::config::LoggingSettings;
use flowline_domain::logging::PipelineLogger;
use flowline_domain::PipelineError;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
pub fn init_tracing(settings: &LoggingSettings, verbosity: u8) -> Result<(), PipelineError> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let base = match verbosity {
            0 => settings.level.as_str(),
            1 => "debug",
            _ => "trace",
        };
        let mut filter = EnvFilter::try_new(base)
            .map_err(|error| PipelineError::invalid_config(format!("logging.level '{}': {}", base, error)))?;
        for (target, level) in &settings.targets {
            let directive = format!("{}={}", target, level).parse().map_err(|error| {
                PipelineError::invalid_config(format!("logging.targets.{} = '{}': {}", target, level, error))
            })?;
            filter = filter.add_directive(directive);
        }
        filter
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| PipelineError::internal_error(format!("tracing init failed: {}", error)))
}

/// Backs the domain logger port with the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl PipelineLogger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}

/// Shared tracing-backed logger for injection into pipelines and nodes.
pub fn tracing_logger() -> Arc<dyn PipelineLogger> {
    Arc::new(TracingLogger)
}
