// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions,
//! mapped from the domain error taxonomy:
//!
//! - **0**: success
//! - **1**: general failure (including failed runs)
//! - **64-78**: specific conditions (usage, data, input, config)
//! - **130/143**: signal terminations
//!
//! The orchestrator's contract is simply zero/non-zero; the finer-grained
//! codes exist for scripts that want to distinguish "file missing" from
//! "pipeline cycle" without parsing stderr.

use flowline_domain::PipelineError;
use std::fmt;

/// Exit codes following Unix conventions (BSD sysexits.h)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful termination (0)
    #[default]
    Success = 0,

    /// General error (1)
    Error = 1,

    /// Command line usage error (64)
    UsageError = 64,

    /// Data format error (65)
    DataError = 65,

    /// Cannot open input (66)
    NoInput = 66,

    /// Internal software error (70)
    Software = 70,

    /// I/O error (74)
    IoError = 74,

    /// Configuration error (78)
    Config = 78,

    /// Interrupted by signal (SIGINT - Ctrl+C) (130)
    Interrupted = 130,

    /// Terminated by signal (SIGTERM) (143)
    Terminated = 143,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a domain error to the closest sysexits code.
    pub fn from_pipeline_error(error: &PipelineError) -> Self {
        match error {
            PipelineError::InvalidConfiguration(_) => ExitCode::Config,
            PipelineError::SingleWriterViolation(_)
            | PipelineError::CycleDetected(_)
            | PipelineError::MissingMapping(_)
            | PipelineError::DuplicateNode(_) => ExitCode::DataError,
            PipelineError::ValidationFailed(_) => ExitCode::NoInput,
            PipelineError::PipelineNotFound(_) => ExitCode::UsageError,
            PipelineError::IoError(_) => ExitCode::IoError,
            PipelineError::SerializationError(_) => ExitCode::DataError,
            PipelineError::Cancelled(_) => ExitCode::Interrupted,
            PipelineError::InternalError(_) => ExitCode::Software,
            _ => ExitCode::Error,
        }
    }

    /// Get human-readable description of exit code
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Software => "Internal software error",
            ExitCode::IoError => "I/O error",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    /// Check if this is a success exit code
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Check if this is an error exit code
    pub fn is_error(self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        // Process exit codes are u8; the sysexits range fits.
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

/// Maps an application result to a process exit code.
pub fn result_to_exit_code(result: Result<(), PipelineError>) -> std::process::ExitCode {
    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(error) => ExitCode::from_pipeline_error(&error).into(),
    }
}
