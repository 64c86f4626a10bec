// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the error type shared by every layer of the flowline
//! orchestrator. It categorizes failures along the lifecycle of a pipeline:
//!
//! - **Wire-time errors** are raised while a pipeline is assembled and
//!   analyzed: single-writer violations, cycles, missing mapping properties,
//!   duplicate node names. They are unrecoverable for the pipeline.
//! - **Pre-flight errors** come out of input inspection and are aggregated
//!   into a [`ValidationResult`](crate::entry::ValidationResult) rather than
//!   raised one at a time; `ValidationFailed` summarizes them at the
//!   orchestrator boundary.
//! - **Runtime errors** are raised while a pipeline runs: a node transform
//!   failed, an entry load or save failed, or the run was cancelled.
//! - **Usage errors** indicate an API misuse that no retry will fix: loading
//!   a memory entry before anything was saved to it, saving a wrongly-typed
//!   value through an erased handle, running a pipeline that was never built.
//!
//! Errors are values, not side channels: execution returns a
//! [`PipelineResult`](crate::pipeline::PipelineResult) whose `error` carries
//! the triggering failure together with the offending node name. Nothing is
//! swallowed silently; warnings are logged but never change a result.

use thiserror::Error;

/// Domain-specific errors for the pipeline orchestration system.
///
/// Each variant carries a descriptive message naming the offending entry,
/// node, or mapping property so failures can be diagnosed without a
/// debugger. Variants are grouped by lifecycle phase; [`category`] exposes
/// the grouping for structured reporting.
///
/// [`category`]: PipelineError::category
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Single-writer violation: {0}")]
    SingleWriterViolation(String),

    #[error("Cycle detected: {0}")]
    CycleDetected(String),

    #[error("Missing mapping: {0}")]
    MissingMapping(String),

    #[error("Duplicate node: {0}")]
    DuplicateNode(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Node '{node}' failed: {message}")]
    NodeFailed { node: String, message: String },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    #[error("Load before save: {0}")]
    LoadBeforeSave(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Pipeline not built: {0}")]
    NotBuilt(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl PipelineError {
    /// Creates a new configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Creates a new missing-mapping error
    pub fn missing_mapping(msg: impl Into<String>) -> Self {
        Self::MissingMapping(msg.into())
    }

    /// Creates a new type-mismatch error
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Creates a new unsupported-operation error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Creates a new IO error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Creates a new serialization error
    pub fn serialization_error(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Creates a new internal error
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// Wraps a failure raised while executing the named node.
    pub fn node_failed(node: impl Into<String>, source: &PipelineError) -> Self {
        Self::NodeFailed {
            node: node.into(),
            message: source.to_string(),
        }
    }

    /// Checks if the error is recoverable
    ///
    /// Only transient I/O conditions qualify; every wire-time and usage
    /// error is permanent for the pipeline that raised it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::IoError(_))
    }

    /// Checks if the error was raised before any node ran
    pub fn is_wire_time(&self) -> bool {
        matches!(
            self,
            PipelineError::SingleWriterViolation(_)
                | PipelineError::CycleDetected(_)
                | PipelineError::MissingMapping(_)
                | PipelineError::DuplicateNode(_)
        )
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::InvalidConfiguration(_) => "configuration",
            PipelineError::SingleWriterViolation(_) => "wiring",
            PipelineError::CycleDetected(_) => "wiring",
            PipelineError::MissingMapping(_) => "wiring",
            PipelineError::DuplicateNode(_) => "wiring",
            PipelineError::ValidationFailed(_) => "validation",
            PipelineError::NodeFailed { .. } => "execution",
            PipelineError::TypeMismatch(_) => "usage",
            PipelineError::UnsupportedOperation(_) => "usage",
            PipelineError::LoadBeforeSave(_) => "usage",
            PipelineError::IoError(_) => "io",
            PipelineError::SerializationError(_) => "serialization",
            PipelineError::Cancelled(_) => "cancellation",
            PipelineError::PipelineNotFound(_) => "pipeline",
            PipelineError::NotBuilt(_) => "usage",
            PipelineError::InternalError(_) => "internal",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_groups_wire_time_errors() {
        assert_eq!(
            PipelineError::SingleWriterViolation("e".into()).category(),
            "wiring"
        );
        assert_eq!(PipelineError::CycleDetected("c".into()).category(), "wiring");
        assert_eq!(PipelineError::MissingMapping("m".into()).category(), "wiring");
    }

    #[test]
    fn test_is_wire_time() {
        assert!(PipelineError::CycleDetected("a -> b -> a".into()).is_wire_time());
        assert!(!PipelineError::IoError("disk".into()).is_wire_time());
    }

    #[test]
    fn test_node_failed_carries_node_name() {
        let inner = PipelineError::io_error("read failed");
        let err = PipelineError::node_failed("parse_ratings", &inner);
        let msg = err.to_string();
        assert!(msg.contains("parse_ratings"));
        assert!(msg.contains("read failed"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PipelineError = io.into();
        assert_eq!(err.category(), "io");
        assert!(err.is_recoverable());
    }
}
