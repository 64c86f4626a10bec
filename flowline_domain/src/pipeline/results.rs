// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Run Results
//!
//! Per-run reporting structures. A [`PipelineResult`] aggregates one
//! [`NodeResult`] per node in execution order; results are values, so a
//! failed run is still a returned result, not an escaped error. Dry runs
//! produce a result of their own kind carrying the pre-flight summary.

use crate::PipelineError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

/// Outcome of one node within a run.
#[derive(Debug, Clone)]
pub struct NodeResult {
    name: String,
    success: bool,
    ran: bool,
    elapsed: Duration,
    input_count: usize,
    output_count: usize,
    error: Option<PipelineError>,
}

impl NodeResult {
    pub(crate) fn succeeded(name: &str, elapsed: Duration, input_count: usize, output_count: usize) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            ran: true,
            elapsed,
            input_count,
            output_count,
            error: None,
        }
    }

    pub(crate) fn failed(name: &str, elapsed: Duration, error: PipelineError) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            ran: true,
            elapsed,
            input_count: 0,
            output_count: 0,
            error: Some(error),
        }
    }

    /// Marks a node the run never reached: an upstream failure or a
    /// cancellation halted execution first.
    pub(crate) fn not_run(name: &str) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            ran: false,
            elapsed: Duration::ZERO,
            input_count: 0,
            output_count: 0,
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// Whether the node actually executed. `false` means the run halted
    /// before reaching it.
    pub fn ran(&self) -> bool {
        self.ran
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }
}

/// Pre-flight summary attached to a dry-run result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DryRunSummary {
    pub node_count: usize,
    pub layer_count: usize,
    pub validated_input_count: usize,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    success: bool,
    started_at: DateTime<Utc>,
    elapsed: Duration,
    node_results: Vec<NodeResult>,
    error: Option<PipelineError>,
    dry_run: Option<DryRunSummary>,
}

impl PipelineResult {
    pub(crate) fn succeeded(started_at: DateTime<Utc>, elapsed: Duration, node_results: Vec<NodeResult>) -> Self {
        Self {
            success: true,
            started_at,
            elapsed,
            node_results,
            error: None,
            dry_run: None,
        }
    }

    pub(crate) fn failed(
        started_at: DateTime<Utc>,
        elapsed: Duration,
        node_results: Vec<NodeResult>,
        error: PipelineError,
    ) -> Self {
        Self {
            success: false,
            started_at,
            elapsed,
            node_results,
            error: Some(error),
            dry_run: None,
        }
    }

    /// A run that was rejected before any node executed (not built,
    /// internal precondition failed).
    pub(crate) fn rejected(error: PipelineError) -> Self {
        Self {
            success: false,
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            node_results: Vec::new(),
            error: Some(error),
            dry_run: None,
        }
    }

    /// A successful dry run: built, validated, reported, nothing executed.
    pub fn dry_run_success(summary: DryRunSummary) -> Self {
        Self {
            success: true,
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            node_results: Vec::new(),
            error: None,
            dry_run: Some(summary),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// UTC instant the run started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Node results in execution order.
    pub fn node_results(&self) -> &[NodeResult] {
        &self.node_results
    }

    /// Looks up one node's result by name.
    pub fn node_result(&self, name: &str) -> Option<&NodeResult> {
        self.node_results.iter().find(|result| result.name() == name)
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    pub fn dry_run(&self) -> Option<&DryRunSummary> {
        self.dry_run.as_ref()
    }
}

impl fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(summary) = &self.dry_run {
            return write!(
                f,
                "dry run ok: {} node(s) in {} layer(s), {} input(s) validated",
                summary.node_count, summary.layer_count, summary.validated_input_count
            );
        }
        if self.success {
            write!(
                f,
                "succeeded: {} node(s) in {:.1}ms",
                self.node_results.len(),
                self.elapsed.as_secs_f64() * 1000.0
            )
        } else {
            let ran = self.node_results.iter().filter(|result| result.ran()).count();
            write!(f, "failed after {} node(s)", ran)?;
            if let Some(error) = &self.error {
                write!(f, ": {}", error)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_result_constructors() {
        let ok = NodeResult::succeeded("parse", Duration::from_millis(5), 10, 10);
        assert!(ok.success());
        assert!(ok.ran());
        assert_eq!(ok.input_count(), 10);

        let failed = NodeResult::failed("parse", Duration::ZERO, PipelineError::io_error("disk"));
        assert!(!failed.success());
        assert!(failed.ran());
        assert!(failed.error().is_some());

        let skipped = NodeResult::not_run("enrich");
        assert!(!skipped.success());
        assert!(!skipped.ran());
        assert!(skipped.error().is_none());
    }

    #[test]
    fn test_pipeline_result_lookup_by_name() {
        let result = PipelineResult::succeeded(
            Utc::now(),
            Duration::from_millis(12),
            vec![
                NodeResult::succeeded("first", Duration::from_millis(5), 1, 1),
                NodeResult::succeeded("second", Duration::from_millis(7), 1, 2),
            ],
        );
        assert!(result.success());
        assert_eq!(result.node_result("second").map(|r| r.output_count()), Some(2));
        assert!(result.node_result("missing").is_none());
    }

    #[test]
    fn test_dry_run_result_reports_counts() {
        let result = PipelineResult::dry_run_success(DryRunSummary {
            node_count: 3,
            layer_count: 2,
            validated_input_count: 4,
        });
        assert!(result.success());
        assert!(result.node_results().is_empty());
        let text = result.to_string();
        assert!(text.contains("3 node(s)"));
        assert!(text.contains("2 layer(s)"));
    }
}
