// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Node Record
//!
//! The internal record the DAG is made of: one node bundled with its input
//! and output entries, its mapping metadata, its resolved dependency set,
//! and its layer assignment. The concrete node itself is gone by the time
//! this record exists — the builder closed it into the `runner` at the
//! wire site, which keeps the node list heterogeneous without giving up
//! compile-time checks where it matters.

use crate::entry::Entry;
use crate::mapping::Mapping;
use crate::PipelineError;
use futures::future::BoxFuture;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Erased execution closure of one node. Returns (input count, output
/// count) on success.
pub(crate) type NodeRunner =
    Arc<dyn Fn() -> BoxFuture<'static, Result<(usize, usize), PipelineError>> + Send + Sync>;

/// One node wired into a pipeline: entries, mappings, dependencies, layer.
pub struct PipelineNode {
    name: String,
    inputs: Vec<Arc<dyn Entry>>,
    outputs: Vec<Arc<dyn Entry>>,
    input_mappings: Option<Vec<Mapping>>,
    output_mappings: Option<Vec<Mapping>>,
    runner: NodeRunner,
    deps: BTreeSet<usize>,
    layer: Option<usize>,
}

impl PipelineNode {
    pub(crate) fn new(
        name: String,
        inputs: Vec<Arc<dyn Entry>>,
        outputs: Vec<Arc<dyn Entry>>,
        input_mappings: Option<Vec<Mapping>>,
        output_mappings: Option<Vec<Mapping>>,
        runner: NodeRunner,
    ) -> Self {
        Self {
            name,
            inputs,
            outputs,
            input_mappings,
            output_mappings,
            runner,
            deps: BTreeSet::new(),
            layer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Arc<dyn Entry>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Arc<dyn Entry>] {
        &self.outputs
    }

    pub fn input_mappings(&self) -> Option<&[Mapping]> {
        self.input_mappings.as_deref()
    }

    pub fn output_mappings(&self) -> Option<&[Mapping]> {
        self.output_mappings.as_deref()
    }

    /// Indices of the nodes this node depends on. Empty until analysis.
    pub fn deps(&self) -> &BTreeSet<usize> {
        &self.deps
    }

    /// Layer assigned by analysis; `None` until the pipeline is built.
    pub fn layer(&self) -> Option<usize> {
        self.layer
    }

    pub(crate) fn set_analysis(&mut self, deps: BTreeSet<usize>, layer: usize) {
        self.deps = deps;
        self.layer = Some(layer);
    }

    /// Clears analysis results, returning the record to its pre-build
    /// state. Used when nodes move into a merged pipeline.
    pub(crate) fn reset_analysis(&mut self) {
        self.deps.clear();
        self.layer = None;
    }

    /// Executes the node: materialize input, transform, write outputs.
    pub(crate) async fn execute(&self) -> Result<(usize, usize), PipelineError> {
        (self.runner)().await
    }
}

impl std::fmt::Debug for PipelineNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineNode")
            .field("name", &self.name)
            .field("inputs", &self.inputs.iter().map(|e| e.key()).collect::<Vec<_>>())
            .field("outputs", &self.outputs.iter().map(|e| e.key()).collect::<Vec<_>>())
            .field("deps", &self.deps)
            .field("layer", &self.layer)
            .finish()
    }
}
