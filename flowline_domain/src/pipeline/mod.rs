// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline
//!
//! The built, analyzed, executable set of nodes. A pipeline's life has
//! four phases, each with its own failure surface:
//!
//! 1. **Wiring** — [`PipelineBuilder`] assembles the node list; type
//!    mismatches are compile errors, mapping and naming defects surface
//!    from `finish()`.
//! 2. **Build** — [`Pipeline::build`] runs the dependency analyzer:
//!    single-writer enforcement, cycle detection, topological layering.
//! 3. **Pre-flight** — [`Pipeline::validate_external_inputs`] inspects
//!    the external inputs concurrently and aggregates every defect.
//! 4. **Run** — [`Pipeline::run`] walks the layers; within a layer nodes
//!    execute sequentially in insertion order. The first failure halts
//!    the run, remaining nodes are marked not-run, and the result carries
//!    the offending node's name.
//!
//! Merging unions the node lists of several pipelines and re-analyzes;
//! the single-writer rule catches cross-pipeline output collisions.

mod analyzer;
mod builder;
mod dag;
mod io;
mod node;
mod results;
mod validation;

pub use analyzer::DependencyAnalyzer;
pub use builder::PipelineBuilder;
pub use dag::{DagEntry, DagExport, DagNode};
pub use io::{NodeInput, NodeOutput};
pub use node::PipelineNode;
pub use results::{DryRunSummary, NodeResult, PipelineResult};
pub use validation::{effective_inspection_level, ValidationOptions};

use crate::cancellation::CancellationToken;
use crate::entry::{
    entry_identity, Entry, InspectionLevel, ValidationError, ValidationErrorKind, ValidationResult,
};
use crate::logging::PipelineLogger;
use crate::PipelineError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// A named set of wired nodes with an optional layer assignment.
pub struct Pipeline {
    name: Option<String>,
    nodes: Vec<PipelineNode>,
    layers: Option<Vec<Vec<usize>>>,
    built: bool,
    logger: Arc<dyn PipelineLogger>,
    validation: ValidationOptions,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("nodes", &self.nodes)
            .field("layers", &self.layers)
            .field("built", &self.built)
            .field("validation", &self.validation)
            .finish()
    }
}

impl Pipeline {
    pub(crate) fn new_unbuilt(
        name: Option<String>,
        nodes: Vec<PipelineNode>,
        logger: Arc<dyn PipelineLogger>,
        validation: ValidationOptions,
    ) -> Self {
        Self {
            name,
            nodes,
            layers: None,
            built: false,
            logger,
            validation,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    pub fn nodes(&self) -> &[PipelineNode] {
        &self.nodes
    }

    /// Topological layer grouping, as indices into [`nodes`](Self::nodes).
    /// `None` until built.
    pub fn layers(&self) -> Option<&[Vec<usize>]> {
        self.layers.as_deref()
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn set_logger(&mut self, logger: Arc<dyn PipelineLogger>) {
        self.logger = logger;
    }

    pub fn validation_options(&self) -> &ValidationOptions {
        &self.validation
    }

    /// Forces an inspection level for one external entry key.
    pub fn set_inspection_override(&mut self, entry_key: impl Into<String>, level: InspectionLevel) {
        self.validation.set_override(entry_key, level);
    }

    /// Analyzes the node list: single-writer enforcement, dependency
    /// resolution, cycle detection, layering.
    ///
    /// Idempotent on a frozen node set — a second call reproduces the same
    /// layer assignment and logs a warning.
    pub fn build(&mut self) -> Result<(), PipelineError> {
        if self.nodes.is_empty() {
            return Err(PipelineError::invalid_config(format!(
                "pipeline '{}' has no nodes",
                self.display_name()
            )));
        }
        if self.built {
            self.logger
                .warn(&format!("pipeline '{}' is already built; re-running analysis", self.display_name()));
        }
        let layers = DependencyAnalyzer::analyze(&mut self.nodes)?;
        self.layers = Some(layers);
        self.built = true;
        Ok(())
    }

    /// External inputs of the pipeline: every input entry no node of this
    /// pipeline produces, deduplicated by identity in first-seen order.
    pub fn external_inputs(&self) -> Vec<Arc<dyn Entry>> {
        let produced: HashSet<usize> = self
            .nodes
            .iter()
            .flat_map(|node| node.outputs().iter().map(entry_identity))
            .collect();

        let mut seen = HashSet::new();
        let mut externals = Vec::new();
        for node in &self.nodes {
            for input in node.inputs() {
                let identity = entry_identity(input);
                if !produced.contains(&identity) && seen.insert(identity) {
                    externals.push(Arc::clone(input));
                }
            }
        }
        externals
    }

    /// Pre-flight inspection of the external inputs.
    ///
    /// Resolves the effective inspection level per entry, skips entries
    /// resolved to `None`, runs the remaining inspections concurrently and
    /// aggregates every defect in entry iteration order. Never inspects an
    /// entry any node produces, and never mutates anything.
    pub async fn validate_external_inputs(&self) -> Result<ValidationResult, PipelineError> {
        if !self.built {
            return Err(PipelineError::NotBuilt(format!(
                "pipeline '{}' must be built before validation",
                self.display_name()
            )));
        }

        let sample_size = self.validation.sample_size();
        let targets: Vec<(Arc<dyn Entry>, InspectionLevel)> = self
            .external_inputs()
            .into_iter()
            .map(|entry| {
                let level = effective_inspection_level(&entry, &self.validation);
                (entry, level)
            })
            .filter(|(_, level)| *level != InspectionLevel::None)
            .collect();

        let inspections = targets.iter().map(|(entry, level)| {
            let entry = Arc::clone(entry);
            let level = *level;
            async move {
                let outcome = match level {
                    InspectionLevel::Shallow => entry.inspect_shallow(sample_size).await,
                    InspectionLevel::Deep => entry.inspect_deep().await,
                    InspectionLevel::None => Ok(Vec::new()),
                };
                (entry, outcome)
            }
        });

        // join_all preserves input order, so aggregation follows entry
        // iteration order regardless of completion order.
        let outcomes = futures::future::join_all(inspections).await;
        let mut result = ValidationResult::new();
        for (entry, outcome) in outcomes {
            match outcome {
                Ok(errors) => result.extend(errors),
                Err(error) => result.push(ValidationError::new(
                    entry.key(),
                    ValidationErrorKind::InspectionFailure,
                    error.to_string(),
                )),
            }
        }
        Ok(result)
    }

    /// Number of external inputs that would actually be inspected under
    /// the current options. Reported by dry runs.
    pub fn validated_input_count(&self) -> usize {
        self.external_inputs()
            .iter()
            .filter(|entry| effective_inspection_level(entry, &self.validation) != InspectionLevel::None)
            .count()
    }

    /// Structural DAG description for metadata providers. Side-effect-free.
    pub fn export_dag(&self) -> Result<DagExport, PipelineError> {
        if !self.built {
            return Err(PipelineError::NotBuilt(format!(
                "pipeline '{}' must be built before export",
                self.display_name()
            )));
        }

        let nodes = self
            .nodes
            .iter()
            .map(|node| DagNode {
                name: node.name().to_string(),
                inputs: node.inputs().iter().map(|entry| entry.key().to_string()).collect(),
                outputs: node.outputs().iter().map(|entry| entry.key().to_string()).collect(),
                layer: node.layer().unwrap_or(0),
            })
            .collect();

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for node in &self.nodes {
            for entry in node.inputs().iter().chain(node.outputs()) {
                if seen.insert(entry_identity(entry)) {
                    entries.push(DagEntry {
                        key: entry.key().to_string(),
                        data_type_name: entry.data_type_name().to_string(),
                        capabilities: entry.capabilities().iter().map(|tag| tag.to_string()).collect(),
                    });
                }
            }
        }

        Ok(DagExport {
            name: self.name.clone(),
            nodes,
            entries,
        })
    }

    /// Executes the pipeline layer by layer.
    ///
    /// Within a layer, nodes run sequentially in insertion order. For each
    /// node the executor materializes the input, calls the transform,
    /// writes the outputs and records timing and counts. The first failure
    /// halts the run; cancellation is checked between nodes and produces a
    /// distinguished failure while completed node results are retained.
    pub async fn run(&self, cancellation: &CancellationToken) -> PipelineResult {
        let started = Instant::now();
        let started_at = chrono::Utc::now();
        if !self.built {
            return PipelineResult::rejected(PipelineError::NotBuilt(format!(
                "pipeline '{}' must be built before it runs",
                self.display_name()
            )));
        }
        let Some(layers) = self.layers.as_ref() else {
            return PipelineResult::rejected(PipelineError::internal_error(format!(
                "pipeline '{}' is marked built but has no layer assignment",
                self.display_name()
            )));
        };

        let execution_order: Vec<usize> = layers.iter().flatten().copied().collect();
        let mut node_results = Vec::with_capacity(execution_order.len());
        let mut executed: HashSet<usize> = HashSet::new();
        let mut failure: Option<PipelineError> = None;

        for &index in &execution_order {
            let node = &self.nodes[index];
            if cancellation.is_cancelled() {
                self.logger
                    .warn(&format!("pipeline '{}' cancelled before node '{}'", self.display_name(), node.name()));
                failure = Some(PipelineError::Cancelled(format!(
                    "run cancelled before node '{}'",
                    node.name()
                )));
                break;
            }

            self.logger.debug(&format!(
                "running node '{}' (layer {})",
                node.name(),
                node.layer().unwrap_or(0)
            ));
            let node_started = Instant::now();
            match node.execute().await {
                Ok((input_count, output_count)) => {
                    executed.insert(index);
                    node_results.push(NodeResult::succeeded(
                        node.name(),
                        node_started.elapsed(),
                        input_count,
                        output_count,
                    ));
                }
                Err(error) => {
                    self.logger
                        .error(&format!("node '{}' failed: {}", node.name(), error));
                    executed.insert(index);
                    node_results.push(NodeResult::failed(node.name(), node_started.elapsed(), error.clone()));
                    failure = Some(PipelineError::node_failed(node.name(), &error));
                    break;
                }
            }
        }

        match failure {
            None => PipelineResult::succeeded(started_at, started.elapsed(), node_results),
            Some(error) => {
                for &index in &execution_order {
                    if !executed.contains(&index) {
                        node_results.push(NodeResult::not_run(self.nodes[index].name()));
                    }
                }
                PipelineResult::failed(started_at, started.elapsed(), node_results, error)
            }
        }
    }

    /// Unions several named pipelines into one and analyzes the result.
    ///
    /// Node lists are concatenated in the given order; layer assignments
    /// are recomputed from scratch. Two pipelines producing the same entry
    /// is a fatal configuration bug surfaced by the single-writer rule,
    /// not a merge resolution step.
    pub fn merge(pipelines: impl IntoIterator<Item = (String, Pipeline)>) -> Result<Pipeline, PipelineError> {
        let mut names = Vec::new();
        let mut nodes = Vec::new();
        let mut logger: Option<Arc<dyn PipelineLogger>> = None;
        let mut validation = ValidationOptions::new();

        for (name, pipeline) in pipelines {
            names.push(name);
            let (mut taken_nodes, taken_validation, taken_logger) = pipeline.into_parts();
            for node in &mut taken_nodes {
                node.reset_analysis();
            }
            nodes.extend(taken_nodes);
            validation.merge_from(taken_validation);
            logger.get_or_insert(taken_logger);
        }

        let mut name_check: HashMap<&str, ()> = HashMap::new();
        for node in &nodes {
            if name_check.insert(node.name(), ()).is_some() {
                return Err(PipelineError::DuplicateNode(format!(
                    "merged pipelines both contain a node named '{}'",
                    node.name()
                )));
            }
        }

        let mut merged = Pipeline::new_unbuilt(
            Some(names.join("+")),
            nodes,
            logger.unwrap_or_else(crate::logging::noop_logger),
            validation,
        );
        merged.build()?;
        Ok(merged)
    }

    fn into_parts(self) -> (Vec<PipelineNode>, ValidationOptions, Arc<dyn PipelineLogger>) {
        (self.nodes, self.validation, self.logger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{DatasetEntry, MemoryEntry};
    use crate::node::Node;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Double;

    impl Node for Double {
        type Input = u32;
        type Output = u32;

        fn transform(&self, items: Vec<u32>) -> Result<Vec<u32>, PipelineError> {
            Ok(items.into_iter().map(|value| value * 2).collect())
        }
    }

    #[derive(Default)]
    struct Failing;

    impl Node for Failing {
        type Input = u32;
        type Output = u32;

        fn transform(&self, _items: Vec<u32>) -> Result<Vec<u32>, PipelineError> {
            Err(PipelineError::invalid_config("transform rejected the batch"))
        }
    }

    static TRANSFORM_CALLS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Counting;

    impl Node for Counting {
        type Input = u32;
        type Output = u32;

        fn transform(&self, items: Vec<u32>) -> Result<Vec<u32>, PipelineError> {
            TRANSFORM_CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(items)
        }
    }

    fn entry(key: &str, items: Vec<u32>) -> Arc<MemoryEntry<u32>> {
        MemoryEntry::with_items(key, items)
    }

    #[tokio::test]
    async fn test_single_node_pipeline_runs_in_one_layer() {
        let raw = entry("raw", vec![1, 2, 3]);
        let out = MemoryEntry::<u32>::new("out");

        let mut pipeline = PipelineBuilder::named("single")
            .add_node("double", Double, NodeInput::dataset(raw), NodeOutput::dataset(Arc::clone(&out)))
            .finish()
            .unwrap();
        pipeline.build().unwrap();

        let result = pipeline.run(&CancellationToken::new()).await;
        assert!(result.success());
        assert_eq!(result.node_results().len(), 1);
        let node = result.node_result("double").expect("result recorded");
        assert_eq!(node.input_count(), 3);
        assert_eq!(node.output_count(), 3);
        assert_eq!(out.load().await.unwrap(), vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_edge_ordering_save_before_load() {
        let raw = entry("raw", vec![1]);
        let mid = MemoryEntry::<u32>::new("mid");
        let out = MemoryEntry::<u32>::new("out");

        let mut pipeline = PipelineBuilder::named("chain")
            .add_node("first", Double, NodeInput::dataset(raw), NodeOutput::dataset(Arc::clone(&mid)))
            .add_node("second", Double, NodeInput::dataset(mid), NodeOutput::dataset(Arc::clone(&out)))
            .finish()
            .unwrap();
        pipeline.build().unwrap();

        // If "second" loaded before "first" saved, the memory entry would
        // raise LoadBeforeSave and the run would fail.
        let result = pipeline.run(&CancellationToken::new()).await;
        assert!(result.success());
        assert_eq!(out.load().await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn test_failure_halts_and_marks_remaining_not_run() {
        let raw = entry("raw", vec![1]);
        let mid = MemoryEntry::<u32>::new("mid");
        let out = MemoryEntry::<u32>::new("out");

        let mut pipeline = PipelineBuilder::named("halting")
            .add_node("boom", Failing, NodeInput::dataset(raw), NodeOutput::dataset(Arc::clone(&mid)))
            .add_node("after", Double, NodeInput::dataset(mid), NodeOutput::dataset(out))
            .finish()
            .unwrap();
        pipeline.build().unwrap();

        let result = pipeline.run(&CancellationToken::new()).await;
        assert!(!result.success());
        let error = result.error().expect("failure recorded");
        assert!(error.to_string().contains("boom"));

        let failed = result.node_result("boom").expect("recorded");
        assert!(failed.ran());
        assert!(!failed.success());

        let skipped = result.node_result("after").expect("recorded");
        assert!(!skipped.ran());
    }

    #[tokio::test]
    async fn test_cancellation_between_nodes() {
        let raw = entry("raw", vec![1]);
        let mid = MemoryEntry::<u32>::new("mid");
        let out = MemoryEntry::<u32>::new("out");

        let mut pipeline = PipelineBuilder::named("cancelled")
            .add_node("first", Double, NodeInput::dataset(raw), NodeOutput::dataset(Arc::clone(&mid)))
            .add_node("second", Double, NodeInput::dataset(mid), NodeOutput::dataset(out))
            .finish()
            .unwrap();
        pipeline.build().unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let result = pipeline.run(&token).await;
        assert!(!result.success());
        assert!(matches!(result.error(), Some(PipelineError::Cancelled(_))));
        // Nothing ran: cancellation was requested before the first node.
        assert!(result.node_results().iter().all(|node| !node.ran()));
    }

    #[tokio::test]
    async fn test_run_before_build_is_rejected() {
        let raw = entry("raw", vec![1]);
        let out = MemoryEntry::<u32>::new("out");

        let pipeline = PipelineBuilder::named("unbuilt")
            .add_node("double", Double, NodeInput::dataset(raw), NodeOutput::dataset(out))
            .finish()
            .unwrap();

        let result = pipeline.run(&CancellationToken::new()).await;
        assert!(!result.success());
        assert!(matches!(result.error(), Some(PipelineError::NotBuilt(_))));
    }

    #[tokio::test]
    async fn test_dry_run_invokes_no_transform() {
        TRANSFORM_CALLS.store(0, Ordering::SeqCst);
        let raw = entry("raw", vec![1]);
        let out = MemoryEntry::<u32>::new("out");

        let mut pipeline = PipelineBuilder::named("dry")
            .add_node("count", Counting, NodeInput::dataset(raw), NodeOutput::dataset(out))
            .finish()
            .unwrap();
        pipeline.build().unwrap();
        let validation = pipeline.validate_external_inputs().await.unwrap();
        assert!(validation.is_valid());

        let result = PipelineResult::dry_run_success(DryRunSummary {
            node_count: pipeline.nodes().len(),
            layer_count: pipeline.layers().map_or(0, |layers| layers.len()),
            validated_input_count: pipeline.validated_input_count(),
        });
        assert!(result.success());
        assert_eq!(TRANSFORM_CALLS.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_merge_runs_both_pipelines_nodes() {
        let raw_one = entry("raw_one", vec![1]);
        let out_one = MemoryEntry::<u32>::new("out_one");
        let raw_two = entry("raw_two", vec![2]);
        let out_two = MemoryEntry::<u32>::new("out_two");

        let first = PipelineBuilder::named("first")
            .add_node("double_one", Double, NodeInput::dataset(raw_one), NodeOutput::dataset(Arc::clone(&out_one)))
            .finish()
            .unwrap();
        let second = PipelineBuilder::named("second")
            .add_node("double_two", Double, NodeInput::dataset(raw_two), NodeOutput::dataset(Arc::clone(&out_two)))
            .finish()
            .unwrap();

        let merged = Pipeline::merge(vec![("first".to_string(), first), ("second".to_string(), second)]).unwrap();
        assert!(merged.is_built());
        assert_eq!(merged.nodes().len(), 2);

        let result = merged.run(&CancellationToken::new()).await;
        assert!(result.success());
        assert_eq!(out_one.load().await.unwrap(), vec![2]);
        assert_eq!(out_two.load().await.unwrap(), vec![4]);
    }

    #[test]
    fn test_merge_rejects_duplicate_node_names_across_pipelines() {
        let raw_one = entry("raw_one", vec![1]);
        let out_one = MemoryEntry::<u32>::new("out_one");
        let raw_two = entry("raw_two", vec![2]);
        let out_two = MemoryEntry::<u32>::new("out_two");

        let first = PipelineBuilder::named("first")
            .add_node("double", Double, NodeInput::dataset(raw_one), NodeOutput::dataset(out_one))
            .finish()
            .unwrap();
        let second = PipelineBuilder::named("second")
            .add_node("double", Double, NodeInput::dataset(raw_two), NodeOutput::dataset(out_two))
            .finish()
            .unwrap();

        let err = Pipeline::merge(vec![("first".to_string(), first), ("second".to_string(), second)]).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateNode(_)));
        assert!(err.to_string().contains("double"));
    }

    #[test]
    fn test_merge_detects_cross_pipeline_single_writer_collision() {
        let raw_one = entry("raw_one", vec![1]);
        let raw_two = entry("raw_two", vec![2]);
        let shared = MemoryEntry::<u32>::new("shared");

        let first = PipelineBuilder::named("first")
            .add_node("writer_one", Double, NodeInput::dataset(raw_one), NodeOutput::dataset(Arc::clone(&shared)))
            .finish()
            .unwrap();
        let second = PipelineBuilder::named("second")
            .add_node("writer_two", Double, NodeInput::dataset(raw_two), NodeOutput::dataset(shared))
            .finish()
            .unwrap();

        let err = Pipeline::merge(vec![("first".to_string(), first), ("second".to_string(), second)]).unwrap_err();
        assert!(matches!(err, PipelineError::SingleWriterViolation(_)));
        assert!(err.to_string().contains("shared"));
    }

    #[tokio::test]
    async fn test_external_inputs_exclude_intermediates() {
        let raw = entry("raw", vec![1]);
        let mid = MemoryEntry::<u32>::new("mid");
        let out = MemoryEntry::<u32>::new("out");

        let mut pipeline = PipelineBuilder::named("chain")
            .add_node("first", Double, NodeInput::dataset(Arc::clone(&raw)), NodeOutput::dataset(Arc::clone(&mid)))
            .add_node("second", Double, NodeInput::dataset(mid), NodeOutput::dataset(out))
            .finish()
            .unwrap();
        pipeline.build().unwrap();

        let externals = pipeline.external_inputs();
        assert_eq!(externals.len(), 1);
        assert_eq!(externals[0].key(), "raw");
    }
}
