// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Builder
//!
//! Fluent construction of pipelines around one conceptual operation: *add
//! a node with an input and an output*, where each side is a single typed
//! entry or a catalog map. Entry item types are checked against the
//! node's declared types by the compiler at the wire site; mapped arity
//! is checked by the map's completeness validation the moment the plan is
//! created.
//!
//! Wire-time defects (incomplete map, duplicate node name) do not abort
//! the fluent chain; the first one is recorded and surfaces from
//! [`finish`](PipelineBuilder::finish), which is also where the node set
//! freezes into an unbuilt [`Pipeline`].

use super::io::{NodeInput, NodeOutput};
use super::node::{NodeRunner, PipelineNode};
use super::validation::ValidationOptions;
use super::Pipeline;
use crate::entry::InspectionLevel;
use crate::logging::{noop_logger, PipelineLogger};
use crate::node::Node;
use crate::PipelineError;
use std::sync::Arc;

/// Fluent, type-checked pipeline construction.
pub struct PipelineBuilder {
    name: Option<String>,
    nodes: Vec<PipelineNode>,
    logger: Arc<dyn PipelineLogger>,
    validation: ValidationOptions,
    error: Option<PipelineError>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            nodes: Vec::new(),
            logger: noop_logger(),
            validation: ValidationOptions::new(),
            error: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        let mut builder = Self::new();
        builder.name = Some(name.into());
        builder
    }

    /// Injects the logger the pipeline and its warnings report through.
    pub fn with_logger(mut self, logger: Arc<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Forces an inspection level for one external entry key.
    pub fn with_inspection_override(mut self, entry_key: impl Into<String>, level: InspectionLevel) -> Self {
        self.validation.set_override(entry_key, level);
        self
    }

    /// Overrides the shallow-inspection sample size.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.validation.set_sample_size(sample_size);
        self
    }

    /// Adds a node wired between an input and an output plan.
    ///
    /// The node instance arrives constructed (and property-injected); use
    /// [`add_default_node`](Self::add_default_node) when no injection is
    /// needed.
    pub fn add_node<N: Node>(
        mut self,
        name: impl Into<String>,
        node: N,
        input: impl Into<NodeInput<N::Input>>,
        output: impl Into<NodeOutput<N::Output>>,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }

        let name = name.into();
        if self.nodes.iter().any(|existing| existing.name() == name) {
            self.error = Some(PipelineError::DuplicateNode(format!(
                "a node named '{}' is already wired into this pipeline",
                name
            )));
            return self;
        }

        let input = input.into();
        let output = output.into();
        if let Some(error) = input.error.clone().or_else(|| output.error.clone()) {
            self.error = Some(error);
            return self;
        }

        let node = Arc::new(node);
        let materialize = input.materialize;
        let write = output.write;
        let runner: NodeRunner = Arc::new(move || {
            let node = Arc::clone(&node);
            let materialize = Arc::clone(&materialize);
            let write = Arc::clone(&write);
            Box::pin(async move {
                let items = materialize().await?;
                let input_count = items.len();
                let outputs = node.transform(items)?;
                let output_count = outputs.len();
                write(outputs).await?;
                Ok((input_count, output_count))
            })
        });

        self.nodes.push(PipelineNode::new(
            name,
            input.entries,
            output.entries,
            input.mappings,
            output.mappings,
            runner,
        ));
        self
    }

    /// Adds a default-constructed node. The generic factory for nodes
    /// that need no property injection.
    pub fn add_default_node<N: Node>(
        self,
        name: impl Into<String>,
        input: impl Into<NodeInput<N::Input>>,
        output: impl Into<NodeOutput<N::Output>>,
    ) -> Self {
        self.add_node(name, N::default(), input, output)
    }

    /// Freezes the node set into an unbuilt [`Pipeline`], surfacing the
    /// first wire-time defect if one was recorded.
    pub fn finish(self) -> Result<Pipeline, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Pipeline::new_unbuilt(self.name, self.nodes, self.logger, self.validation))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::MemoryEntry;
    use crate::field_ref;
    use crate::mapping::{CatalogMap, FieldSpec, SchemaObject};
    use std::sync::Arc;

    #[derive(Default)]
    struct Identity;

    impl Node for Identity {
        type Input = u32;
        type Output = u32;

        fn transform(&self, items: Vec<u32>) -> Result<Vec<u32>, PipelineError> {
            Ok(items)
        }
    }

    #[test]
    fn test_duplicate_node_name_is_a_wire_time_error() {
        let a = MemoryEntry::<u32>::new("a");
        let b = MemoryEntry::<u32>::new("b");
        let c = MemoryEntry::<u32>::new("c");

        let result = PipelineBuilder::named("dup")
            .add_node("same", Identity, NodeInput::dataset(Arc::clone(&a)), NodeOutput::dataset(b))
            .add_node("same", Identity, NodeInput::dataset(a), NodeOutput::dataset(c))
            .finish();

        assert!(matches!(result, Err(PipelineError::DuplicateNode(_))));
    }

    #[test]
    fn test_incomplete_map_surfaces_from_finish() {
        #[derive(Default)]
        struct TwoFields {
            first: Vec<u32>,
            second: Vec<u32>,
        }
        impl SchemaObject for TwoFields {
            fn fields() -> &'static [FieldSpec] {
                const FIELDS: &[FieldSpec] = &[FieldSpec::required("first"), FieldSpec::required("second")];
                FIELDS
            }
        }

        #[derive(Default)]
        struct Consume;
        impl Node for Consume {
            type Input = TwoFields;
            type Output = u32;
            fn transform(&self, _items: Vec<TwoFields>) -> Result<Vec<u32>, PipelineError> {
                Ok(Vec::new())
            }
        }

        let first = MemoryEntry::<u32>::new("first");
        let out = MemoryEntry::<u32>::new("out");
        let incomplete = CatalogMap::<TwoFields>::new().map(field_ref!(TwoFields, first), first);

        let result = PipelineBuilder::named("incomplete")
            .add_node("consume", Consume, incomplete, NodeOutput::dataset(out))
            .finish();

        assert!(matches!(result, Err(PipelineError::MissingMapping(_))));
    }

    #[test]
    fn test_first_error_wins_and_later_nodes_are_ignored() {
        let a = MemoryEntry::<u32>::new("a");
        let b = MemoryEntry::<u32>::new("b");
        let c = MemoryEntry::<u32>::new("c");
        let d = MemoryEntry::<u32>::new("d");

        let result = PipelineBuilder::named("dup")
            .add_node("same", Identity, NodeInput::dataset(Arc::clone(&a)), NodeOutput::dataset(b))
            .add_node("same", Identity, NodeInput::dataset(Arc::clone(&a)), NodeOutput::dataset(c))
            .add_node("other", Identity, NodeInput::dataset(a), NodeOutput::dataset(d))
            .finish();

        assert!(matches!(result, Err(PipelineError::DuplicateNode(_))));
    }

    #[test]
    fn test_add_default_node_constructs_generically() {
        let a = MemoryEntry::<u32>::new("a");
        let b = MemoryEntry::<u32>::new("b");

        let pipeline = PipelineBuilder::named("default")
            .add_default_node::<Identity>("identity", NodeInput::dataset(a), NodeOutput::dataset(b))
            .finish()
            .unwrap();
        assert_eq!(pipeline.nodes().len(), 1);
    }
}
