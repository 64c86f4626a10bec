// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Registry
//!
//! Name-to-factory registry the application shell selects pipelines from.
//! Registration happens in `main` — a small manual registry instead of
//! runtime reflection, preserving the "describe in config, select by
//! name" experience. Registration order is meaningful: it is the node
//! concatenation order of a merge-all run.

use flowline_domain::{Pipeline, PipelineError};

type PipelineFactory = Box<dyn Fn() -> Result<Pipeline, PipelineError> + Send + Sync>;

struct RegisteredPipeline {
    name: String,
    description: String,
    factory: PipelineFactory,
}

/// Ordered registry of pipeline factories.
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: Vec<RegisteredPipeline>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under a unique name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        factory: impl Fn() -> Result<Pipeline, PipelineError> + Send + Sync + 'static,
    ) -> Result<(), PipelineError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(PipelineError::invalid_config(format!(
                "a pipeline named '{}' is already registered",
                name
            )));
        }
        self.pipelines.push(RegisteredPipeline {
            name,
            description: description.into(),
            factory: Box::new(factory),
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pipelines.iter().any(|pipeline| pipeline.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Registered `(name, description)` pairs in registration order.
    pub fn names(&self) -> Vec<(&str, &str)> {
        self.pipelines
            .iter()
            .map(|pipeline| (pipeline.name.as_str(), pipeline.description.as_str()))
            .collect()
    }

    /// Builds one pipeline by name. Unknown names list the alternatives.
    pub fn build(&self, name: &str) -> Result<Pipeline, PipelineError> {
        let registered = self
            .pipelines
            .iter()
            .find(|pipeline| pipeline.name == name)
            .ok_or_else(|| {
                let known: Vec<&str> = self.pipelines.iter().map(|pipeline| pipeline.name.as_str()).collect();
                PipelineError::PipelineNotFound(format!(
                    "'{}' is not registered; known pipelines: [{}]",
                    name,
                    known.join(", ")
                ))
            })?;
        (registered.factory)()
    }

    /// Builds every registered pipeline, in registration order.
    pub fn build_all(&self) -> Result<Vec<(String, Pipeline)>, PipelineError> {
        self.pipelines
            .iter()
            .map(|registered| Ok((registered.name.clone(), (registered.factory)()?)))
            .collect()
    }
}
