// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Demo Pipeline Factories
//!
//! The three shipped pipelines over the reviews catalog:
//!
//! - `parse_ratings` — percent strings to fractions, CSV to CSV.
//! - `enrich` — companies joined with reviews through a multi-input
//!   schema map, written as JSON.
//! - `split` — seeded train/test split with a mapped two-dataset output.

use crate::application::registry::PipelineRegistry;
use crate::demo::catalog::ReviewsCatalog;
use crate::demo::nodes::{JoinCompanies, JoinInputs, ParseRating, SplitOutput, SplitParams, SplitRows};
use crate::infrastructure::config::AppSettings;
use crate::infrastructure::logging::tracing_logger;
use flowline_domain::field_ref;
use flowline_domain::mapping::CatalogMap;
use flowline_domain::pipeline::{NodeInput, NodeOutput, PipelineBuilder};
use flowline_domain::{Pipeline, PipelineError};
use std::sync::Arc;

/// Percent-string parsing: `raw_ratings` → `parsed_ratings`.
pub fn parse_ratings_pipeline(catalog: &ReviewsCatalog) -> Result<Pipeline, PipelineError> {
    let mut node = ParseRating::default();
    node.logger = Some(tracing_logger());

    PipelineBuilder::named("parse_ratings")
        .with_logger(tracing_logger())
        .add_node(
            "parse_rating",
            node,
            NodeInput::dataset(catalog.raw_ratings()),
            NodeOutput::dataset(catalog.parsed_ratings()),
        )
        .finish()
}

/// Id-join of companies and reviews: `{companies, reviews}` → `enriched`.
pub fn enrich_pipeline(catalog: &ReviewsCatalog) -> Result<Pipeline, PipelineError> {
    let mut node = JoinCompanies::default();
    node.logger = Some(tracing_logger());

    let inputs = CatalogMap::<JoinInputs>::new()
        .map(field_ref!(JoinInputs, companies), catalog.companies())
        .map(field_ref!(JoinInputs, reviews), catalog.reviews());

    PipelineBuilder::named("enrich")
        .with_logger(tracing_logger())
        .add_node("join_companies", node, inputs, NodeOutput::dataset(catalog.enriched()))
        .finish()
}

/// Seeded train/test split: `rows` → `{train_rows, test_rows}`.
pub fn split_pipeline(catalog: &ReviewsCatalog, params: SplitParams) -> Result<Pipeline, PipelineError> {
    let mut node = SplitRows::default();
    node.params = params;
    node.logger = Some(tracing_logger());

    let outputs = CatalogMap::<SplitOutput>::new()
        .map(field_ref!(SplitOutput, train), catalog.train_rows())
        .map(field_ref!(SplitOutput, test), catalog.test_rows());

    PipelineBuilder::named("split")
        .with_logger(tracing_logger())
        .add_node("split_rows", node, NodeInput::dataset(catalog.rows()), outputs)
        .finish()
}

/// Registers the demo pipelines, reading the split parameters from the
/// `pipelines.split.parameters` configuration section when present.
pub fn register_demo_pipelines(
    registry: &mut PipelineRegistry,
    catalog: Arc<ReviewsCatalog>,
    settings: &AppSettings,
) -> Result<(), PipelineError> {
    let split_params = settings
        .pipeline("split")
        .map(|section| section.parameters_as::<SplitParams>())
        .transpose()?
        .flatten()
        .unwrap_or_default();

    {
        let catalog = Arc::clone(&catalog);
        registry.register("parse_ratings", "parse percent ratings into fractions", move || {
            parse_ratings_pipeline(&catalog)
        })?;
    }
    {
        let catalog = Arc::clone(&catalog);
        registry.register("enrich", "join companies with their review scores", move || {
            enrich_pipeline(&catalog)
        })?;
    }
    {
        let catalog = Arc::clone(&catalog);
        registry.register("split", "seeded train/test split of the row set", move || {
            split_pipeline(&catalog, split_params.clone())
        })?;
    }
    Ok(())
}
