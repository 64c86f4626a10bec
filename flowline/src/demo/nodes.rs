// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Demo Nodes
//!
//! The transforms behind the shipped demo pipelines: percent-string
//! parsing, an id-join through a multi-input schema object, and a seeded
//! train/test split with a mapped output.

use crate::demo::records::{Company, EnrichedCompany, ParsedRating, RawRating, Review, Row};
use flowline_domain::logging::PipelineLogger;
use flowline_domain::mapping::{FieldSpec, SchemaObject};
use flowline_domain::{Node, PipelineError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

/// Parses percent-string ratings ("85%") into fractions (0.85).
#[derive(Default)]
pub struct ParseRating {
    pub logger: Option<Arc<dyn PipelineLogger>>,
}

impl Node for ParseRating {
    type Input = RawRating;
    type Output = ParsedRating;

    fn transform(&self, items: Vec<RawRating>) -> Result<Vec<ParsedRating>, PipelineError> {
        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            let trimmed = item.rating_pct.trim().trim_end_matches('%');
            let percent: f64 = trimmed.parse().map_err(|_| {
                PipelineError::serialization_error(format!(
                    "rating '{}' for id '{}' is not a percentage",
                    item.rating_pct, item.id
                ))
            })?;
            parsed.push(ParsedRating {
                id: item.id,
                rating: percent / 100.0,
            });
        }
        if let Some(logger) = &self.logger {
            logger.debug(&format!("parsed {} rating(s)", parsed.len()));
        }
        Ok(parsed)
    }
}

/// Multi-input schema object for the join: companies and reviews arrive
/// from two separate entries.
#[derive(Default)]
pub struct JoinInputs {
    pub companies: Vec<Company>,
    pub reviews: Vec<Review>,
}

impl SchemaObject for JoinInputs {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::required("companies"), FieldSpec::required("reviews")];
        FIELDS
    }
}

/// Inner-joins companies with reviews by id.
#[derive(Default)]
pub struct JoinCompanies {
    pub logger: Option<Arc<dyn PipelineLogger>>,
}

impl Node for JoinCompanies {
    type Input = JoinInputs;
    type Output = EnrichedCompany;

    fn transform(&self, items: Vec<JoinInputs>) -> Result<Vec<EnrichedCompany>, PipelineError> {
        let mut enriched = Vec::new();
        for input in items {
            let names: HashMap<String, String> = input
                .companies
                .into_iter()
                .map(|company| (company.id, company.name))
                .collect();
            for review in input.reviews {
                if let Some(name) = names.get(&review.id) {
                    enriched.push(EnrichedCompany {
                        id: review.id,
                        name: name.clone(),
                        score: review.score,
                    });
                }
            }
        }
        if let Some(logger) = &self.logger {
            logger.debug(&format!("joined {} company/review pair(s)", enriched.len()));
        }
        Ok(enriched)
    }
}

/// Parameters of the train/test split, validated declaratively.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct SplitParams {
    /// Fraction of rows assigned to the test set.
    #[validate(range(min = 0.01, max = 0.99))]
    pub test_size: f64,
    pub seed: u64,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Mapped output of the split: two datasets from one node.
#[derive(Default)]
pub struct SplitOutput {
    pub train: Vec<Row>,
    pub test: Vec<Row>,
}

impl SchemaObject for SplitOutput {
    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::required("train"), FieldSpec::required("test")];
        FIELDS
    }
}

/// Deterministic seeded train/test split.
#[derive(Default)]
pub struct SplitRows {
    pub params: SplitParams,
    pub logger: Option<Arc<dyn PipelineLogger>>,
}

impl Node for SplitRows {
    type Input = Row;
    type Output = SplitOutput;

    fn transform(&self, items: Vec<Row>) -> Result<Vec<SplitOutput>, PipelineError> {
        let mut shuffled = items;
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        shuffled.shuffle(&mut rng);

        let test_count = ((shuffled.len() as f64) * self.params.test_size).round() as usize;
        let test_count = test_count.min(shuffled.len());
        let test = shuffled.split_off(shuffled.len() - test_count);

        if let Some(logger) = &self.logger {
            logger.debug(&format!("split {} train / {} test", shuffled.len(), test.len()));
        }
        Ok(vec![SplitOutput {
            train: shuffled,
            test,
        }])
    }
}
