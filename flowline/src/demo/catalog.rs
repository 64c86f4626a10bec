// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Demo Catalog
//!
//! The company-reviews catalog the shipped pipelines are wired through.
//! Raw inputs live under `raw/`, intermediates under `intermediate/`,
//! joined outputs under `primary/`, split outputs under `model/` — the
//! conventional engineering layering, chosen here by the catalog alone.

use crate::demo::records::{Company, EnrichedCompany, ParsedRating, RawRating, Review, Row};
use crate::infrastructure::datasets::{CsvEntry, JsonEntry};
use flowline_domain::catalog::{Catalog, EntryCell};
use flowline_domain::entry::{Entry, InspectionLevel};
use std::path::PathBuf;
use std::sync::Arc;

/// Catalog of the demo data: identity-stable handles over one data
/// directory.
pub struct ReviewsCatalog {
    data_dir: PathBuf,
    raw_ratings: EntryCell<CsvEntry<RawRating>>,
    parsed_ratings: EntryCell<CsvEntry<ParsedRating>>,
    companies: EntryCell<CsvEntry<Company>>,
    reviews: EntryCell<CsvEntry<Review>>,
    enriched: EntryCell<JsonEntry<EnrichedCompany>>,
    rows: EntryCell<CsvEntry<Row>>,
    train_rows: EntryCell<CsvEntry<Row>>,
    test_rows: EntryCell<CsvEntry<Row>>,
}

impl ReviewsCatalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            raw_ratings: EntryCell::new(),
            parsed_ratings: EntryCell::new(),
            companies: EntryCell::new(),
            reviews: EntryCell::new(),
            enriched: EntryCell::new(),
            rows: EntryCell::new(),
            train_rows: EntryCell::new(),
            test_rows: EntryCell::new(),
        }
    }

    pub fn raw_ratings(&self) -> Arc<CsvEntry<RawRating>> {
        self.raw_ratings.get_or_init(|| {
            CsvEntry::new("raw_ratings", self.data_dir.join("raw/ratings.csv"))
                .with_required_columns(&["id", "rating_pct"])
        })
    }

    pub fn parsed_ratings(&self) -> Arc<CsvEntry<ParsedRating>> {
        self.parsed_ratings
            .get_or_init(|| CsvEntry::new("parsed_ratings", self.data_dir.join("intermediate/parsed_ratings.csv")))
    }

    pub fn companies(&self) -> Arc<CsvEntry<Company>> {
        self.companies.get_or_init(|| {
            CsvEntry::new("companies", self.data_dir.join("raw/companies.csv")).with_required_columns(&["id", "name"])
        })
    }

    // Review scores feed the join directly; ask for a full read up front.
    pub fn reviews(&self) -> Arc<CsvEntry<Review>> {
        self.reviews.get_or_init(|| {
            CsvEntry::new("reviews", self.data_dir.join("raw/reviews.csv"))
                .with_required_columns(&["id", "score"])
                .with_preferred_inspection(InspectionLevel::Deep)
        })
    }

    pub fn enriched(&self) -> Arc<JsonEntry<EnrichedCompany>> {
        self.enriched
            .get_or_init(|| JsonEntry::new("enriched", self.data_dir.join("primary/enriched.json")))
    }

    pub fn rows(&self) -> Arc<CsvEntry<Row>> {
        self.rows
            .get_or_init(|| CsvEntry::new("rows", self.data_dir.join("raw/rows.csv")).with_required_columns(&["id"]))
    }

    pub fn train_rows(&self) -> Arc<CsvEntry<Row>> {
        self.train_rows
            .get_or_init(|| CsvEntry::new("train_rows", self.data_dir.join("model/train.csv")))
    }

    pub fn test_rows(&self) -> Arc<CsvEntry<Row>> {
        self.test_rows
            .get_or_init(|| CsvEntry::new("test_rows", self.data_dir.join("model/test.csv")))
    }
}

impl Catalog for ReviewsCatalog {
    fn entries(&self) -> Vec<Arc<dyn Entry>> {
        vec![
            self.raw_ratings(),
            self.parsed_ratings(),
            self.companies(),
            self.reviews(),
            self.enriched(),
            self.rows(),
            self.train_rows(),
            self.test_rows(),
        ]
    }
}
