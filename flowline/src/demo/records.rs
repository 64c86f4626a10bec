// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Demo Record Types
//!
//! The company-reviews data model the shipped demo pipelines operate on.

use serde::{Deserialize, Serialize};

/// Raw rating row as scraped: the rating is a percent string ("85%").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRating {
    pub id: String,
    pub rating_pct: String,
}

/// Parsed rating row: the rating as a fraction in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRating {
    pub id: String,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub score: f64,
}

/// A company joined with its review score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCompany {
    pub id: String,
    pub name: String,
    pub score: f64,
}

/// Minimal row for the train/test split demo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row {
    pub id: u64,
}
