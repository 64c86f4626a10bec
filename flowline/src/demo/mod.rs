// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Demo Pipelines
//!
//! The driver program's content: a company-reviews catalog and three
//! registered pipelines (`parse_ratings`, `enrich`, `split`). They are
//! both a working example of the wiring API and the dataset the shipped
//! binary operates on.

pub mod catalog;
pub mod nodes;
pub mod pipelines;
pub mod records;

pub use catalog::ReviewsCatalog;
pub use pipelines::register_demo_pipelines;
