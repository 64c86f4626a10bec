// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flowline
//!
//! Declarative, typed data-pipeline orchestration: declare a catalog of
//! named, typed entries, wire pure transform nodes through them, and run
//! the result as a validated, layered DAG.
//!
//! This crate is the infrastructure and application layer over
//! [`flowline_domain`]: file-backed entry adapters (CSV, JSON), layered
//! TOML configuration, tracing wiring, DAG metadata providers (JSON,
//! Mermaid), the pipeline registry, the command shell, and the demo
//! pipelines the shipped binary registers.
//!
//! ## Quick Tour
//!
//! ```no_run
//! use flowline::application::PipelineRegistry;
//! use flowline::demo::{register_demo_pipelines, ReviewsCatalog};
//! use flowline::infrastructure::config::AppSettings;
//! use flowline_domain::CancellationToken;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), flowline_domain::PipelineError> {
//! let settings = AppSettings::default();
//! let catalog = Arc::new(ReviewsCatalog::new(settings.catalog.data_dir.clone()));
//!
//! let mut registry = PipelineRegistry::new();
//! register_demo_pipelines(&mut registry, Arc::clone(&catalog), &settings)?;
//!
//! let mut pipeline = registry.build("parse_ratings")?;
//! pipeline.build()?;
//! let validation = pipeline.validate_external_inputs().await?;
//! if validation.is_valid() {
//!     let result = pipeline.run(&CancellationToken::new()).await;
//!     println!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod demo;
pub mod infrastructure;
