// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flowline Domain
//!
//! Core model of the flowline data-pipeline orchestrator: a developer
//! declares a *catalog* of named, typed storage entries and wires *nodes*
//! (pure transforms) through those entries into *pipelines*, which are
//! analyzed into DAG layers, pre-flight validated, and executed with
//! structured reporting. This crate is pure orchestration logic — no
//! runtime, no file formats, no logging backend; those live in the
//! infrastructure layer and plug in through the ports defined here.
//!
//! ## Module Structure
//!
//! - [`entry`] — typed storage handles: capabilities, inspection model,
//!   in-memory and null backends.
//! - [`catalog`] — identity-stable, name-addressed handle registry owned
//!   by a user-defined catalog object.
//! - [`mapping`] — schema objects and catalog maps: the binding layer
//!   that absorbs multi-input/multi-output wiring into single-input/
//!   single-output nodes.
//! - [`node`] — the transform abstraction.
//! - [`pipeline`] — builder, dependency analyzer, layered executor,
//!   pre-flight validation, DAG export, result model, merging.
//! - [`logging`] — the logger injection port.
//! - [`cancellation`] — cooperative run cancellation.
//! - [`error`] — the shared [`PipelineError`] taxonomy.
//!
//! ## Lifecycle
//!
//! ```text
//! catalog handles ──▶ PipelineBuilder ──▶ Pipeline (unbuilt)
//!                                            │ build()
//!                                            ▼
//!                        layers ◀── DependencyAnalyzer
//!                                            │ validate_external_inputs()
//!                                            ▼
//!                                     ValidationResult
//!                                            │ run()
//!                                            ▼
//!                                     PipelineResult
//! ```
//!
//! Entries live as long as their catalog; pipeline nodes live with their
//! pipeline; layer assignments are set by `build()`; results are created
//! per run.

pub mod cancellation;
pub mod catalog;
pub mod entry;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod node;
pub mod pipeline;

// Re-export commonly used types for convenient access
pub use cancellation::CancellationToken;
pub use catalog::{Catalog, EntryCell};
pub use entry::{
    DatasetEntry, Entry, EntryCapability, InspectionLevel, MemoryEntry, MemoryValueEntry, NullEntry,
    ValidationError, ValidationErrorKind, ValidationResult, ValueEntry,
};
pub use error::PipelineError;
pub use mapping::{CatalogMap, FieldRef, FieldSpec, SchemaObject};
pub use node::Node;
pub use pipeline::{
    DagExport, DryRunSummary, NodeInput, NodeOutput, NodeResult, Pipeline, PipelineBuilder, PipelineResult,
};
