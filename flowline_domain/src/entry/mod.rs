// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Catalog Entries
//!
//! An *entry* is a named, typed handle to a storage location: the unit the
//! catalog hands out and the unit pipelines are wired through. Entries vary
//! along three orthogonal axes — readable/writable, dataset/singleton, and
//! shallow/deep-inspectable — expressed here as capability tags plus a small
//! set of composable traits rather than an inheritance hierarchy.
//!
//! ## Trait Layers
//!
//! - [`Entry`] is the erased, object-safe surface the orchestrator works
//!   with: key, declared data type, capability tags, existence/count probes,
//!   type-erased load/save, and inspection. The DAG container holds
//!   `Arc<dyn Entry>` so pipelines stay heterogeneous.
//! - [`DatasetEntry<T>`] and [`ValueEntry<T>`] are the typed surfaces wire
//!   sites use. A dataset entry's logical value is `Vec<T>`; a singleton
//!   entry's logical value is a single `T`.
//!
//! ## Contract
//!
//! - `load` is idempotent with respect to successive equal calls on the same
//!   underlying storage and is permitted to re-read.
//! - `save` is a total overwrite. Backends that append must document it.
//! - `exists` is a cheap probe and must not require a full read.
//! - `count` returns the item count for datasets and `{0, 1}` for
//!   singletons; `count() == 1` iff `exists()` for singletons.
//! - Inspection never mutates state and reports data problems as
//!   [`ValidationError`]s, reserving the error channel for unexpected
//!   backend failures.
//! - A read-only entry rejects erased saves with an unsupported-operation
//!   error; this is non-recoverable.
//!
//! ## External Backends
//!
//! File-format adapters (CSV, JSON) live in the infrastructure layer. Two
//! further formats are specified by contract only and intentionally have no
//! adapter here:
//!
//! - *Parquet*: shallow inspection must pre-check the "PAR1" magic bytes
//!   before handing the file to a reader; schema mismatches surface as
//!   [`ValidationErrorKind::TypeMismatch`].
//! - *Excel*: read-only; worksheet selectable (first by default);
//!   snake_case column names map onto the declared record fields.

mod inspection;
mod memory;
mod null;

pub use inspection::{InspectionLevel, ValidationError, ValidationErrorKind, ValidationResult};
pub use memory::{MemoryEntry, MemoryValueEntry};
pub use null::NullEntry;

use crate::PipelineError;
use async_trait::async_trait;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Number of items a shallow inspection samples by default.
pub const DEFAULT_INSPECTION_SAMPLE: usize = 100;

/// A type-erased value moving through an erased load or save call.
///
/// Concrete entries box their logical value (`Vec<T>` for datasets, `T` for
/// singletons) and downcast on the way back in; a failed downcast is a
/// usage error, not a data error.
pub type ErasedValue = Box<dyn Any + Send>;

/// Statically declared capability tags of an entry implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryCapability {
    Readable,
    Writable,
    ShallowInspectable,
    DeepInspectable,
    /// The declared type parameter denotes a collection item type.
    Dataset,
    /// The declared type parameter is the whole value.
    Singleton,
}

impl fmt::Display for EntryCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            EntryCapability::Readable => "readable",
            EntryCapability::Writable => "writable",
            EntryCapability::ShallowInspectable => "shallow-inspectable",
            EntryCapability::DeepInspectable => "deep-inspectable",
            EntryCapability::Dataset => "dataset",
            EntryCapability::Singleton => "singleton",
        };
        write!(f, "{}", tag)
    }
}

/// Erased, object-safe handle to a named storage location.
///
/// The orchestrator's containers — pipeline node records, producer indexes,
/// validation target lists — all hold `Arc<dyn Entry>`. Identity matters:
/// the catalog guarantees that the same handle accessed twice is the same
/// `Arc`, so pointer identity is used to deduplicate entries and to detect
/// producers.
#[async_trait]
pub trait Entry: Send + Sync {
    /// Unique key of this entry within its catalog.
    fn key(&self) -> &str;

    /// Name of the declared Rust data type behind this entry.
    fn data_type_name(&self) -> &'static str;

    /// Statically declared capability tags.
    fn capabilities(&self) -> &'static [EntryCapability];

    /// Inspection level this entry asks for when the pipeline does not
    /// override it. `None` here means "no preference", not "skip".
    fn preferred_inspection_level(&self) -> Option<InspectionLevel> {
        None
    }

    /// Cheap existence probe. Must not require a full read.
    async fn exists(&self) -> Result<bool, PipelineError>;

    /// Item count for datasets; `{0, 1}` for singletons. May read metadata.
    async fn count(&self) -> Result<u64, PipelineError>;

    /// Loads the logical value behind an erased handle.
    async fn load_erased(&self) -> Result<ErasedValue, PipelineError>;

    /// Saves the logical value behind an erased handle.
    ///
    /// Read-only entries fail with [`PipelineError::UnsupportedOperation`];
    /// a wrongly-typed value fails with [`PipelineError::TypeMismatch`].
    async fn save_erased(&self, value: ErasedValue) -> Result<(), PipelineError>;

    /// Verifies existence, format, schema, and deserialization of the first
    /// `sample_n` items. An empty dataset where items were expected is an
    /// error. Must not mutate state.
    async fn inspect_shallow(&self, sample_n: usize) -> Result<Vec<ValidationError>, PipelineError> {
        let _ = sample_n;
        Ok(Vec::new())
    }

    /// Runs the shallow checks and, when they pass, deserializes every
    /// item. Must not mutate state.
    async fn inspect_deep(&self) -> Result<Vec<ValidationError>, PipelineError> {
        Ok(Vec::new())
    }
}

impl dyn Entry {
    /// Checks a capability tag.
    pub fn has_capability(&self, capability: EntryCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn is_writable(&self) -> bool {
        self.has_capability(EntryCapability::Writable)
    }

    pub fn is_dataset(&self) -> bool {
        self.has_capability(EntryCapability::Dataset)
    }
}

/// Stable identity of an entry handle, derived from its `Arc` pointer.
///
/// Valid because catalog handles are identity-stable for the catalog's
/// lifetime; two loads of the same handle observe the same allocation.
pub fn entry_identity(entry: &Arc<dyn Entry>) -> usize {
    Arc::as_ptr(entry) as *const () as usize
}

/// Typed surface of an entry whose logical value is a sequence of `T`.
#[async_trait]
pub trait DatasetEntry<T: Send + 'static>: Entry {
    /// Reads the full dataset.
    async fn load(&self) -> Result<Vec<T>, PipelineError>;

    /// Overwrites the dataset with `items`.
    async fn save(&self, items: Vec<T>) -> Result<(), PipelineError>;
}

/// Typed surface of an entry whose logical value is a single `T`.
#[async_trait]
pub trait ValueEntry<T: Send + 'static>: Entry {
    /// Reads the singleton value.
    async fn load_value(&self) -> Result<T, PipelineError>;

    /// Overwrites the singleton value.
    async fn save_value(&self, value: T) -> Result<(), PipelineError>;
}

/// Shortens a fully qualified type name to its final path segment, keeping
/// generic arguments readable. Used by reporting surfaces; the raw
/// [`Entry::data_type_name`] keeps the full path.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        match ch {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' => {
                out.push_str(&segment);
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(&segment);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name_strips_paths() {
        assert_eq!(short_type_name("alloc::vec::Vec<demo::Company>"), "Vec<Company>");
        assert_eq!(short_type_name("f64"), "f64");
    }

    #[tokio::test]
    async fn test_entry_identity_is_pointer_identity() {
        let a = MemoryEntry::<u32>::new("a");
        let erased_one: Arc<dyn Entry> = a.clone();
        let erased_two: Arc<dyn Entry> = a.clone();
        let b: Arc<dyn Entry> = MemoryEntry::<u32>::new("a");

        assert_eq!(entry_identity(&erased_one), entry_identity(&erased_two));
        assert_ne!(entry_identity(&erased_one), entry_identity(&b));
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(EntryCapability::ShallowInspectable.to_string(), "shallow-inspectable");
        assert_eq!(EntryCapability::Dataset.to_string(), "dataset");
    }
}
