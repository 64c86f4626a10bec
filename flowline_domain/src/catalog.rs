// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Catalog
//!
//! A catalog is a user-derived object that owns a set of entries and exposes
//! them as named, identity-stable handles. Identity stability is the load
//! bearing property: the DAG deduplicates entries and resolves producers by
//! `Arc` pointer identity, so a handle accessed twice must return the same
//! allocation.
//!
//! The canonical shape is a struct with one [`EntryCell`] per handle and one
//! accessor per cell:
//!
//! ```
//! use flowline_domain::catalog::{Catalog, EntryCell};
//! use flowline_domain::entry::{Entry, MemoryEntry};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct ReviewCatalog {
//!     scores: EntryCell<MemoryEntry<f64>>,
//! }
//!
//! impl ReviewCatalog {
//!     fn scores(&self) -> Arc<MemoryEntry<f64>> {
//!         self.scores.get_or_init(|| MemoryEntry::with_items("scores", vec![4.2]))
//!     }
//! }
//!
//! impl Catalog for ReviewCatalog {
//!     fn entries(&self) -> Vec<Arc<dyn Entry>> {
//!         vec![self.scores()]
//!     }
//! }
//!
//! let catalog = ReviewCatalog::default();
//! assert!(Arc::ptr_eq(&catalog.scores(), &catalog.scores()));
//! ```
//!
//! Cells initialize lazily and thread-safely; [`Catalog::init_eager`]
//! enumerates every handle once after configuration to avoid lazy-init
//! surprises in concurrent code. Clearing or replacing a cell after a
//! pipeline has been built over it is undefined behavior — the pipeline
//! holds the old allocation.

use crate::entry::{entry_identity, Entry};
use crate::PipelineError;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Identity-stable lazy cell backing one catalog handle.
///
/// The first accessor call runs `init` and caches the resulting `Arc`;
/// every later call returns a clone of the same `Arc`. Initialization is
/// thread-safe: concurrent first accesses race on `init` but exactly one
/// result is kept.
pub struct EntryCell<E> {
    cell: OnceCell<Arc<E>>,
}

impl<E> EntryCell<E> {
    pub const fn new() -> Self {
        Self { cell: OnceCell::new() }
    }

    /// Returns the cached handle, constructing it on first access.
    pub fn get_or_init(&self, init: impl FnOnce() -> Arc<E>) -> Arc<E> {
        Arc::clone(self.cell.get_or_init(init))
    }
}

impl<E> Default for EntryCell<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// User-owned registry of entries, exposed as stable named handles.
pub trait Catalog: Send + Sync {
    /// Every handle this catalog owns, in declaration order. Calling this
    /// forces initialization of each lazy cell.
    fn entries(&self) -> Vec<Arc<dyn Entry>>;

    /// Looks an entry up by key.
    fn entry(&self, key: &str) -> Option<Arc<dyn Entry>> {
        self.entries().into_iter().find(|entry| entry.key() == key)
    }

    /// Eagerly initializes every handle. Call once after configuration so
    /// no pipeline construction triggers first-touch initialization.
    fn init_eager(&self) {
        let _ = self.entries();
    }
}

/// Verifies that no two handles of a catalog share a key and that no
/// single allocation is registered under two keys.
pub fn verify_unique_keys(catalog: &dyn Catalog) -> Result<(), PipelineError> {
    let mut seen_keys: HashMap<String, usize> = HashMap::new();
    for entry in catalog.entries() {
        let identity = entry_identity(&entry);
        if let Some(previous) = seen_keys.insert(entry.key().to_string(), identity) {
            if previous != identity {
                return Err(PipelineError::invalid_config(format!(
                    "catalog declares two different entries under the key '{}'",
                    entry.key()
                )));
            }
        }
    }
    Ok(())
}
