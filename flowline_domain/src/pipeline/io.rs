// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Node I/O Plans
//!
//! The builder accepts, for each side of a node, either a single typed
//! entry or a [`CatalogMap`]. Both are normalized here into an I/O *plan*:
//! the erased entry list the DAG analyzer needs, the mapping metadata the
//! DAG export needs, and a closure — closed over the concrete item types
//! at the wire site — that the executor drives. This is what keeps the
//! pipeline container heterogeneous while every wire site stays fully
//! type-checked.
//!
//! The pass-through wiring of a single entry is [`NodeInput::dataset`] /
//! [`NodeOutput::dataset`] (the sequence flows directly, no synthesis);
//! [`NodeInput::value`] / [`NodeOutput::value`] wire singleton entries as
//! one-element sequences; [`NodeInput::mapped`] / [`NodeOutput::mapped`]
//! wire schema objects.

use crate::entry::{DatasetEntry, Entry, ValueEntry};
use crate::mapping::{CatalogMap, Mapping, SchemaObject};
use crate::PipelineError;
use futures::future::BoxFuture;
use std::sync::Arc;

pub(crate) type MaterializeFn<T> =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Vec<T>, PipelineError>> + Send + Sync>;
pub(crate) type WriteFn<T> =
    Arc<dyn Fn(Vec<T>) -> BoxFuture<'static, Result<(), PipelineError>> + Send + Sync>;

/// Input plan of one node: where the input sequence of item type `T`
/// comes from.
pub struct NodeInput<T: Send + 'static> {
    pub(crate) entries: Vec<Arc<dyn Entry>>,
    pub(crate) mappings: Option<Vec<Mapping>>,
    pub(crate) materialize: MaterializeFn<T>,
    pub(crate) error: Option<PipelineError>,
}

impl<T: Send + 'static> NodeInput<T> {
    /// Pass-through wiring of a dataset entry: the loaded sequence flows
    /// directly into the node.
    pub fn dataset<E>(entry: Arc<E>) -> Self
    where
        E: DatasetEntry<T> + 'static,
    {
        let erased: Arc<dyn Entry> = entry.clone();
        let materialize: MaterializeFn<T> = Arc::new(move || {
            let entry = Arc::clone(&entry);
            Box::pin(async move { entry.load().await })
        });
        Self {
            entries: vec![erased],
            mappings: None,
            materialize,
            error: None,
        }
    }

    /// Wires a singleton entry: the node receives a one-element sequence.
    pub fn value<E>(entry: Arc<E>) -> Self
    where
        E: ValueEntry<T> + 'static,
    {
        let erased: Arc<dyn Entry> = entry.clone();
        let materialize: MaterializeFn<T> = Arc::new(move || {
            let entry = Arc::clone(&entry);
            Box::pin(async move { Ok(vec![entry.load_value().await?]) })
        });
        Self {
            entries: vec![erased],
            mappings: None,
            materialize,
            error: None,
        }
    }

    /// Wires a schema object synthesized from a catalog map: the node
    /// receives the built object as a one-element sequence. Completeness
    /// of the map is checked here, at wire time.
    pub fn mapped(map: CatalogMap<T>) -> Self
    where
        T: SchemaObject,
    {
        let error = map.validate_complete().err();
        let entries = map.mapped_entries();
        let mappings = Some(map.mappings());
        let map = Arc::new(map);
        let materialize: MaterializeFn<T> = Arc::new(move || {
            let map = Arc::clone(&map);
            Box::pin(async move { Ok(vec![map.build_input().await?]) })
        });
        Self {
            entries,
            mappings,
            materialize,
            error,
        }
    }
}

impl<T: SchemaObject> From<CatalogMap<T>> for NodeInput<T> {
    fn from(map: CatalogMap<T>) -> Self {
        Self::mapped(map)
    }
}

/// Output plan of one node: where the output sequence of item type `T`
/// goes.
pub struct NodeOutput<T: Send + 'static> {
    pub(crate) entries: Vec<Arc<dyn Entry>>,
    pub(crate) mappings: Option<Vec<Mapping>>,
    pub(crate) write: WriteFn<T>,
    pub(crate) error: Option<PipelineError>,
}

impl<T: Send + 'static> NodeOutput<T> {
    /// Pass-through wiring of a dataset entry: the whole output sequence
    /// is saved as the dataset.
    pub fn dataset<E>(entry: Arc<E>) -> Self
    where
        E: DatasetEntry<T> + 'static,
    {
        let erased: Arc<dyn Entry> = entry.clone();
        let write: WriteFn<T> = Arc::new(move |items| {
            let entry = Arc::clone(&entry);
            Box::pin(async move { entry.save(items).await })
        });
        Self {
            entries: vec![erased],
            mappings: None,
            write,
            error: None,
        }
    }

    /// Wires a singleton entry: the node must emit exactly one item.
    pub fn value<E>(entry: Arc<E>) -> Self
    where
        E: ValueEntry<T> + 'static,
    {
        let erased: Arc<dyn Entry> = entry.clone();
        let key = erased.key().to_string();
        let write: WriteFn<T> = Arc::new(move |mut items| {
            let entry = Arc::clone(&entry);
            let key = key.clone();
            Box::pin(async move {
                if items.len() != 1 {
                    return Err(PipelineError::internal_error(format!(
                        "singleton output '{}' expected exactly one item, got {}",
                        key,
                        items.len()
                    )));
                }
                let value = items.remove(0);
                entry.save_value(value).await
            })
        });
        Self {
            entries: vec![erased],
            mappings: None,
            write,
            error: None,
        }
    }

    /// Wires a schema object unpacked through a catalog map: the node
    /// must emit exactly one schema object, whose bound fields are then
    /// saved to their entries.
    pub fn mapped(map: CatalogMap<T>) -> Self
    where
        T: SchemaObject + Sync,
    {
        let error = map.validate_for_output().err();
        let entries = map.mapped_entries();
        let mappings = Some(map.mappings());
        let map = Arc::new(map);
        let write: WriteFn<T> = Arc::new(move |mut items| {
            let map = Arc::clone(&map);
            Box::pin(async move {
                if items.len() != 1 {
                    return Err(PipelineError::internal_error(format!(
                        "mapped output of {} expected exactly one schema object, got {}",
                        std::any::type_name::<T>(),
                        items.len()
                    )));
                }
                let schema = items.remove(0);
                map.write_output(&schema).await
            })
        });
        Self {
            entries,
            mappings,
            write,
            error,
        }
    }
}

impl<T: SchemaObject + Sync> From<CatalogMap<T>> for NodeOutput<T> {
    fn from(map: CatalogMap<T>) -> Self {
        Self::mapped(map)
    }
}
