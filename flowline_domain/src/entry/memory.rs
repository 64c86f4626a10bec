// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Entries
//!
//! Process-local entries for intermediate pipeline results and tests. State
//! starts empty; loading before anything was saved is a usage error, not an
//! empty result — an empty `Vec` would silently mask a mis-wired pipeline.
//! Memory entries carry no inspection capability.

use super::{DatasetEntry, Entry, EntryCapability, ErasedValue, ValueEntry};
use crate::PipelineError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

const DATASET_CAPABILITIES: &[EntryCapability] = &[
    EntryCapability::Readable,
    EntryCapability::Writable,
    EntryCapability::Dataset,
];

const SINGLETON_CAPABILITIES: &[EntryCapability] = &[
    EntryCapability::Readable,
    EntryCapability::Writable,
    EntryCapability::Singleton,
];

/// In-memory dataset entry. Logical value is `Vec<T>`.
pub struct MemoryEntry<T> {
    key: String,
    state: RwLock<Option<Vec<T>>>,
}

impl<T: Clone + Send + Sync + 'static> MemoryEntry<T> {
    pub fn new(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            state: RwLock::new(None),
        })
    }

    /// Creates the entry pre-populated with `items`, as an already-saved
    /// external input for tests and demos.
    pub fn with_items(key: impl Into<String>, items: Vec<T>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            state: RwLock::new(Some(items)),
        })
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Entry for MemoryEntry<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn data_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn capabilities(&self) -> &'static [EntryCapability] {
        DATASET_CAPABILITIES
    }

    async fn exists(&self) -> Result<bool, PipelineError> {
        Ok(self.state.read().is_some())
    }

    async fn count(&self) -> Result<u64, PipelineError> {
        Ok(self.state.read().as_ref().map_or(0, |items| items.len() as u64))
    }

    async fn load_erased(&self) -> Result<ErasedValue, PipelineError> {
        Ok(Box::new(self.load().await?))
    }

    async fn save_erased(&self, value: ErasedValue) -> Result<(), PipelineError> {
        let items = value.downcast::<Vec<T>>().map_err(|_| {
            PipelineError::type_mismatch(format!(
                "entry '{}' expects {}",
                self.key,
                std::any::type_name::<Vec<T>>()
            ))
        })?;
        self.save(*items).await
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> DatasetEntry<T> for MemoryEntry<T> {
    async fn load(&self) -> Result<Vec<T>, PipelineError> {
        self.state.read().clone().ok_or_else(|| {
            PipelineError::LoadBeforeSave(format!("memory entry '{}' was loaded before any save", self.key))
        })
    }

    async fn save(&self, items: Vec<T>) -> Result<(), PipelineError> {
        *self.state.write() = Some(items);
        Ok(())
    }
}

/// In-memory singleton entry. Logical value is a single `T`.
pub struct MemoryValueEntry<T> {
    key: String,
    state: RwLock<Option<T>>,
}

impl<T: Clone + Send + Sync + 'static> MemoryValueEntry<T> {
    pub fn new(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            state: RwLock::new(None),
        })
    }

    pub fn with_value(key: impl Into<String>, value: T) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            state: RwLock::new(Some(value)),
        })
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Entry for MemoryValueEntry<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn data_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn capabilities(&self) -> &'static [EntryCapability] {
        SINGLETON_CAPABILITIES
    }

    async fn exists(&self) -> Result<bool, PipelineError> {
        Ok(self.state.read().is_some())
    }

    // count() == 1 iff exists() for singletons
    async fn count(&self) -> Result<u64, PipelineError> {
        Ok(u64::from(self.state.read().is_some()))
    }

    async fn load_erased(&self) -> Result<ErasedValue, PipelineError> {
        Ok(Box::new(self.load_value().await?))
    }

    async fn save_erased(&self, value: ErasedValue) -> Result<(), PipelineError> {
        let value = value.downcast::<T>().map_err(|_| {
            PipelineError::type_mismatch(format!("entry '{}' expects {}", self.key, std::any::type_name::<T>()))
        })?;
        self.save_value(*value).await
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ValueEntry<T> for MemoryValueEntry<T> {
    async fn load_value(&self) -> Result<T, PipelineError> {
        self.state.read().clone().ok_or_else(|| {
            PipelineError::LoadBeforeSave(format!("memory entry '{}' was loaded before any save", self.key))
        })
    }

    async fn save_value(&self, value: T) -> Result<(), PipelineError> {
        *self.state.write() = Some(value);
        Ok(())
    }
}
