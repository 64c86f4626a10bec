// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Null Entry
//!
//! A no-data sentinel that accepts both the input and the output role.
//! Loading produces the singleton unit value; saving discards the write.
//! Used to wire nodes that have no meaningful input (generators) or no
//! meaningful output (pure side-effect sinks) without special-casing the
//! executor.

use super::{Entry, EntryCapability, ErasedValue, ValueEntry};
use crate::PipelineError;
use async_trait::async_trait;
use std::sync::Arc;

const NULL_CAPABILITIES: &[EntryCapability] = &[
    EntryCapability::Readable,
    EntryCapability::Writable,
    EntryCapability::Singleton,
];

/// Readable and writable singleton sentinel carrying `()`.
pub struct NullEntry {
    key: String,
}

impl NullEntry {
    pub fn new(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { key: key.into() })
    }
}

#[async_trait]
impl Entry for NullEntry {
    fn key(&self) -> &str {
        &self.key
    }

    fn data_type_name(&self) -> &'static str {
        "()"
    }

    fn capabilities(&self) -> &'static [EntryCapability] {
        NULL_CAPABILITIES
    }

    async fn exists(&self) -> Result<bool, PipelineError> {
        Ok(true)
    }

    async fn count(&self) -> Result<u64, PipelineError> {
        Ok(1)
    }

    async fn load_erased(&self) -> Result<ErasedValue, PipelineError> {
        Ok(Box::new(()))
    }

    async fn save_erased(&self, _value: ErasedValue) -> Result<(), PipelineError> {
        Ok(())
    }
}

#[async_trait]
impl ValueEntry<()> for NullEntry {
    async fn load_value(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn save_value(&self, _value: ()) -> Result<(), PipelineError> {
        Ok(())
    }
}
