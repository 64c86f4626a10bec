// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pre-Flight Validation
//!
//! Resolution of the *effective inspection level* per external entry, in
//! priority order:
//!
//! 1. a pipeline-level override the user set for that entry key,
//! 2. the entry's own preferred level,
//! 3. the capability default: `Shallow` if the entry is
//!    shallow-inspectable, otherwise `None`.
//!
//! `Deep` is never implicit and `None` skips the entry entirely.
//! Intermediate outputs — anything produced by a node in the pipeline —
//! are never inspected; the pipeline computes its external input set
//! before this module is consulted.

use crate::entry::{Entry, EntryCapability, InspectionLevel};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-pipeline validation options: explicit level overrides by entry key
/// and the shallow-inspection sample size.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    overrides: HashMap<String, InspectionLevel>,
    sample_size: usize,
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces an inspection level for one entry key, overriding both the
    /// entry's preference and the capability default.
    pub fn set_override(&mut self, entry_key: impl Into<String>, level: InspectionLevel) {
        self.overrides.insert(entry_key.into(), level);
    }

    pub fn override_for(&self, entry_key: &str) -> Option<InspectionLevel> {
        self.overrides.get(entry_key).copied()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn set_sample_size(&mut self, sample_size: usize) {
        self.sample_size = sample_size;
    }

    /// Folds another option set into this one; the other side's overrides
    /// win on key collisions. Used when pipelines merge.
    pub fn merge_from(&mut self, other: ValidationOptions) {
        self.overrides.extend(other.overrides);
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            overrides: HashMap::new(),
            sample_size: crate::entry::DEFAULT_INSPECTION_SAMPLE,
        }
    }
}

/// Resolves the effective inspection level for one external entry.
pub fn effective_inspection_level(entry: &Arc<dyn Entry>, options: &ValidationOptions) -> InspectionLevel {
    if let Some(level) = options.override_for(entry.key()) {
        return level;
    }
    if let Some(level) = entry.preferred_inspection_level() {
        return level;
    }
    if entry.has_capability(EntryCapability::ShallowInspectable) {
        InspectionLevel::Shallow
    } else {
        InspectionLevel::None
    }
}
