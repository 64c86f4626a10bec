// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # DAG Export Contract
//!
//! A structural, serializable description of a built pipeline: nodes with
//! their entry keys and layer, entries with their declared data type and
//! capability tags. Providers (JSON, Mermaid, ...) live in the
//! infrastructure layer and only consume this structure; producing it is
//! side-effect-free.

use serde::{Deserialize, Serialize};

/// One node in the exported DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagNode {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub layer: usize,
}

/// One entry in the exported DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagEntry {
    pub key: String,
    pub data_type_name: String,
    pub capabilities: Vec<String>,
}

/// Structural description of a built pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DagExport {
    pub name: Option<String>,
    pub nodes: Vec<DagNode>,
    pub entries: Vec<DagEntry>,
}

impl DagExport {
    /// Number of layers in the exported structure.
    pub fn layer_count(&self) -> usize {
        self.nodes.iter().map(|node| node.layer + 1).max().unwrap_or(0)
    }
}
