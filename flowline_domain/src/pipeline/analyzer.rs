// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dependency Analyzer
//!
//! Turns a flat node list into a layered DAG in four steps:
//!
//! 1. **Producer index** — each output entry maps to exactly one producing
//!    node; a second producer is a single-writer violation naming both.
//! 2. **Dependency edges** — a node depends on the producer of each of its
//!    inputs; inputs without a producer are external.
//! 3. **Layering** — Kahn-style: nodes with no unsatisfied dependencies
//!    get layer 0, otherwise `1 + max(dep.layer)`. Nodes that can never be
//!    assigned form a cycle, reported with every member named.
//! 4. **Grouping** — `layers[i]` collects the nodes with `layer == i`,
//!    preserving insertion order within the layer.
//!
//! Everything iterates in insertion order, so re-analysis of a frozen node
//! set reproduces identical layer assignments. Layer 0 is the set of nodes
//! with no producer-backed inputs — a node whose only input is external is
//! still layer 0.

use super::node::PipelineNode;
use crate::entry::entry_identity;
use crate::PipelineError;
use std::collections::{BTreeSet, HashMap};

/// Producer/consumer resolution, single-writer enforcement, cycle
/// detection, and topological layering over a node list.
pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    /// Analyzes `nodes` in place, writing each node's dependency set and
    /// layer, and returns the layer grouping as node indices.
    pub fn analyze(nodes: &mut [PipelineNode]) -> Result<Vec<Vec<usize>>, PipelineError> {
        // Step 1: producer index, asserting the single-writer rule.
        let mut producer: HashMap<usize, usize> = HashMap::new();
        for (index, node) in nodes.iter().enumerate() {
            for output in node.outputs() {
                let identity = entry_identity(output);
                if let Some(&existing) = producer.get(&identity) {
                    return Err(PipelineError::SingleWriterViolation(format!(
                        "entry '{}' is produced by both '{}' and '{}'",
                        output.key(),
                        nodes[existing].name(),
                        node.name()
                    )));
                }
                producer.insert(identity, index);
            }
        }

        // Step 2: dependency edges from producer lookups.
        let mut deps_of: Vec<BTreeSet<usize>> = Vec::with_capacity(nodes.len());
        for node in nodes.iter() {
            let mut deps = BTreeSet::new();
            for input in node.inputs() {
                if let Some(&producing) = producer.get(&entry_identity(input)) {
                    deps.insert(producing);
                }
            }
            deps_of.push(deps);
        }

        // Step 3: Kahn-style layering.
        let count = nodes.len();
        let mut layer_of: Vec<Option<usize>> = vec![None; count];
        let mut assigned = 0;
        while assigned < count {
            let mut progressed = false;
            for index in 0..count {
                if layer_of[index].is_some() {
                    continue;
                }
                let mut ready = true;
                let mut highest_dep = None;
                for &dep in &deps_of[index] {
                    // A self-dependency can never be satisfied.
                    if dep == index {
                        ready = false;
                        break;
                    }
                    match layer_of[dep] {
                        Some(layer) => {
                            highest_dep = Some(highest_dep.map_or(layer, |h: usize| h.max(layer)));
                        }
                        None => {
                            ready = false;
                            break;
                        }
                    }
                }
                if ready {
                    layer_of[index] = Some(highest_dep.map_or(0, |h| h + 1));
                    assigned += 1;
                    progressed = true;
                }
            }
            if !progressed {
                let members: Vec<&str> = (0..count)
                    .filter(|&index| layer_of[index].is_none())
                    .map(|index| nodes[index].name())
                    .collect();
                return Err(PipelineError::CycleDetected(format!(
                    "nodes {{{}}} form a dependency cycle",
                    members.join(", ")
                )));
            }
        }

        // Step 4: group into layers, insertion order within each.
        let layer_count = layer_of.iter().flatten().copied().max().map_or(0, |max| max + 1);
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
        for index in 0..count {
            if let Some(layer) = layer_of[index] {
                layers[layer].push(index);
            }
        }

        for (index, node) in nodes.iter_mut().enumerate() {
            if let Some(layer) = layer_of[index] {
                node.set_analysis(std::mem::take(&mut deps_of[index]), layer);
            }
        }

        Ok(layers)
    }
}
