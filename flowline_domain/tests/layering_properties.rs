// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Layering Property Tests
//!
//! Property-based checks of the dependency analyzer over randomly
//! generated acyclic wirings:
//!
//! - every dependency sits on a strictly lower layer,
//! - layer 0 is exactly the set of nodes without producer-backed inputs,
//! - re-analysis of a frozen node set reproduces the same assignment.

use flowline_domain::entry::MemoryEntry;
use flowline_domain::pipeline::{NodeInput, NodeOutput, PipelineBuilder};
use flowline_domain::{Node, PipelineError};
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Identity;

impl Node for Identity {
    type Input = u32;
    type Output = u32;

    fn transform(&self, items: Vec<u32>) -> Result<Vec<u32>, PipelineError> {
        Ok(items)
    }
}

/// A random acyclic wiring: node `i` reads a subset of the entries
/// produced by nodes `< i` (plus one external entry) and produces one
/// entry of its own.
fn acyclic_wirings() -> impl Strategy<Value = Vec<Vec<usize>>> {
    // For each of up to 8 nodes, a bitmask over the earlier nodes' outputs.
    prop::collection::vec(prop::bits::usize::masked(0xff), 1..8).prop_map(|masks| {
        masks
            .iter()
            .enumerate()
            .map(|(index, mask)| (0..index).filter(|source| mask & (1 << source) != 0).collect())
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_layers_respect_dependencies(wiring in acyclic_wirings()) {
        let externals: Vec<_> = (0..wiring.len())
            .map(|index| MemoryEntry::with_items(format!("external_{}", index), vec![1u32]))
            .collect();
        let produced: Vec<_> = (0..wiring.len())
            .map(|index| MemoryEntry::<u32>::new(format!("produced_{}", index)))
            .collect();

        let mut builder = PipelineBuilder::named("random");
        for (index, sources) in wiring.iter().enumerate() {
            // One upstream edge per node is enough to constrain the
            // layering; nodes without an upstream read their external.
            let input = match sources.first() {
                Some(&source) => NodeInput::dataset(Arc::clone(&produced[source])),
                None => NodeInput::dataset(Arc::clone(&externals[index])),
            };
            builder = builder.add_node(
                format!("node_{}", index),
                Identity,
                input,
                NodeOutput::dataset(Arc::clone(&produced[index])),
            );
        }

        let mut pipeline = builder.finish().expect("wiring is valid");
        pipeline.build().expect("acyclic by construction");

        let layer_of: HashMap<&str, usize> = pipeline
            .nodes()
            .iter()
            .map(|node| (node.name(), node.layer().expect("assigned")))
            .collect();

        for (index, sources) in wiring.iter().enumerate() {
            let name = format!("node_{}", index);
            let layer = layer_of[name.as_str()];
            if let Some(&source) = sources.first() {
                let source_name = format!("node_{}", source);
                prop_assert!(layer_of[source_name.as_str()] < layer);
            } else {
                prop_assert_eq!(layer, 0);
            }
        }

        // Build is idempotent on a frozen node set.
        let first_layers = pipeline.layers().expect("built").to_vec();
        pipeline.build().expect("re-analysis succeeds");
        prop_assert_eq!(pipeline.layers().expect("built"), first_layers.as_slice());
    }
}
