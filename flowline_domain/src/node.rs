// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Nodes
//!
//! A node is a pure transformation unit with declared input and output item
//! types. From the orchestrator's perspective a node is synchronous: it
//! receives the complete input sequence and must not return until its
//! output sequence is complete. All I/O — loading inputs, saving outputs —
//! belongs to the executor, not the node.
//!
//! ## Construction and Injection
//!
//! Nodes are default-constructible on purpose, so registries and builders
//! can create them generically without a DI container. Dependencies arrive
//! by property injection after construction: parameters and the optional
//! logger are public fields assigned before the node is wired into a
//! pipeline.
//!
//! ```
//! use flowline_domain::logging::PipelineLogger;
//! use flowline_domain::node::Node;
//! use flowline_domain::PipelineError;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Threshold {
//!     pub cutoff: f64,
//!     pub logger: Option<Arc<dyn PipelineLogger>>,
//! }
//!
//! impl Node for Threshold {
//!     type Input = f64;
//!     type Output = f64;
//!
//!     fn transform(&self, items: Vec<f64>) -> Result<Vec<f64>, PipelineError> {
//!         if let Some(logger) = &self.logger {
//!             logger.debug(&format!("thresholding {} items", items.len()));
//!         }
//!         Ok(items.into_iter().filter(|value| *value >= self.cutoff).collect())
//!     }
//! }
//!
//! let mut node = Threshold::default();
//! node.cutoff = 0.5;
//! assert_eq!(node.transform(vec![0.2, 0.8]).unwrap(), vec![0.8]);
//! ```

use crate::PipelineError;

/// A pure transform with declared input and output item types.
///
/// Transforms *should* be pure; side effects beyond logging are
/// discouraged but not blocked. Multi-input and multi-output shapes are
/// expressed through [schema objects](crate::mapping::SchemaObject), never
/// through extra type parameters here.
pub trait Node: Default + Send + Sync + 'static {
    /// Item type of the input sequence.
    type Input: Send + 'static;

    /// Item type of the output sequence.
    type Output: Send + 'static;

    /// Transforms the complete input sequence into the complete output
    /// sequence.
    fn transform(&self, items: Vec<Self::Input>) -> Result<Vec<Self::Output>, PipelineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Doubler;

    impl Node for Doubler {
        type Input = u32;
        type Output = u32;

        fn transform(&self, items: Vec<u32>) -> Result<Vec<u32>, PipelineError> {
            Ok(items.into_iter().map(|value| value * 2).collect())
        }
    }

    #[test]
    fn test_transform_maps_the_sequence() {
        let node = Doubler;
        assert_eq!(node.transform(vec![1, 2, 3]).unwrap(), vec![2, 4, 6]);
    }

    #[test]
    fn test_nodes_are_default_constructible() {
        let node = Doubler::default();
        assert_eq!(node.transform(Vec::new()).unwrap(), Vec::<u32>::new());
    }
}
