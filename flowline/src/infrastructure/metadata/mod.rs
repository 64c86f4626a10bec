// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # DAG Metadata Providers
//!
//! Serializers of the core's [`DagExport`] structure. The core only
//! produces the structure; providers render it. A provider failure is a
//! logged warning, never a run failure.
//!
//! Shipped providers:
//!
//! - `json` — the export structure, pretty-printed.
//! - `mermaid` — a `flowchart TD` with entries as cylinders, nodes as
//!   rectangles grouped into layer subgraphs, and edges following the
//!   data flow.

use flowline_domain::entry::short_type_name;
use flowline_domain::pipeline::DagExport;
use flowline_domain::PipelineError;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Renders a [`DagExport`] into one output document.
pub trait DagExportProvider: Send + Sync {
    /// Provider name as referenced by configuration (`json`, `mermaid`).
    fn name(&self) -> &'static str;

    /// File extension of the rendered document.
    fn file_extension(&self) -> &'static str;

    /// Renders the export. Side-effect-free.
    fn render(&self, export: &DagExport) -> Result<String, PipelineError>;
}

/// Looks a provider up by its configured name.
pub fn provider_for(name: &str) -> Option<Box<dyn DagExportProvider>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(JsonDagProvider)),
        "mermaid" => Some(Box::new(MermaidDagProvider)),
        _ => None,
    }
}

/// Renders the export and writes it to `directory`, named after the
/// pipeline. Returns the written path.
pub async fn write_export(
    provider: &dyn DagExportProvider,
    export: &DagExport,
    directory: &Path,
) -> Result<PathBuf, PipelineError> {
    let rendered = provider.render(export)?;
    let stem = export.name.as_deref().unwrap_or("pipeline");
    let path = directory.join(format!("{}.dag.{}", stem, provider.file_extension()));
    tokio::fs::create_dir_all(directory)
        .await
        .map_err(|error| PipelineError::io_error(format!("{}: {}", directory.display(), error)))?;
    tokio::fs::write(&path, rendered)
        .await
        .map_err(|error| PipelineError::io_error(format!("{}: {}", path.display(), error)))?;
    Ok(path)
}

/// Pretty-printed JSON rendering of the export structure.
pub struct JsonDagProvider;

impl DagExportProvider for JsonDagProvider {
    fn name(&self) -> &'static str {
        "json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, export: &DagExport) -> Result<String, PipelineError> {
        Ok(serde_json::to_string_pretty(export)?)
    }
}

/// Mermaid flowchart rendering of the export structure.
pub struct MermaidDagProvider;

impl MermaidDagProvider {
    fn identifier(prefix: &str, raw: &str) -> String {
        let sanitized: String = raw
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
            .collect();
        format!("{}_{}", prefix, sanitized)
    }
}

impl DagExportProvider for MermaidDagProvider {
    fn name(&self) -> &'static str {
        "mermaid"
    }

    fn file_extension(&self) -> &'static str {
        "mmd"
    }

    fn render(&self, export: &DagExport) -> Result<String, PipelineError> {
        let mut out = String::from("flowchart TD\n");

        for entry in &export.entries {
            let id = Self::identifier("entry", &entry.key);
            let label = format!("{}<br/>{}", entry.key, short_type_name(&entry.data_type_name));
            let _ = writeln!(out, "    {}[(\"{}\")]", id, label);
        }

        for layer in 0..export.layer_count() {
            let _ = writeln!(out, "    subgraph layer_{}[\"Layer {}\"]", layer, layer);
            for node in export.nodes.iter().filter(|node| node.layer == layer) {
                let id = Self::identifier("node", &node.name);
                let _ = writeln!(out, "        {}[\"{}\"]", id, node.name);
            }
            let _ = writeln!(out, "    end");
        }

        for node in &export.nodes {
            let node_id = Self::identifier("node", &node.name);
            for input in &node.inputs {
                let _ = writeln!(out, "    {} --> {}", Self::identifier("entry", input), node_id);
            }
            for output in &node.outputs {
                let _ = writeln!(out, "    {} --> {}", node_id, Self::identifier("entry", output));
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowline_domain::pipeline::{DagEntry, DagNode};

    fn sample_export() -> DagExport {
        DagExport {
            name: Some("parse_ratings".into()),
            nodes: vec![DagNode {
                name: "parse_rating".into(),
                inputs: vec!["raw_ratings".into()],
                outputs: vec!["parsed_ratings".into()],
                layer: 0,
            }],
            entries: vec![
                DagEntry {
                    key: "raw_ratings".into(),
                    data_type_name: "demo::RawRating".into(),
                    capabilities: vec!["readable".into(), "dataset".into()],
                },
                DagEntry {
                    key: "parsed_ratings".into(),
                    data_type_name: "demo::ParsedRating".into(),
                    capabilities: vec!["readable".into(), "writable".into(), "dataset".into()],
                },
            ],
        }
    }

    #[test]
    fn test_json_provider_round_trips() {
        let export = sample_export();
        let rendered = JsonDagProvider.render(&export).unwrap();
        let back: DagExport = serde_json::from_str(&rendered).unwrap();
        assert_eq!(back, export);
    }

    #[test]
    fn test_mermaid_provider_draws_edges() {
        let rendered = MermaidDagProvider.render(&sample_export()).unwrap();
        assert!(rendered.starts_with("flowchart TD"));
        assert!(rendered.contains("entry_raw_ratings --> node_parse_rating"));
        assert!(rendered.contains("node_parse_rating --> entry_parsed_ratings"));
        assert!(rendered.contains("subgraph layer_0"));
    }

    #[test]
    fn test_provider_lookup_by_name() {
        assert!(provider_for("json").is_some());
        assert!(provider_for("Mermaid").is_some());
        assert!(provider_for("graphviz").is_none());
    }
}
