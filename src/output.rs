//! Output rendering - resolver results for external consumers
//!
//! The graph consumer takes a flat list of (from, to, value) triples; the
//! table consumer takes the hierarchical type → name → package → files
//! groupings. Both renderings treat an empty result as a valid terminal
//! state, not a failure.

use crate::resolver::{DependencyGraph, Grouping};
use crate::Result;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

/// One weighted edge of the package dependency graph
#[derive(Debug, Clone, Serialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub value: u64,
}

/// Flatten the graph into (from, to, value) triples
pub fn graph_edges(graph: &DependencyGraph) -> Vec<DependencyEdge> {
    graph
        .iter()
        .flat_map(|(from, targets)| {
            targets.iter().map(|(to, value)| DependencyEdge {
                from: from.clone(),
                to: to.clone(),
                value: *value,
            })
        })
        .collect()
}

/// Render the graph as a JSON list of edge triples
pub fn render_graph_json(graph: &DependencyGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&graph_edges(graph))?)
}

/// Hierarchical resolver output for the table consumer
#[derive(Debug, Serialize)]
pub struct GroupedOutput<'a> {
    pub definitions: &'a Grouping,
    pub usage: &'a Grouping,
}

/// Render both groupings as JSON
pub fn render_groupings_json(definitions: &Grouping, usage: &Grouping) -> Result<String> {
    Ok(serde_json::to_string_pretty(&GroupedOutput {
        definitions,
        usage,
    })?)
}

#[derive(Tabled)]
struct DependencyRow {
    #[tabled(rename = "Type")]
    identifier_type: &'static str,
    #[tabled(rename = "Identifier")]
    name: String,
    #[tabled(rename = "Definitions")]
    definitions: String,
    #[tabled(rename = "Usage")]
    usage: String,
}

/// Render a usage-driven dependency table: one row per used identifier,
/// with its defining and using packages side by side.
pub fn render_dependency_table(definitions: &Grouping, usage: &Grouping) -> String {
    let mut rows = Vec::new();

    for (identifier_type, names) in usage {
        for (name, using_packages) in names {
            let defining_packages = definitions
                .get(identifier_type)
                .and_then(|names| names.get(name));

            rows.push(DependencyRow {
                identifier_type: identifier_type.label(),
                name: name.clone(),
                definitions: defining_packages.map(package_cell).unwrap_or_default(),
                usage: package_cell(using_packages),
            });
        }
    }

    if rows.is_empty() {
        return String::new();
    }

    Table::new(&rows).with(Style::rounded()).to_string()
}

fn package_cell(packages: &std::collections::BTreeMap<String, Vec<String>>) -> String {
    packages
        .iter()
        .map(|(package, files)| format!("{}: {}", package, files.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}
