//! Machine-readable package summary
//!
//! Same facts as the markdown document, shaped for serde_json.

use crate::doc::connections::{describe_connection, ConnectionInfo};
use crate::doc::types::ProgramVariable;
use crate::doc::{package_connections, package_variables, top_level_executables, TaskKind};
use crate::error::Result;
use crate::model::{NodeId, NodeKind, PackageGraph};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ExecutableSummary {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ExecutableSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageSummary {
    pub name: String,
    pub creator: Option<String>,
    pub version_guid: Option<String>,
    pub variables: Vec<ProgramVariable>,
    pub connections: Vec<ConnectionInfo>,
    pub executables: Vec<ExecutableSummary>,
}

pub fn build_summary(graph: &PackageGraph) -> Result<PackageSummary> {
    let root = graph.node(graph.root());

    let variables = package_variables(graph)
        .into_iter()
        .map(|v| ProgramVariable::from_node(graph, v, true))
        .collect::<Result<Vec<_>>>()?;

    let connections = package_connections(graph)
        .into_iter()
        .map(|c| describe_connection(graph, c))
        .collect();

    let executables = top_level_executables(graph)
        .into_iter()
        .map(|e| summarize_executable(graph, e))
        .collect();

    Ok(PackageSummary {
        name: root.display_name(),
        creator: root.setting("CreatorName").map(str::to_string),
        version_guid: root.setting("VersionGUID").map(str::to_string),
        variables,
        connections,
        executables,
    })
}

fn summarize_executable(graph: &PackageGraph, exe: NodeId) -> ExecutableSummary {
    let node = graph.node(exe);
    ExecutableSummary {
        name: node.display_name(),
        kind: TaskKind::of(node).label().to_string(),
        description: node.description().map(str::to_string),
        children: graph
            .members(exe, &NodeKind::Executable)
            .into_iter()
            .map(|c| summarize_executable(graph, c))
            .collect(),
    }
}

pub fn summary_to_json(summary: &PackageSummary) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
