//! Connection manager extraction

use crate::model::{NodeId, NodeKind, PackageGraph};
use serde::Serialize;

/// Value written for anything that cannot be located
pub const NOT_FOUND: &str = "Not Found";

/// Database provider family, derived from a connection's creation name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Provider {
    OleDb,
    Sql,
    Other(String),
}

impl Provider {
    pub fn from_creation_name(creation_name: &str) -> Self {
        if creation_name.starts_with("OLEDB") {
            Provider::OleDb
        } else if creation_name.starts_with("ADO.NET:System.Data.SqlClient.SqlConnection") {
            Provider::Sql
        } else {
            Provider::Other(creation_name.to_string())
        }
    }
}

/// Everything the connections block shows about one connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub name: String,
    pub connection_string: Option<String>,
    pub creation_name: Option<String>,
    pub dts_id: Option<String>,
    pub description: Option<String>,
    pub provider: Option<Provider>,
}

impl ConnectionInfo {
    pub fn connection_string_or_sentinel(&self) -> &str {
        self.connection_string.as_deref().unwrap_or(NOT_FOUND)
    }
}

/// Locates the connection string of a connection manager node
///
/// Looks inside the node's object data for a nested database connection
/// manager (property or attribute) and then for an SMTP connection manager.
pub fn connection_string(graph: &PackageGraph, connection: NodeId) -> Option<String> {
    let data = graph.child_by_kind(connection, &NodeKind::ObjectData)?;

    if let Some(inner) = graph.child_by_kind(data, &NodeKind::ConnectionManager) {
        return graph
            .node(inner)
            .setting("ConnectionString")
            .map(str::to_string);
    }

    graph
        .child_by_kind(data, &NodeKind::SmtpConnectionManager)
        .and_then(|smtp| graph.node(smtp).attribute("ConnectionString"))
        .map(str::to_string)
}

/// Everything known about one connection manager
///
/// Pure lookup; the caller decides whether a missing string is worth a warning.
pub fn describe_connection(graph: &PackageGraph, connection: NodeId) -> ConnectionInfo {
    let node = graph.node(connection);
    let connection_string = connection_string(graph, connection);

    let creation_name = node.setting("CreationName").map(str::to_string);
    ConnectionInfo {
        name: node.display_name(),
        connection_string,
        provider: creation_name.as_deref().map(Provider::from_creation_name),
        creation_name,
        dts_id: node.id().map(str::to_string),
        description: node.description().map(str::to_string),
    }
}

/// `(name, connection string or sentinel)` per connection, in package order
///
/// Connections sharing a name each keep their own entry.
pub fn connection_strings(connections: &[ConnectionInfo]) -> Vec<(String, String)> {
    connections
        .iter()
        .map(|info| (info.name.clone(), info.connection_string_or_sentinel().to_string()))
        .collect()
}

/// Name of the connection registered under `id`
pub fn connection_name<'g>(graph: &'g PackageGraph, id: &str) -> Option<&'g str> {
    graph
        .lookup(id)
        .map(|c| graph.node(c))
        .filter(|n| *n.kind() == NodeKind::ConnectionManager)
        .and_then(|n| n.name())
}
