//! Package documentation
//!
//! Produces the markdown description of a package: header, variables,
//! connections, and three views of the executables (flat list, flow, and
//! function bodies), always in that order.
//!
//! # Submodules
//! - `markdown` - Section markers shared by every block
//! - `types` - Data type mapping and the variable declaration view
//! - `precedence` - Precedence constraint resolution and rendering
//! - `connections` - Connection string extraction and lookups
//! - `tasks` - Executable classification and leaf statements
//! - `emitter` - Recursive flow / function-body emitter

pub mod connections;
pub mod emitter;
pub mod markdown;
pub mod precedence;
pub mod tasks;
pub mod types;

use crate::error::{Result, Warning};
use crate::model::{NodeId, NodeKind, PackageGraph};
use emitter::{DocEmitter, INDENT};
use markdown::{header, sub_header, RULE};
use tracing::{debug, info};

pub use connections::{ConnectionInfo, Provider, NOT_FOUND};
pub use precedence::{Endpoint, PrecedenceEdge};
pub use tasks::TaskKind;
pub use types::{ProgramVariable, TargetType};

/// Indentation of the package-level variable declarations
const VARIABLE_INDENT: &str = "        ";

/// Generated documentation and the recoverable conditions met producing it
#[derive(Debug, Clone)]
pub struct PackageDocument {
    pub markdown: String,
    pub warnings: Vec<Warning>,
    /// Connections as listed in the document, in package order
    pub connections: Vec<ConnectionInfo>,
}

pub fn package_variables(graph: &PackageGraph) -> Vec<NodeId> {
    graph.members(graph.root(), &NodeKind::Variable)
}

pub fn package_connections(graph: &PackageGraph) -> Vec<NodeId> {
    graph.members(graph.root(), &NodeKind::ConnectionManager)
}

/// Executables directly under the package (or its `DTS:Executables` wrapper)
pub fn top_level_executables(graph: &PackageGraph) -> Vec<NodeId> {
    graph.members(graph.root(), &NodeKind::Executable)
}

/// File-style package name used in the document header
pub fn package_title(graph: &PackageGraph) -> String {
    format!("{}.dtsx", graph.node(graph.root()).display_name())
}

/// Writes the full documentation for a package
pub fn document_package(graph: &PackageGraph) -> Result<PackageDocument> {
    let root = graph.node(graph.root());
    let functions = top_level_executables(graph);
    if functions.is_empty() {
        info!("No executables found in {}", package_title(graph));
    }

    let mut emitter = DocEmitter::new(graph);
    emitter.line(&header(&package_title(graph)));
    emitter.line(&sub_header(&format!("CreatorName - {}", root.setting("CreatorName").unwrap_or_default())));
    emitter.line(&sub_header(&format!("VersionGUID - {}", root.setting("VersionGUID").unwrap_or_default())));

    emitter.line(RULE);
    emitter.line(&sub_header("Variables"));
    let globals = emitter.emit_variable_list(&package_variables(graph), VARIABLE_INDENT, true)?;

    emitter.line(RULE);
    emitter.line(&sub_header("ConnectionsManagers"));
    let connections = emitter.emit_connections(&package_connections(graph));

    emitter.line("");
    emitter.line("");
    emitter.line(&sub_header("Executables"));

    emitter.line("* #### Root Level Executables");
    emitter.emit_flat_list(&functions);

    emitter.line("* #### Executable Flows");
    emitter.emit_flow_sequence(graph.root(), INDENT, &globals)?;

    emitter.line("* #### Executables");
    emitter.emit_functions(graph.root(), INDENT, &globals)?;

    let (markdown, diagnostics) = emitter.finish();
    debug!(
        "Documented {} ({} bytes, {} warnings)",
        package_title(graph),
        markdown.len(),
        diagnostics.warnings().len()
    );
    Ok(PackageDocument {
        markdown,
        warnings: diagnostics.into_warnings(),
        connections,
    })
}
