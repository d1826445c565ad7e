//! Documentation and flow emitter
//!
//! Walks executables and appends markdown to a buffer. Visible variables are
//! handed down by slice; each container builds its own extended copy so
//! sibling branches never see each other's locals.

use crate::doc::connections::{describe_connection, ConnectionInfo, NOT_FOUND};
use crate::doc::markdown::{bold, list_item, table};
use crate::doc::precedence::{constraints_targeting, unresolved_successors};
use crate::doc::tasks::{leaf_statement, loop_header, referenced_variables, TaskKind};
use crate::doc::types::ProgramVariable;
use crate::error::{Diagnostics, Result, Warning};
use crate::model::{NodeId, NodeKind, PackageGraph};

/// One indentation step in the flow and function views
pub const INDENT: &str = "\t";

pub struct DocEmitter<'g> {
    graph: &'g PackageGraph,
    out: String,
    diagnostics: Diagnostics,
}

impl<'g> DocEmitter<'g> {
    pub fn new(graph: &'g PackageGraph) -> Self {
        Self {
            graph,
            out: String::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn output(&self) -> &str {
        &self.out
    }

    /// Consumes the emitter, returning the buffer and collected warnings
    pub fn finish(self) -> (String, Diagnostics) {
        (self.out, self.diagnostics)
    }

    /// One declaration line per variable; returns the variables rendered
    pub fn emit_variable_list(
        &mut self,
        variables: &[NodeId],
        indent: &str,
        as_global: bool,
    ) -> Result<Vec<ProgramVariable>> {
        let mut rendered = Vec::with_capacity(variables.len());
        for &v in variables {
            let var = ProgramVariable::from_node(self.graph, v, as_global)?;
            self.line(&list_item(indent, &var.declaration()));
            rendered.push(var);
        }
        Ok(rendered)
    }

    /// Entry plus Name/Value table for each connection
    pub fn emit_connections(&mut self, connections: &[NodeId]) -> Vec<ConnectionInfo> {
        let mut infos = Vec::with_capacity(connections.len());
        for &c in connections {
            let info = describe_connection(self.graph, c);
            if info.connection_string.is_none() {
                self.diagnostics.warn(Warning::ConnectionStringNotFound {
                    connection: self.graph.node(c).label(),
                });
            }
            let dts_id = info.dts_id.as_deref().unwrap_or(NOT_FOUND);
            let creation_name = info.creation_name.as_deref().unwrap_or(NOT_FOUND);
            let description = info.description.as_deref().unwrap_or(NOT_FOUND);

            self.line(&list_item("", &bold(&info.name)));
            self.line("");
            let rows = table(&[
                ("Connection String", info.connection_string_or_sentinel()),
                ("Creation Name", creation_name),
                ("DtsId", dts_id),
                ("Description", description),
            ]);
            self.out.push_str(&rows);
            infos.push(info);
        }
        infos
    }

    /// Shallow summary: name and description of each executable
    pub fn emit_flat_list(&mut self, executables: &[NodeId]) {
        for &exe in executables {
            let node = self.graph.node(exe);
            self.line(&list_item("   ", &node.display_name()));
            if let Some(description) = node.description() {
                self.line(&list_item("       ", description));
            }
        }
    }

    /// Nested control flow of a container's executables in document order,
    /// with precedence annotations
    pub fn emit_flow_sequence(
        &mut self,
        container: NodeId,
        indent: &str,
        visible: &[ProgramVariable],
    ) -> Result<()> {
        let graph = self.graph;
        for exe in graph.members(container, &NodeKind::Executable) {
            self.emit_constraints(container, exe, indent)?;

            let node = graph.node(exe);
            let scope = self.scope_with_locals(exe, visible)?;

            if graph.members(exe, &NodeKind::Executable).is_empty() {
                let mut text = format!("{}: {}", bold(&node.display_name()), leaf_statement(graph, exe, &mut self.diagnostics));
                let uses = referenced_variables(graph, exe, &scope);
                if !uses.is_empty() {
                    text.push_str(&format!(" (uses {})", uses.join(", ")));
                }
                self.line(&list_item(indent, &text));
            } else {
                let heading = loop_header(graph, exe).unwrap_or_else(|| TaskKind::of(node).label().to_string());
                self.line(&list_item(indent, &format!("{} ({})", bold(&node.display_name()), heading)));
                self.emit_flow_sequence(exe, &format!("{}{}", indent, INDENT), &scope)?;
            }
        }
        self.emit_dangling_successors(container, indent)
    }

    /// An executable as a pseudo-function: locals, then its body
    pub fn emit_function_body(
        &mut self,
        exe: NodeId,
        indent: &str,
        visible: &[ProgramVariable],
    ) -> Result<()> {
        let graph = self.graph;
        let node = graph.node(exe);
        let inner = format!("{}{}", indent, INDENT);

        self.line(&list_item(indent, &format!("{} ({})", bold(&node.display_name()), TaskKind::of(node).label())));
        if let Some(description) = node.description() {
            self.line(&list_item(&inner, &format!("Description: {}", description)));
        }

        let local_nodes = graph.members(exe, &NodeKind::Variable);
        let mut scope = visible.to_vec();
        if !local_nodes.is_empty() {
            self.line(&list_item(&inner, "Local variables:"));
            let locals = self.emit_variable_list(&local_nodes, &format!("{}{}", inner, INDENT), false)?;
            scope.extend(locals);
        }

        if graph.members(exe, &NodeKind::Executable).is_empty() {
            let statement = leaf_statement(graph, exe, &mut self.diagnostics);
            self.line(&list_item(&inner, &statement));
            let uses = referenced_variables(graph, exe, &scope);
            if !uses.is_empty() {
                self.line(&list_item(&inner, &format!("Uses: {}", uses.join(", "))));
            }
        } else {
            if let Some(header) = loop_header(graph, exe) {
                self.line(&list_item(&inner, &header));
            }
            self.emit_functions(exe, &inner, &scope)?;
        }
        Ok(())
    }

    /// Function bodies of a container's executables, each preceded by the
    /// constraints that target it
    pub fn emit_functions(
        &mut self,
        container: NodeId,
        indent: &str,
        visible: &[ProgramVariable],
    ) -> Result<()> {
        for exe in self.graph.members(container, &NodeKind::Executable) {
            self.emit_constraints(container, exe, indent)?;
            self.emit_function_body(exe, indent, visible)?;
        }
        self.emit_dangling_successors(container, indent)
    }

    /// Constraints of `container` that target `exe`, one list item each
    fn emit_constraints(&mut self, container: NodeId, exe: NodeId, indent: &str) -> Result<()> {
        for edge in constraints_targeting(self.graph, container, exe)? {
            let text = edge.render(self.graph, &mut self.diagnostics);
            self.line(&list_item(indent, &text));
        }
        Ok(())
    }

    /// Constraints whose successor resolves to nothing; listed after the
    /// container's executables
    fn emit_dangling_successors(&mut self, container: NodeId, indent: &str) -> Result<()> {
        for edge in unresolved_successors(self.graph, container)? {
            let text = edge.render(self.graph, &mut self.diagnostics);
            self.line(&list_item(indent, &text));
        }
        Ok(())
    }

    fn scope_with_locals(&self, exe: NodeId, visible: &[ProgramVariable]) -> Result<Vec<ProgramVariable>> {
        let mut scope = visible.to_vec();
        for v in self.graph.members(exe, &NodeKind::Variable) {
            scope.push(ProgramVariable::from_node(self.graph, v, false)?);
        }
        Ok(scope)
    }
}
