//! Precedence constraint resolution
//!
//! A constraint names a predecessor and a successor executable, either through
//! two `DTS:Executable` reference children marked `DTS:IsFrom="-1"` (before)
//! and `DTS:IsFrom="0"` (after), or through `DTS:From` / `DTS:To` ref-paths.

use crate::error::{Diagnostics, PackageError, Result, Warning};
use crate::model::{NodeId, NodeKind, PackageGraph};

const IS_FROM_ATTRIBUTE: &str = "DTS:IsFrom";
const IDREF_ATTRIBUTE: &str = "IDREF";
const BEFORE_MARKER: &str = "-1";
const AFTER_MARKER: &str = "0";

/// One side of a constraint, as written in the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Identifier reference (`IDREF`)
    Id(String),
    /// Ref-path reference (`DTS:From` / `DTS:To`)
    Path(String),
}

impl Endpoint {
    pub fn resolve(&self, graph: &PackageGraph) -> Option<NodeId> {
        match self {
            Endpoint::Id(id) => graph.lookup(id),
            Endpoint::Path(path) => graph.registry().lookup_path(path),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Endpoint::Id(key) | Endpoint::Path(key) => key,
        }
    }
}

/// Ordering relationship derived from a precedence constraint node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceEdge {
    pub constraint: NodeId,
    pub before: Endpoint,
    pub after: Endpoint,
    pub expression: Option<String>,
}

impl PrecedenceEdge {
    pub fn from_node(graph: &PackageGraph, constraint: NodeId) -> Result<Self> {
        let node = graph.node(constraint);
        let malformed = |reason: String| PackageError::MalformedConstraint {
            node: node.label(),
            reason,
        };

        if *node.kind() != NodeKind::PrecedenceConstraint {
            return Err(malformed(format!("<{}> is not a precedence constraint", node.tag())));
        }

        let references: Vec<NodeId> = graph
            .children(constraint)
            .filter(|&c| *graph.node(c).kind() == NodeKind::Executable)
            .collect();

        let (before, after) = if references.is_empty() {
            let from = node.attribute("DTS:From").filter(|p| !p.is_empty());
            let to = node.attribute("DTS:To").filter(|p| !p.is_empty());
            match (from, to) {
                (Some(from), Some(to)) => (Endpoint::Path(from.to_string()), Endpoint::Path(to.to_string())),
                _ => return Err(malformed("no predecessor/successor references".to_string())),
            }
        } else {
            for &r in &references {
                match graph.node(r).attribute(IS_FROM_ATTRIBUTE) {
                    Some(BEFORE_MARKER) | Some(AFTER_MARKER) => {}
                    Some(other) => {
                        return Err(malformed(format!("unexpected {} value '{}'", IS_FROM_ATTRIBUTE, other)))
                    }
                    None => return Err(malformed(format!("reference without {}", IS_FROM_ATTRIBUTE))),
                }
            }
            let before = side(graph, &references, BEFORE_MARKER, "predecessor").map_err(malformed)?;
            let after = side(graph, &references, AFTER_MARKER, "successor").map_err(malformed)?;
            (before, after)
        };

        let expression = node
            .setting("Expression")
            .filter(|e| !e.trim().is_empty())
            .map(str::to_string);

        Ok(Self {
            constraint,
            before,
            after,
            expression,
        })
    }

    pub fn before_node(&self, graph: &PackageGraph) -> Option<NodeId> {
        self.before.resolve(graph)
    }

    pub fn after_node(&self, graph: &PackageGraph) -> Option<NodeId> {
        self.after.resolve(graph)
    }

    /// Human-readable statement; unresolved sides become placeholders
    pub fn render(&self, graph: &PackageGraph, diagnostics: &mut Diagnostics) -> String {
        let before = endpoint_name(graph, self.constraint, &self.before, diagnostics);
        let after = endpoint_name(graph, self.constraint, &self.after, diagnostics);
        match &self.expression {
            None => format!("After {} EXECUTE {}", before, after),
            Some(expr) => format!("After {}, IF ({}), EXECUTE {}", before, expr, after),
        }
    }
}

fn side(graph: &PackageGraph, references: &[NodeId], marker: &str, what: &str) -> std::result::Result<Endpoint, String> {
    let matching: Vec<NodeId> = references
        .iter()
        .copied()
        .filter(|&r| graph.node(r).attribute(IS_FROM_ATTRIBUTE) == Some(marker))
        .collect();

    match matching.as_slice() {
        [single] => graph
            .node(*single)
            .attribute(IDREF_ATTRIBUTE)
            .filter(|id| !id.is_empty())
            .map(|id| Endpoint::Id(id.to_string()))
            .ok_or_else(|| format!("{} reference has no {}", what, IDREF_ATTRIBUTE)),
        [] => Err(format!("missing {}", what)),
        _ => Err(format!("ambiguous {} ({} references)", what, matching.len())),
    }
}

fn endpoint_name(graph: &PackageGraph, constraint: NodeId, endpoint: &Endpoint, diagnostics: &mut Diagnostics) -> String {
    match endpoint.resolve(graph) {
        Some(target) => graph.node(target).display_name(),
        None => {
            diagnostics.warn(Warning::DanglingReference {
                from: graph.node(constraint).label(),
                reference: endpoint.key().to_string(),
            });
            format!("<unresolved {}>", endpoint.key())
        }
    }
}

/// Constraints declared in `container` whose successor is `target`
pub fn constraints_targeting(graph: &PackageGraph, container: NodeId, target: NodeId) -> Result<Vec<PrecedenceEdge>> {
    let mut edges = Vec::new();
    for constraint in graph.members(container, &NodeKind::PrecedenceConstraint) {
        let edge = PrecedenceEdge::from_node(graph, constraint)?;
        if edge.after_node(graph) == Some(target) {
            edges.push(edge);
        }
    }
    Ok(edges)
}

/// Constraints declared in `container` whose successor is not registered
pub fn unresolved_successors(graph: &PackageGraph, container: NodeId) -> Result<Vec<PrecedenceEdge>> {
    let mut edges = Vec::new();
    for constraint in graph.members(container, &NodeKind::PrecedenceConstraint) {
        let edge = PrecedenceEdge::from_node(graph, constraint)?;
        if edge.after_node(graph).is_none() {
            edges.push(edge);
        }
    }
    Ok(edges)
}
