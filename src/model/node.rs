//! Generic package node and the arena that owns every node of one package

use crate::error::{NodeLabel, PackageError, Result};
use crate::model::registry::IdRegistry;
use indexmap::IndexMap;

/// Handle to a node inside a [`PackageGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Role of a node, derived from its element tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Executable,
    Variable,
    VariableValue,
    ConnectionManager,
    SmtpConnectionManager,
    ObjectData,
    PrecedenceConstraint,
    /// `DTS:Property` / `DTS:PropertyExpression`; folded into the parent's
    /// properties during ingestion and never stored as a node
    PropertyHolder,
    /// Plural wrapper such as `DTS:Executables` holding members of one kind
    Collection(Box<NodeKind>),
    /// Any tag not listed above, kept verbatim
    Other(String),
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "DTS:Executable" => NodeKind::Executable,
            "DTS:Variable" => NodeKind::Variable,
            "DTS:VariableValue" => NodeKind::VariableValue,
            "DTS:ConnectionManager" => NodeKind::ConnectionManager,
            "SmtpConnectionManager" => NodeKind::SmtpConnectionManager,
            "DTS:ObjectData" => NodeKind::ObjectData,
            "DTS:PrecedenceConstraint" => NodeKind::PrecedenceConstraint,
            "DTS:Property" | "DTS:PropertyExpression" => NodeKind::PropertyHolder,
            "DTS:Executables" => NodeKind::Collection(Box::new(NodeKind::Executable)),
            "DTS:Variables" => NodeKind::Collection(Box::new(NodeKind::Variable)),
            "DTS:ConnectionManagers" => {
                NodeKind::Collection(Box::new(NodeKind::ConnectionManager))
            }
            "DTS:PrecedenceConstraints" => {
                NodeKind::Collection(Box::new(NodeKind::PrecedenceConstraint))
            }
            other => NodeKind::Other(other.to_string()),
        }
    }

    /// True for the kinds whose element tag is a property rather than a node
    pub fn is_property(&self) -> bool {
        matches!(self, NodeKind::PropertyHolder)
    }
}

/// One element of the source package
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) tag: String,
    pub(crate) kind: NodeKind,
    pub(crate) name: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) attributes: IndexMap<String, String>,
    pub(crate) properties: IndexMap<String, String>,
    pub(crate) content: Option<String>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl Node {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            kind: NodeKind::from_tag(&tag),
            tag,
            name: None,
            id: None,
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            content: None,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Attribute lookup; falls back to a case-insensitive key match
    pub fn attribute(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.attributes.get(key) {
            return Some(value);
        }
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Looks a setting up as a property first, then as a `DTS:` attribute
    pub fn setting(&self, name: &str) -> Option<&str> {
        self.property(name)
            .or_else(|| self.attribute(&format!("DTS:{}", name)))
    }

    pub fn description(&self) -> Option<&str> {
        self.setting("Description").filter(|d| !d.is_empty())
    }

    /// Inserts or overwrites a property
    pub fn set_property(&mut self, name: Option<&str>, value: impl Into<String>) -> Result<()> {
        match name {
            Some(name) if !name.is_empty() => {
                self.properties.insert(name.to_string(), value.into());
                Ok(())
            }
            _ => Err(PackageError::MissingPropertyName { node: self.label() }),
        }
    }

    pub fn label(&self) -> NodeLabel {
        NodeLabel {
            tag: self.tag.clone(),
            name: self.name.clone(),
            id: self.id.clone(),
        }
    }

    /// Name for display, with a stand-in when the node has none
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("(unnamed {})", self.tag),
        }
    }
}

/// Arena of every node in one package plus its identifier registry
///
/// Ownership lives in the arena and the ordered child lists; `parent` links
/// are plain handles.
#[derive(Debug, Clone)]
pub struct PackageGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) registry: IdRegistry,
}

impl PackageGraph {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves an identifier through the registry
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.registry.lookup(id)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).children.iter().copied()
    }

    /// First direct child of the given kind
    pub fn child_by_kind(&self, id: NodeId, kind: &NodeKind) -> Option<NodeId> {
        self.children(id).find(|&c| self.node(c).kind == *kind)
    }

    /// First direct child of the given kind whose attribute equals `value`
    pub fn child_by_kind_and_attribute(
        &self,
        id: NodeId,
        kind: &NodeKind,
        attr: &str,
        value: &str,
    ) -> Option<NodeId> {
        self.children(id).find(|&c| {
            let child = self.node(c);
            child.kind == *kind && child.attribute(attr) == Some(value)
        })
    }

    /// First direct child with the given tag
    pub fn child_by_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children(id).find(|&c| self.node(c).tag == tag)
    }

    /// Members of a container: direct children of `kind` followed by the
    /// children of any plural wrapper for that kind, in document order
    pub fn members(&self, id: NodeId, kind: &NodeKind) -> Vec<NodeId> {
        let mut members = Vec::new();
        for child in self.children(id) {
            match &self.node(child).kind {
                k if k == kind => members.push(child),
                NodeKind::Collection(inner) if **inner == *kind => {
                    members.extend(self.children(child).filter(|&c| self.node(c).kind == *kind));
                }
                _ => {}
            }
        }
        members
    }

    /// Nearest ancestor (excluding the node itself) of the given kind
    pub fn ancestor_by_kind(&self, id: NodeId, kind: &NodeKind) -> Option<NodeId> {
        let mut current = self.node(id).parent;
        while let Some(p) = current {
            if self.node(p).kind == *kind {
                return Some(p);
            }
            current = self.node(p).parent;
        }
        None
    }

    /// Depth-first iterator over a node and all of its descendants
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next).children.iter().rev().copied());
        }
        out
    }
}
