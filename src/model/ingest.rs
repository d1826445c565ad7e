//! Tree ingestion: turns a parsed XML element tree into a [`PackageGraph`]
//!
//! Property elements are folded into their parent's property map; every other
//! element becomes a node. Identifiers are registered as soon as a node is
//! allocated, before its own children are read.

use crate::error::{Diagnostics, PackageError, Result, Warning};
use crate::model::node::{Node, NodeId, NodeKind, PackageGraph};
use crate::model::registry::IdRegistry;
use crate::parse_xml::{XmlContent, XmlElement};
use tracing::debug;

const ID_PROPERTY: &str = "DTSID";
const ID_ATTRIBUTE: &str = "DTS:DTSID";
const NAME_PROPERTY: &str = "ObjectName";
const NAME_ATTRIBUTE: &str = "DTS:ObjectName";
const REF_PATH_ATTRIBUTE: &str = "DTS:refId";

/// Builds the node graph for one package
///
/// Returns the graph together with the recoverable conditions met on the way.
pub fn ingest(root: &XmlElement) -> Result<(PackageGraph, Diagnostics)> {
    let mut ingestor = Ingestor {
        nodes: Vec::new(),
        registry: IdRegistry::new(),
        diagnostics: Diagnostics::new(),
    };
    let root_id = ingestor.ingest_element(root, None)?;

    debug!(
        "Ingested {} nodes, {} identifiers",
        ingestor.nodes.len(),
        ingestor.registry.len()
    );

    let graph = PackageGraph {
        nodes: ingestor.nodes,
        root: root_id,
        registry: ingestor.registry,
    };
    Ok((graph, ingestor.diagnostics))
}

struct Ingestor {
    nodes: Vec<Node>,
    registry: IdRegistry,
    diagnostics: Diagnostics,
}

impl Ingestor {
    fn ingest_element(&mut self, el: &XmlElement, parent: Option<NodeId>) -> Result<NodeId> {
        let mut node = Node::new(el.name.as_str());
        node.attributes = el.attributes.clone();
        node.parent = parent;
        node.id = declared_id(el).filter(|id| !id.trim().is_empty());
        node.name = declared_name(el);

        let handle = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.register(handle)?;

        for child in &el.children {
            match child {
                XmlContent::Element(child_el) if NodeKind::from_tag(&child_el.name).is_property() => {
                    let name = property_name(child_el);
                    self.nodes[handle.0].set_property(name, child_el.inner_text())?;
                }
                XmlContent::Element(child_el) => {
                    let child_id = self.ingest_element(child_el, Some(handle))?;
                    self.nodes[handle.0].children.push(child_id);
                }
                XmlContent::Text(text) | XmlContent::CData(text) => {
                    self.nodes[handle.0]
                        .content
                        .get_or_insert_with(String::new)
                        .push_str(text);
                }
                XmlContent::Comment(_) => self.skip(handle, "comment"),
                XmlContent::ProcessingInstruction(_) => self.skip(handle, "processing instruction"),
            }
        }

        Ok(handle)
    }

    fn register(&mut self, handle: NodeId) -> Result<()> {
        let node = &self.nodes[handle.0];
        if let Some(id) = node.id.as_deref() {
            if let Err(dup) = self.registry.register(id, handle) {
                return Err(PackageError::DuplicateIdentifier {
                    id: dup.id,
                    node: node.label(),
                    previous: self.nodes[dup.existing.0].label(),
                });
            }
        }
        if let Some(path) = node.attribute(REF_PATH_ATTRIBUTE) {
            self.registry.register_path(path, handle);
        }
        Ok(())
    }

    fn skip(&mut self, parent: NodeId, description: &str) {
        self.diagnostics.warn(Warning::UnrecognizedContent {
            parent: self.nodes[parent.0].label(),
            description: description.to_string(),
        });
    }
}

/// The `Name` attribute of a property element, matched case-insensitively
/// on its local part
fn property_name(el: &XmlElement) -> Option<&str> {
    el.attributes
        .iter()
        .find(|(key, _)| {
            let local = key.rsplit(':').next().unwrap_or(key);
            local.eq_ignore_ascii_case("name")
        })
        .map(|(_, value)| value.as_str())
}

/// Last direct property child called `name`
fn property_child(el: &XmlElement, name: &str) -> Option<String> {
    el.elements()
        .filter(|child| NodeKind::from_tag(&child.name).is_property())
        .filter(|child| property_name(child) == Some(name))
        .last()
        .map(XmlElement::inner_text)
}

fn attribute_ignore_case<'a>(el: &'a XmlElement, key: &str) -> Option<&'a str> {
    el.attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, value)| value.as_str())
}

/// Identifier an element declares, either as an attribute or as a direct
/// `DTSID` property (last one wins, like any repeated property)
fn declared_id(el: &XmlElement) -> Option<String> {
    attribute_ignore_case(el, ID_ATTRIBUTE)
        .map(str::to_string)
        .or_else(|| property_child(el, ID_PROPERTY))
}

/// Name an element declares; the `ObjectName` property shadows the
/// attribute, matching [`Node::setting`]
fn declared_name(el: &XmlElement) -> Option<String> {
    property_child(el, NAME_PROPERTY).or_else(|| attribute_ignore_case(el, NAME_ATTRIBUTE).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_xml::parse_xml_str;

    fn ingest_str(xml: &str) -> Result<(PackageGraph, Diagnostics)> {
        ingest(&parse_xml_str(xml).expect("Failed to parse XML"))
    }

    #[test]
    fn test_properties_fold_into_parent() {
        let (graph, diags) = ingest_str(
            r#"<DTS:Executable DTS:ExecutableType="MSDTS.Package.1" Extra="x">
                <DTS:Property DTS:Name="ObjectName">Pkg</DTS:Property>
                <DTS:Property DTS:Name="DTSID">{0001}</DTS:Property>
                <DTS:PropertyExpression DTS:Name="Description">"a" + "b"</DTS:PropertyExpression>
            </DTS:Executable>"#,
        )
        .unwrap();

        let root = graph.node(graph.root());
        assert_eq!(root.name(), Some("Pkg"));
        assert_eq!(root.id(), Some("{0001}"));
        assert_eq!(root.property("Description"), Some("\"a\" + \"b\""));
        assert_eq!(root.attribute("Extra"), Some("x"));
        assert!(root.children().is_empty());
        assert_eq!(graph.lookup("{0001}"), Some(graph.root()));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_repeated_property_last_write_wins() {
        let (graph, _) = ingest_str(
            r#"<DTS:Variable>
                <DTS:Property DTS:Name="Expression">first</DTS:Property>
                <DTS:PropertyExpression dts:name="Expression">second</DTS:PropertyExpression>
            </DTS:Variable>"#,
        )
        .unwrap();
        assert_eq!(graph.node(graph.root()).property("Expression"), Some("second"));
    }

    #[test]
    fn test_property_without_name_is_fatal() {
        let err = ingest_str(r#"<DTS:Variable><DTS:Property>orphan</DTS:Property></DTS:Variable>"#)
            .unwrap_err();
        assert!(matches!(err, PackageError::MissingPropertyName { .. }));
    }

    #[test]
    fn test_children_keep_document_order_and_parent() {
        let (graph, _) = ingest_str(
            r#"<DTS:Executable>
                <DTS:Executable DTS:ObjectName="A"/>
                <DTS:Variable DTS:ObjectName="V"/>
                <DTS:Executable DTS:ObjectName="B"/>
            </DTS:Executable>"#,
        )
        .unwrap();
        let root = graph.root();
        let names: Vec<_> = graph
            .children(root)
            .map(|c| graph.node(c).name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["A", "V", "B"]);
        for child in graph.children(root) {
            assert_eq!(graph.node(child).parent(), Some(root));
        }
    }

    #[test]
    fn test_duplicate_identifier_is_fatal() {
        let err = ingest_str(
            r#"<DTS:Executable>
                <DTS:Executable DTS:DTSID="{AAAA}" DTS:ObjectName="A"/>
                <DTS:Executable DTS:DTSID="{aaaa}" DTS:ObjectName="B"/>
            </DTS:Executable>"#,
        )
        .unwrap_err();
        match err {
            PackageError::DuplicateIdentifier { node, previous, .. } => {
                assert_eq!(node.name.as_deref(), Some("B"));
                assert_eq!(previous.name.as_deref(), Some("A"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_identifier_names_both_nodes_in_property_layout() {
        let err = ingest_str(
            r#"<DTS:Executable>
                <DTS:Executable>
                    <DTS:Property DTS:Name="DTSID">{A}</DTS:Property>
                    <DTS:Property DTS:Name="ObjectName">First</DTS:Property>
                </DTS:Executable>
                <DTS:Executable>
                    <DTS:Property DTS:Name="DTSID">{A}</DTS:Property>
                    <DTS:Property DTS:Name="ObjectName">Second</DTS:Property>
                </DTS:Executable>
            </DTS:Executable>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'Second'"), "message: {err}");
        match err {
            PackageError::DuplicateIdentifier { node, previous, .. } => {
                assert_eq!(node.name.as_deref(), Some("Second"));
                assert_eq!(previous.name.as_deref(), Some("First"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_property_name_reports_owner() {
        let err = ingest_str(
            r#"<DTS:Variable DTS:ObjectName="Rows"><DTS:Property>orphan</DTS:Property></DTS:Variable>"#,
        )
        .unwrap_err();
        match err {
            PackageError::MissingPropertyName { node } => assert_eq!(node.name.as_deref(), Some("Rows")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_padded_text_survives_ingestion() {
        let (graph, _) = ingest_str(
            r#"<DTS:Variable>
                <DTS:VariableValue DTS:DataType="8">  padded  </DTS:VariableValue>
                <DTS:Property DTS:Name="Expression">  x  </DTS:Property>
            </DTS:Variable>"#,
        )
        .unwrap();
        let root = graph.root();
        let value = graph.child_by_kind(root, &NodeKind::VariableValue).unwrap();
        assert_eq!(graph.node(value).content(), Some("  padded  "));
        assert_eq!(graph.node(root).property("Expression"), Some("  x  "));
    }

    #[test]
    fn test_text_and_cdata_become_content() {
        let (graph, _) = ingest_str(
            r#"<DTS:Variable><DTS:VariableValue DTS:DataType="8"><![CDATA[a<b]]></DTS:VariableValue></DTS:Variable>"#,
        )
        .unwrap();
        let value = graph
            .child_by_kind(graph.root(), &NodeKind::VariableValue)
            .unwrap();
        assert_eq!(graph.node(value).content(), Some("a<b"));
    }

    #[test]
    fn test_comments_are_skipped_with_warning() {
        let (graph, diags) = ingest_str(
            r#"<DTS:Executable><!-- hi --><DTS:Executable DTS:ObjectName="A"/></DTS:Executable>"#,
        )
        .unwrap();
        assert_eq!(graph.node(graph.root()).children().len(), 1);
        assert_eq!(diags.warnings().len(), 1);
        assert!(matches!(
            diags.warnings()[0],
            Warning::UnrecognizedContent { .. }
        ));
    }

    #[test]
    fn test_ref_paths_are_registered() {
        let (graph, _) = ingest_str(
            r#"<DTS:Executable DTS:refId="Package">
                <DTS:Executables>
                    <DTS:Executable DTS:refId="Package\Load" DTS:ObjectName="Load"/>
                </DTS:Executables>
            </DTS:Executable>"#,
        )
        .unwrap();
        let load = graph.registry().lookup_path("Package\\Load").unwrap();
        assert_eq!(graph.node(load).name(), Some("Load"));
        assert_eq!(graph.registry().lookup_path("Package"), Some(graph.root()));
    }
}
