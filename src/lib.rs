//! Describes legacy ETL packages (`.dtsx`) as structured documentation
//!
//! The pipeline is: [`parse_xml`] reads the file into an element tree,
//! [`model::ingest`] turns that into a node arena with an identifier registry,
//! and [`doc::document_package`] walks the arena to produce markdown.
//!
//! # Example
//! ```ignore
//! let (graph, _) = ssis_doc::load_package("tests/load_customers.dtsx")?;
//! let doc = ssis_doc::document_package(&graph)?;
//! println!("{}", doc.markdown);
//! ```

pub mod config_writer;
pub mod doc;
pub mod error;
pub mod model;
pub mod parse_xml;
pub mod summary;

use anyhow::Context;
use std::path::Path;

pub use config_writer::{write_connections, write_connections_to_file};
pub use doc::{document_package, PackageDocument};
pub use error::{Diagnostics, NodeLabel, PackageError, Warning};
pub use model::{ingest, Node, NodeId, NodeKind, PackageGraph};
pub use parse_xml::{parse_xml_file, parse_xml_str, XmlContent, XmlElement};
pub use summary::{build_summary, summary_to_json, PackageSummary};

/// Reads and ingests a package file in one pass
pub fn load_package<P: AsRef<Path>>(path: P) -> anyhow::Result<(PackageGraph, Diagnostics)> {
    let path = path.as_ref();
    let root = parse_xml_file(path)?;
    let loaded = ingest(&root).with_context(|| format!("Failed to read package {}", path.display()))?;
    Ok(loaded)
}

/// Ingests a package held in memory
pub fn load_package_str(text: &str) -> anyhow::Result<(PackageGraph, Diagnostics)> {
    let root = parse_xml_str(text)?;
    Ok(ingest(&root)?)
}
