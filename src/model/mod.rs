//! Generic package object model
//!
//! # Submodules
//! - `node` - Node type, node kinds and the arena that owns them
//! - `registry` - Identifier registry scoped to one parse run
//! - `ingest` - Conversion of the parsed XML tree into the node arena

mod ingest;
mod node;
mod registry;

pub use ingest::ingest;
pub use node::{Node, NodeId, NodeKind, PackageGraph};
pub use registry::{normalize_id, DuplicateId, IdRegistry};
