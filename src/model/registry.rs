//! Identifier registry scoped to one package parse
//!
//! Identifiers are GUID text. Keys are normalised so that surrounding braces
//! and letter case do not matter. A second index holds the ref-paths
//! (`Package\Sequence\Task`) that attribute-centric packages use for
//! cross-references.

use crate::model::node::NodeId;
use std::collections::HashMap;
use thiserror::Error;

/// Registration of an identifier that is already taken
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identifier {id} is already registered")]
pub struct DuplicateId {
    pub id: String,
    pub existing: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    ids: HashMap<String, NodeId>,
    paths: HashMap<String, NodeId>,
}

/// Canonical registry key for an identifier
pub fn normalize_id(id: &str) -> String {
    id.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .to_ascii_uppercase()
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` for `node`; the first registration wins
    pub fn register(&mut self, id: &str, node: NodeId) -> Result<(), DuplicateId> {
        let key = normalize_id(id);
        if let Some(&existing) = self.ids.get(&key) {
            return Err(DuplicateId {
                id: id.to_string(),
                existing,
            });
        }
        self.ids.insert(key, node);
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.ids.get(&normalize_id(id)).copied()
    }

    /// Registers a ref-path; paths are matched exactly and a repeated path
    /// keeps its first owner
    pub fn register_path(&mut self, path: &str, node: NodeId) {
        self.paths.entry(path.to_string()).or_insert(node);
    }

    pub fn lookup_path(&self, path: &str) -> Option<NodeId> {
        self.paths.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = IdRegistry::new();
        registry.register("{AB-12}", NodeId(3)).unwrap();
        assert_eq!(registry.lookup("{AB-12}"), Some(NodeId(3)));
        assert_eq!(registry.lookup("ab-12"), Some(NodeId(3)));
        assert_eq!(registry.lookup("{CD-34}"), None);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = IdRegistry::new();
        registry.register("{AB-12}", NodeId(1)).unwrap();
        let err = registry.register("{ab-12}", NodeId(2)).unwrap_err();
        assert_eq!(err.existing, NodeId(1));
        assert_eq!(registry.lookup("{AB-12}"), Some(NodeId(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_paths_are_separate_from_ids() {
        let mut registry = IdRegistry::new();
        registry.register_path("Package\\Load", NodeId(4));
        registry.register_path("Package\\Load", NodeId(5));
        assert_eq!(registry.lookup_path("Package\\Load"), Some(NodeId(4)));
        assert_eq!(registry.lookup("Package\\Load"), None);
    }
}
