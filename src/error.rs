//! Diagnostics raised while ingesting and documenting a package
//!
//! Fatal conditions are [`PackageError`] values and abort the current
//! operation. Recoverable conditions are [`Warning`] values collected in a
//! [`Diagnostics`] list that travels next to the generated output.

use std::fmt;
use thiserror::Error;

/// Human-readable identity of a node used in diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLabel {
    pub tag: String,
    pub name: Option<String>,
    pub id: Option<String>,
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.tag)?;
        if let Some(name) = &self.name {
            write!(f, " '{}'", name)?;
        }
        if let Some(id) = &self.id {
            write!(f, " {}", id)?;
        }
        Ok(())
    }
}

/// Result type for operations that can hit a fatal package condition
pub type Result<T> = std::result::Result<T, PackageError>;

/// Conditions that mean the package breaks a structural assumption
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    #[error("duplicate identifier {id} on {node} (already declared by {previous})")]
    DuplicateIdentifier {
        id: String,
        node: NodeLabel,
        previous: NodeLabel,
    },

    #[error("property without a name on {node}")]
    MissingPropertyName { node: NodeLabel },

    #[error("variable {node} has no value holder")]
    MissingValueHolder { node: NodeLabel },

    #[error("variable {node} has unrecognized data type code '{code}'")]
    UnrecognizedType { node: NodeLabel, code: String },

    #[error("malformed precedence constraint {node}: {reason}")]
    MalformedConstraint { node: NodeLabel, reason: String },
}

/// Conditions that are absorbed locally without stopping the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Child content ingestion does not know what to do with
    UnrecognizedContent { parent: NodeLabel, description: String },
    /// A reference whose target is not registered
    DanglingReference { from: NodeLabel, reference: String },
    /// A connection without a locatable connection string
    ConnectionStringNotFound { connection: NodeLabel },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnrecognizedContent { parent, description } => {
                write!(f, "skipped {} inside {}", description, parent)
            }
            Warning::DanglingReference { from, reference } => {
                write!(f, "{} references unknown object {}", from, reference)
            }
            Warning::ConnectionStringNotFound { connection } => {
                write!(f, "no connection string found for {}", connection)
            }
        }
    }
}

/// Collected recoverable conditions
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}
