//! Variable type mapping
//!
//! Maps the package format's data type codes to program types and turns raw
//! default values into literals of that type.

use crate::error::{PackageError, Result};
use crate::model::{NodeId, NodeKind, PackageGraph};
use serde::Serialize;
use std::fmt;

const DATA_TYPE_ATTRIBUTE: &str = "DTS:DataType";

/// Literal emitted for result-set variables whatever their stored value
pub const EMPTY_TABLE_LITERAL: &str = "new DataTable()";

/// Program type a variable maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetType {
    Int16,
    Int32,
    DateTime,
    String,
    Boolean,
    DataTable,
    Int64,
}

impl TargetType {
    /// Type for a data type code, `None` when the code is unknown
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "2" => Some(TargetType::Int16),
            "3" => Some(TargetType::Int32),
            "7" => Some(TargetType::DateTime),
            "8" => Some(TargetType::String),
            "11" => Some(TargetType::Boolean),
            "13" => Some(TargetType::DataTable),
            "20" => Some(TargetType::Int64),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            TargetType::Int16 => "short",
            TargetType::Int32 => "int",
            TargetType::DateTime => "DateTime",
            TargetType::String => "string",
            TargetType::Boolean => "bool",
            TargetType::DataTable => "DataTable",
            TargetType::Int64 => "long",
        }
    }

    /// Literal for a raw stored value
    pub fn default_literal(self, raw: &str) -> String {
        match self {
            TargetType::Int16 | TargetType::Int32 | TargetType::Int64 => raw.to_string(),
            TargetType::DateTime if raw.is_empty() => String::new(),
            TargetType::DateTime => format!("DateTime.Parse(\"{}\")", raw),
            TargetType::String if raw.is_empty() => String::new(),
            TargetType::String => escape_string_literal(raw),
            TargetType::Boolean if raw == "1" => "true".to_string(),
            TargetType::Boolean => "false".to_string(),
            TargetType::DataTable => EMPTY_TABLE_LITERAL.to_string(),
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Quotes a string, escaping backslashes and double quotes
pub fn escape_string_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Maps a type code and raw value, failing on an unknown code
pub fn map_type(graph: &PackageGraph, variable: NodeId, code: &str, raw: &str) -> Result<(TargetType, String)> {
    let target = TargetType::from_code(code).ok_or_else(|| PackageError::UnrecognizedType {
        node: graph.node(variable).label(),
        code: code.to_string(),
    })?;
    Ok((target, target.default_literal(raw)))
}

/// Flag properties are stored as `-1`/`0` (or occasionally `1`/`True`)
fn parse_flag(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some(v) if v == "-1" || v == "1" || v.eq_ignore_ascii_case("true"))
}

/// `IncludeInDebugDump` uses its own magic numbers
fn parse_debug_dump(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some("6789") | None => true,
        Some("2345") => false,
        other => parse_flag(other),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Declaration view of a variable, built on demand for output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramVariable {
    pub name: String,
    pub namespace: Option<String>,
    pub dts_type: String,
    pub target_type: TargetType,
    pub default_value: String,
    pub is_global: bool,
    pub expression: Option<String>,
    pub evaluate_as_expression: bool,
    pub description: Option<String>,
    pub read_only: bool,
    pub raise_changed_event: bool,
    pub include_in_debug_dump: bool,
    pub dts_id: Option<String>,
    pub creation_name: Option<String>,
}

impl ProgramVariable {
    pub fn from_node(graph: &PackageGraph, variable: NodeId, as_global: bool) -> Result<Self> {
        let node = graph.node(variable);
        let holder = graph
            .child_by_kind(variable, &NodeKind::VariableValue)
            .map(|h| graph.node(h))
            .ok_or_else(|| PackageError::MissingValueHolder { node: node.label() })?;

        let dts_type = holder.attribute(DATA_TYPE_ATTRIBUTE).unwrap_or_default().to_string();
        let raw = holder.content().unwrap_or_default();
        let (target_type, default_value) = map_type(graph, variable, &dts_type, raw)?;

        Ok(Self {
            name: node.display_name(),
            namespace: non_empty(node.setting("Namespace")),
            dts_type,
            target_type,
            default_value,
            is_global: as_global,
            expression: non_empty(node.setting("Expression")),
            evaluate_as_expression: parse_flag(node.setting("EvaluateAsExpression")),
            description: node.description().map(str::to_string),
            read_only: parse_flag(node.setting("ReadOnly")),
            raise_changed_event: parse_flag(node.setting("RaiseChangedEvent")),
            include_in_debug_dump: parse_debug_dump(node.setting("IncludeInDebugDump")),
            dts_id: node.id().map(str::to_string),
            creation_name: non_empty(node.setting("CreationName")),
        })
    }

    /// `Namespace::Name`, or the bare name when there is no namespace
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}::{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Single-line declaration, without list marker or indentation
    pub fn declaration(&self) -> String {
        let scope = if self.is_global { "global" } else { "local" };
        let mut line = format!("{} `{}` **{}**", scope, self.target_type, self.qualified_name());
        if !self.default_value.is_empty() {
            line.push_str(&format!(" = `{}`", self.default_value));
        }

        let mut notes = Vec::new();
        if self.read_only {
            notes.push("read-only".to_string());
        }
        if self.raise_changed_event {
            notes.push("raises change events".to_string());
        }
        if !self.include_in_debug_dump {
            notes.push("excluded from debug dump".to_string());
        }
        if let Some(expr) = &self.expression {
            let label = if self.evaluate_as_expression { "evaluated expression" } else { "expression" };
            notes.push(format!("{}: `{}`", label, expr));
        }
        if let Some(desc) = &self.description {
            notes.push(format!("description: {}", desc));
        }
        if !notes.is_empty() {
            line.push_str(&format!(" ({})", notes.join("; ")));
        }
        line
    }
}
