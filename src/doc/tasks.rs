//! Executable classification and per-task statements

use crate::doc::connections::connection_name;
use crate::doc::types::ProgramVariable;
use crate::error::{Diagnostics, Warning};
use crate::model::{Node, NodeId, NodeKind, PackageGraph};

/// What an executable does, from its `ExecutableType`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    Package,
    Sequence,
    ForLoop,
    ForEachLoop,
    DataFlow,
    ExecuteSql,
    Script,
    SendMail,
    FileSystem,
    ExecutePackage,
    Other(String),
}

impl TaskKind {
    pub fn from_executable_type(executable_type: &str) -> Self {
        let upper = executable_type.to_ascii_uppercase();
        let stock = |name: &str| upper == format!("STOCK:{}", name) || upper.starts_with(&format!("MICROSOFT.{}", name));

        if upper.starts_with("MSDTS.PACKAGE") || upper.starts_with("SSIS.PACKAGE") || stock("PACKAGE") {
            TaskKind::Package
        } else if stock("SEQUENCE") {
            TaskKind::Sequence
        } else if stock("FORLOOP") {
            TaskKind::ForLoop
        } else if stock("FOREACHLOOP") {
            TaskKind::ForEachLoop
        } else if upper.contains("PIPELINE") {
            TaskKind::DataFlow
        } else if upper.contains("EXECUTESQLTASK") {
            TaskKind::ExecuteSql
        } else if upper.contains("SCRIPTTASK") {
            TaskKind::Script
        } else if upper.contains("SENDMAILTASK") {
            TaskKind::SendMail
        } else if upper.contains("FILESYSTEMTASK") {
            TaskKind::FileSystem
        } else if upper.contains("EXECUTEPACKAGETASK") {
            TaskKind::ExecutePackage
        } else {
            TaskKind::Other(executable_type.to_string())
        }
    }

    pub fn of(node: &Node) -> Self {
        Self::from_executable_type(node.setting("ExecutableType").unwrap_or_default())
    }

    pub fn label(&self) -> &str {
        match self {
            TaskKind::Package => "Package",
            TaskKind::Sequence => "Sequence Container",
            TaskKind::ForLoop => "For Loop Container",
            TaskKind::ForEachLoop => "Foreach Loop Container",
            TaskKind::DataFlow => "Data Flow Task",
            TaskKind::ExecuteSql => "Execute SQL Task",
            TaskKind::Script => "Script Task",
            TaskKind::SendMail => "Send Mail Task",
            TaskKind::FileSystem => "File System Task",
            TaskKind::ExecutePackage => "Execute Package Task",
            TaskKind::Other(raw) if raw.is_empty() => "Executable",
            TaskKind::Other(raw) => raw,
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First element under the executable's object data whose tag ends with `suffix`
fn task_data(graph: &PackageGraph, exe: NodeId, suffix: &str) -> Option<NodeId> {
    let data = graph.child_by_kind(exe, &NodeKind::ObjectData)?;
    graph
        .descendants(data)
        .into_iter()
        .find(|&d| graph.node(d).tag().ends_with(suffix))
}

/// Header line for loop containers
pub fn loop_header(graph: &PackageGraph, exe: NodeId) -> Option<String> {
    let node = graph.node(exe);
    match TaskKind::of(node) {
        TaskKind::ForLoop => Some(format!(
            "FOR ({}; {}; {})",
            node.setting("InitExpression").unwrap_or_default(),
            node.setting("EvalExpression").unwrap_or_default(),
            node.setting("AssignExpression").unwrap_or_default(),
        )),
        TaskKind::ForEachLoop => {
            let enumerator = graph
                .child_by_tag(exe, "DTS:ForEachEnumerator")
                .map(|e| graph.node(e))
                .and_then(|e| e.setting("CreationName").or(e.name()))
                .unwrap_or("enumerator");
            let mappings: Vec<&str> = graph
                .descendants(exe)
                .into_iter()
                .map(|d| graph.node(d))
                .filter(|d| d.tag() == "DTS:ForEachVariableMapping")
                .filter_map(|d| d.setting("VariableName"))
                .collect();
            if mappings.is_empty() {
                Some(format!("FOREACH item IN {}", enumerator))
            } else {
                Some(format!("FOREACH ({}) IN {}", mappings.join(", "), enumerator))
            }
        }
        _ => None,
    }
}

/// One-line statement describing what a leaf executable does
pub fn leaf_statement(graph: &PackageGraph, exe: NodeId, diagnostics: &mut Diagnostics) -> String {
    let node = graph.node(exe);
    let kind = TaskKind::of(node);
    match kind {
        TaskKind::ExecuteSql => {
            let data = task_data(graph, exe, "SqlTaskData").map(|d| graph.node(d));
            let connection = data
                .and_then(|d| d.attribute("SQLTask:Connection"))
                .map(|id| resolve_connection(graph, exe, id, diagnostics))
                .unwrap_or_else(|| "(no connection)".to_string());
            let sql = data
                .and_then(|d| d.attribute("SQLTask:SqlStatementSource"))
                .map(collapse_whitespace)
                .unwrap_or_default();
            if sql.is_empty() {
                format!("Execute SQL on **{}**", connection)
            } else {
                format!("Execute SQL on **{}**: `{}`", connection, sql)
            }
        }
        TaskKind::DataFlow => {
            let components: Vec<&str> = graph
                .child_by_kind(exe, &NodeKind::ObjectData)
                .map(|data| graph.descendants(data))
                .unwrap_or_default()
                .into_iter()
                .map(|d| graph.node(d))
                .filter(|d| d.tag() == "component")
                .filter_map(|d| d.attribute("name"))
                .collect();
            if components.is_empty() {
                "Run data flow".to_string()
            } else {
                format!("Run data flow with components: {}", components.join(", "))
            }
        }
        TaskKind::SendMail => {
            let data = task_data(graph, exe, "SendMailTaskData").map(|d| graph.node(d));
            let to = data.and_then(|d| d.attribute("SendMailTask:To")).unwrap_or_default();
            let subject = data.and_then(|d| d.attribute("SendMailTask:Subject")).unwrap_or_default();
            format!("Send mail to {} with subject \"{}\"", to, subject)
        }
        TaskKind::FileSystem => {
            let operation = task_data(graph, exe, "FileSystemData")
                .and_then(|d| graph.node(d).attribute("TaskOperationType"))
                .unwrap_or("operation");
            format!("File system {}", operation)
        }
        TaskKind::ExecutePackage => {
            let package = task_data(graph, exe, "PackageName")
                .and_then(|d| graph.node(d).content())
                .map(str::to_string)
                .or_else(|| {
                    task_data(graph, exe, "ExecutePackageTask")
                        .and_then(|d| graph.node(d).attribute("PackageName").map(str::to_string))
                })
                .unwrap_or_else(|| "(unknown package)".to_string());
            format!("Execute package {}", package)
        }
        TaskKind::Package | TaskKind::Sequence | TaskKind::ForLoop | TaskKind::ForEachLoop => {
            format!("Run empty {}", kind.label())
        }
        TaskKind::Script | TaskKind::Other(_) => format!("Run {}", kind.label()),
    }
}

fn resolve_connection(graph: &PackageGraph, exe: NodeId, id: &str, diagnostics: &mut Diagnostics) -> String {
    match connection_name(graph, id) {
        Some(name) => name.to_string(),
        None => {
            diagnostics.warn(Warning::DanglingReference {
                from: graph.node(exe).label(),
                reference: id.to_string(),
            });
            format!("<unresolved {}>", id)
        }
    }
}

/// Visible variables an executable mentions in its own settings or task data
///
/// Nested executables are not searched; they report their own references.
pub fn referenced_variables(graph: &PackageGraph, exe: NodeId, visible: &[ProgramVariable]) -> Vec<String> {
    let mut text = String::new();
    let mut stack = vec![exe];
    while let Some(next) = stack.pop() {
        let node = graph.node(next);
        for value in node.attributes().values().chain(node.properties().values()) {
            text.push_str(value);
            text.push('\n');
        }
        if let Some(content) = node.content() {
            text.push_str(content);
            text.push('\n');
        }
        stack.extend(graph.children(next).filter(|&c| !is_nested_executable(graph.node(c))));
    }

    let mut names: Vec<String> = Vec::new();
    for var in visible {
        let qualified = var.qualified_name();
        if text.contains(&qualified) && !names.contains(&qualified) {
            names.push(qualified);
        }
    }
    names
}

fn is_nested_executable(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Executable => true,
        NodeKind::Collection(inner) => **inner == NodeKind::Executable,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_executable_types() {
        assert_eq!(TaskKind::from_executable_type("MSDTS.Package.1"), TaskKind::Package);
        assert_eq!(TaskKind::from_executable_type("STOCK:SEQUENCE"), TaskKind::Sequence);
        assert_eq!(TaskKind::from_executable_type("Microsoft.ForEachLoop"), TaskKind::ForEachLoop);
        assert_eq!(TaskKind::from_executable_type("STOCK:FORLOOP"), TaskKind::ForLoop);
        assert_eq!(TaskKind::from_executable_type("SSIS.Pipeline.2"), TaskKind::DataFlow);
        assert_eq!(
            TaskKind::from_executable_type(
                "Microsoft.SqlServer.Dts.Tasks.ExecuteSQLTask.ExecuteSQLTask, Microsoft.SqlServer.SQLTask"
            ),
            TaskKind::ExecuteSql
        );
        assert_eq!(
            TaskKind::from_executable_type("Vendor.Custom"),
            TaskKind::Other("Vendor.Custom".to_string())
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("SELECT *\n  FROM t\tWHERE 1=1"), "SELECT * FROM t WHERE 1=1");
    }
}
