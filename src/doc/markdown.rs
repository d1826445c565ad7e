//! Section markers used in the generated document
//!
//! The output is handed to an external markdown renderer, so every block
//! goes through these helpers to keep the markers consistent.

pub fn header(text: &str) -> String {
    format!("# {}", text)
}

pub fn sub_header(text: &str) -> String {
    format!("## {}", text)
}

/// A list item at the given indentation prefix
pub fn list_item(indent: &str, text: &str) -> String {
    format!("{}* {}", indent, text)
}

pub fn bold(text: &str) -> String {
    format!("**{}**", text)
}

pub const RULE: &str = "***";

/// Two-column Name/Value table
pub fn table(rows: &[(&str, &str)]) -> String {
    let mut out = String::new();
    out.push_str("| Name | Value |\n");
    out.push_str("| --- | --- |\n");
    for (name, value) in rows {
        out.push_str(&format!("| {} | {} |\n", escape_cell(name), escape_cell(value)));
    }
    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers() {
        assert_eq!(header("Pkg.dtsx"), "# Pkg.dtsx");
        assert_eq!(sub_header("Variables"), "## Variables");
        assert_eq!(list_item("\t", "x"), "\t* x");
    }

    #[test]
    fn test_table_rows_and_escaping() {
        let t = table(&[("Connection String", "a|b"), ("DtsId", "{1}")]);
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "| Connection String | a\\|b |");
        assert_eq!(lines[3], "| DtsId | {1} |");
    }
}
