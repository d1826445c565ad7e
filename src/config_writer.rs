//! Configuration writer: stores connection strings as app.config settings
//!
//! Each connection becomes one `<add key="..." value="..." />` line inside
//! `<appSettings>`. Connections whose string could not be located are written
//! with the `Not Found` sentinel instead of being left out.

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes the settings document to any writer
pub fn write_connections<W: Write>(connections: &[(String, String)], writer: &mut W) -> io::Result<()> {
    writer.write_all(b"<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n")?;
    writer.write_all(b"<configuration>\n")?;
    writer.write_all(b"  <appSettings>\n")?;
    for (name, value) in connections {
        writer.write_all(b"    <add key=\"")?;
        write_escaped_attr(writer, name)?;
        writer.write_all(b"\" value=\"")?;
        write_escaped_attr(writer, value)?;
        writer.write_all(b"\" />\n")?;
    }
    writer.write_all(b"  </appSettings>\n")?;
    writer.write_all(b"</configuration>\n")?;
    Ok(())
}

/// Writes the settings document to a file on disk
pub fn write_connections_to_file<P: AsRef<Path>>(connections: &[(String, String)], file_path: P) -> Result<()> {
    let file = File::create(&file_path).context("Failed to create config file")?;
    let mut writer = BufWriter::new(file);
    write_connections(connections, &mut writer).context("Failed to write connection settings")?;
    writer.flush().context("Failed to flush config writer")?;
    Ok(())
}

/// Attribute values go through quick-xml's escaper (`&`, `<`, `>`, quotes)
fn write_escaped_attr<W: Write>(writer: &mut W, input: &str) -> io::Result<()> {
    writer.write_all(escape(input).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    fn render(connections: &[(String, String)]) -> String {
        let mut buffer = Vec::new();
        write_connections(connections, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_one_line_per_connection() {
        let connections = vec![entry("Warehouse", "Server=.;"), entry("Mail", "Not Found")];

        let xml = render(&connections);
        assert!(xml.contains("    <add key=\"Warehouse\" value=\"Server=.;\" />\n"));
        assert!(xml.contains("    <add key=\"Mail\" value=\"Not Found\" />\n"));
        assert!(xml.ends_with("  </appSettings>\n</configuration>\n"));
        assert!(xml.find("Warehouse").unwrap() < xml.find("Mail").unwrap());
    }

    #[test]
    fn test_repeated_names_are_all_written() {
        let connections = vec![entry("Mail", "smtp://a"), entry("Mail", "smtp://b")];
        let xml = render(&connections);
        assert_eq!(xml.matches("<add key=\"Mail\"").count(), 2);
        assert!(xml.find("smtp://a").unwrap() < xml.find("smtp://b").unwrap());
    }

    #[test]
    fn test_escape_attribute_values() {
        let connections = vec![entry("A&B", "Provider=\"x\";<y>")];

        let xml = render(&connections);
        assert!(xml.contains("key=\"A&amp;B\""));
        assert!(xml.contains("value=\"Provider=&quot;x&quot;;&lt;y&gt;\""));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.config");
        let connections = vec![entry("Warehouse", "Server=.;")];

        write_connections_to_file(&connections, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<add key=\"Warehouse\" value=\"Server=.;\" />"));
    }
}
