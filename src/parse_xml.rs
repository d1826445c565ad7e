//! Source document loader built on quick-xml
//!
//! Reads a package file into a plain element tree. The tree keeps every kind
//! of child content (elements, text, CDATA, comments, processing instructions)
//! so ingestion can decide what to do with each of them.

use anyhow::Context;
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A parsed XML element
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified tag name, prefix included (e.g. `DTS:Executable`)
    pub name: String,
    /// Attributes in document order
    pub attributes: IndexMap<String, String>,
    /// Child content in document order
    pub children: Vec<XmlContent>,
}

/// One piece of child content inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlContent {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Iterate over child elements only
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlContent::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Concatenated text and CDATA of this element and all descendants
    pub fn inner_text(&self) -> String {
        let mut text = String::new();
        collect_text(self, &mut text);
        text
    }
}

fn collect_text(el: &XmlElement, out: &mut String) {
    for child in &el.children {
        match child {
            XmlContent::Text(t) | XmlContent::CData(t) => out.push_str(t),
            XmlContent::Element(e) => collect_text(e, out),
            _ => {}
        }
    }
}

/// Parses a package file and returns the root element
///
/// # Example
/// ```ignore
/// let root = parse_xml_file("tests/load_customers.dtsx")?;
/// println!("Root element: {}", root.name);
/// ```
pub fn parse_xml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<XmlElement> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut reader = Reader::from_reader(BufReader::new(file));
    parse_document(&mut reader)
        .with_context(|| format!("Failed to parse XML: {}", path.display()))
}

/// Parses a package held in memory
pub fn parse_xml_str(text: &str) -> anyhow::Result<XmlElement> {
    let mut reader = Reader::from_str(text);
    parse_document(&mut reader)
}

fn parse_document<R: BufRead>(reader: &mut Reader<R>) -> anyhow::Result<XmlElement> {
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        let maybe_root = match event {
            Event::Start(start) => Some((start.into_owned(), false)),
            Event::Empty(start) => Some((start.into_owned(), true)),
            Event::Eof => {
                anyhow::bail!("XML document is empty");
            }
            _ => None,
        };

        if let Some((start, self_closing)) = maybe_root {
            let mut node_buf = Vec::new();
            return parse_element(reader, &mut node_buf, start, self_closing);
        }
    }
}

fn parse_element<R: BufRead>(
    reader: &mut Reader<R>,
    buf: &mut Vec<u8>,
    start: BytesStart<'static>,
    self_closing: bool,
) -> anyhow::Result<XmlElement> {
    let element_name_bytes = start.name().as_ref().to_vec();
    let mut element = XmlElement::new(String::from_utf8_lossy(&element_name_bytes));
    element.attributes = collect_attributes(&start)?;

    if self_closing {
        return Ok(element);
    }

    loop {
        buf.clear();
        let event = reader.read_event_into(buf)?;
        match event {
            Event::Start(child_start) => {
                let mut child_buf = Vec::new();
                let child = parse_element(reader, &mut child_buf, child_start.into_owned(), false)?;
                element.children.push(XmlContent::Element(child));
            }
            Event::Empty(child_start) => {
                let mut child_buf = Vec::new();
                let child = parse_element(reader, &mut child_buf, child_start.into_owned(), true)?;
                element.children.push(XmlContent::Element(child));
            }
            Event::Text(text) => {
                let value = text.unescape()?.into_owned();
                if !value.trim().is_empty() {
                    element.children.push(XmlContent::Text(value));
                }
            }
            Event::CData(text) => {
                let value = String::from_utf8_lossy(&text.into_inner()).into_owned();
                element.children.push(XmlContent::CData(value));
            }
            Event::Comment(text) => {
                let value = String::from_utf8_lossy(text.as_ref()).into_owned();
                element.children.push(XmlContent::Comment(value));
            }
            Event::PI(text) => {
                let value = String::from_utf8_lossy(text.as_ref()).into_owned();
                element.children.push(XmlContent::ProcessingInstruction(value));
            }
            Event::End(end) => {
                anyhow::ensure!(
                    end.name().as_ref() == element_name_bytes.as_slice(),
                    "unexpected closing tag '</{}>' while parsing '<{}>'",
                    String::from_utf8_lossy(end.name().as_ref()),
                    element.name
                );
                return Ok(element);
            }
            Event::Eof => {
                anyhow::bail!("unexpected end of file while parsing element '{}'", element.name);
            }
            Event::Decl(_) | Event::DocType(_) => {}
        }
    }
}

fn collect_attributes(start: &BytesStart<'_>) -> anyhow::Result<IndexMap<String, String>> {
    let mut map = IndexMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        map.insert(key, value);
    }
    Ok(map)
}
