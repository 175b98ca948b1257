//! Owned element tree built from a quick-xml event stream

use super::node::TreeNode;
use crate::domain::{LoaderError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;

/// A parsed XML element
///
/// Text from interleaved text, CDATA and entity reference events is
/// concatenated into a single string per element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Set the text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// All direct children
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    fn collect_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect_descendants(name, out);
        }
    }
}

impl TreeNode for XmlElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn children_named<'a>(&'a self, name: &str) -> Vec<&'a Self> {
        self.children.iter().filter(|c| c.name == name).collect()
    }

    fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Self> {
        let mut out = Vec::new();
        self.collect_descendants(name, &mut out);
        out
    }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Wrap an already built root element
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse a document from a string
    ///
    /// # Errors
    ///
    /// Returns `LoaderError::Xml` if the input is not well formed or has no
    /// root element.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                LoaderError::Xml(format!(
                    "Malformed XML at position {}: {e}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        LoaderError::Xml("Unexpected closing tag".to_string())
                    })?;
                    attach(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let decoded = text
                            .decode()
                            .map_err(|e| LoaderError::Xml(format!("Invalid text: {e}")))?;
                        current.text.push_str(&decoded);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(current) = stack.last_mut() {
                        let decoded = cdata
                            .decode()
                            .map_err(|e| LoaderError::Xml(format!("Invalid CDATA: {e}")))?;
                        current.text.push_str(&decoded);
                    }
                }
                Event::GeneralRef(reference) => {
                    if let Some(current) = stack.last_mut() {
                        let resolved = resolve_reference(&reference)?;
                        current.text.push_str(&resolved);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(LoaderError::Xml(format!(
                "Unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }

        root.map(Self::new)
            .ok_or_else(|| LoaderError::Xml("Document has no root element".to_string()))
    }

    /// Read and parse a document from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            LoaderError::Io(format!("Failed to read {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "Parsing XML input");
        Self::parse_str(&contents)
    }

    /// Root element
    pub fn root(&self) -> &XmlElement {
        &self.root
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);

    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| LoaderError::Xml(format!("Invalid attribute: {e}")))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| LoaderError::Xml(format!("Invalid attribute value: {e}")))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn attach(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(LoaderError::Xml(
                "Document has more than one root element".to_string(),
            ))
        }
    }
    Ok(())
}

fn resolve_reference(reference: &quick_xml::events::BytesRef<'_>) -> Result<String> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| LoaderError::Xml(format!("Invalid character reference: {e}")))?
    {
        return Ok(ch.to_string());
    }

    let name = reference
        .decode()
        .map_err(|e| LoaderError::Xml(format!("Invalid entity reference: {e}")))?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| LoaderError::Xml(format!("Unknown entity &{name};")))
}
