//! XML document reading
//!
//! This module turns raw markup into a small element tree. Element and
//! attribute names are resolved against the namespace declarations in scope,
//! and every element remembers that scope so QName-valued attribute values can
//! be resolved later. Anything that is not well-formed is reported as
//! [`Error::MalformedSchema`].

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::names::split_qname;
use crate::namespaces::{NamespaceContext, QName};

/// XML Element in the document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name, namespace resolved
    pub qname: QName,
    /// Element attributes in document order, namespace declarations excluded
    pub attributes: IndexMap<QName, String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace context in scope at this element
    pub namespaces: NamespaceContext,
    /// Line of the start tag (1-based)
    pub line: usize,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: IndexMap::new(),
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
            line: 1,
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an unqualified attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| qname.namespace.is_none() && qname.local_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether a boolean attribute is set to `true` (or `1`)
    pub fn get_bool_attribute(&self, name: &str) -> Option<bool> {
        self.get_attribute(name).map(|v| matches!(v.trim(), "true" | "1"))
    }

    /// Resolve a QName-valued attribute against the namespaces in scope
    pub fn resolve_qname(&self, value: &str) -> Result<QName> {
        self.namespaces.resolve(value.trim())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }
}

/// XML Document representation
#[derive(Debug)]
pub struct Document {
    /// Root element of the document
    pub root: Element,
}

impl Document {
    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes with default limits
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Self::parse_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut lines = LineCounter::new(xml);
        let mut root: Option<Element> = None;
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            // A tag spanning several lines is reported at its first line
            let start = lines.skip_whitespace(reader.buffer_position());
            let event = reader.read_event_into(&mut buf);
            let line = lines.line_at(start);

            match event {
                Ok(Event::Start(e)) => {
                    let element = Self::parse_element(&e, element_stack.last(), line)?;
                    if element_stack.is_empty() && root.is_some() {
                        return Err(malformed("Content after the root element", line));
                    }
                    element_stack.push(element);
                    limits.check_xml_depth(element_stack.len())?;
                }
                Ok(Event::End(_)) => {
                    let current = element_stack
                        .pop()
                        .ok_or_else(|| malformed("Unexpected end tag", line))?;
                    match element_stack.last_mut() {
                        Some(parent) => parent.add_child(current),
                        None => root = Some(current),
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = Self::parse_element(&e, element_stack.last(), line)?;
                    match element_stack.last_mut() {
                        Some(parent) => parent.add_child(element),
                        None if root.is_some() => {
                            return Err(malformed("Content after the root element", line));
                        }
                        None => root = Some(element),
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(malformed(format!("Error parsing XML: {}", e), line));
                }
                _ => {} // Text, comments, processing instructions, doctype
            }
            buf.clear();
        }

        if let Some(open) = element_stack.last() {
            return Err(malformed(
                format!("Unclosed element <{}>", open.local_name()),
                open.line,
            ));
        }

        let root = root.ok_or_else(|| malformed("Document has no root element", lines.line))?;
        Ok(Document { root })
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart, parent: Option<&Element>, line: usize) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| malformed(format!("Invalid element name: {}", e), line))?
            .to_string();

        let mut namespaces = parent
            .map(|p| p.namespaces.clone())
            .unwrap_or_default();
        let mut raw_attributes = Vec::new();

        // Namespace declarations first: they apply to the element's own name
        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| malformed(format!("Failed to parse attribute: {}", e), line))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| malformed(format!("Invalid attribute name: {}", e), line))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| malformed(format!("Failed to unescape attribute value: {}", e), line))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let qname = match split_qname(&name) {
            (Some(prefix), local) => {
                let namespace = namespaces.get_namespace(prefix).ok_or_else(|| {
                    malformed(format!("Undeclared namespace prefix '{}' on <{}>", prefix, name), line)
                })?;
                QName::namespaced(namespace, local)
            }
            (None, local) => QName::new(namespaces.get_default_namespace(), local),
        };

        let mut element = Element::new(qname);
        element.line = line;

        for (attr_name, attr_value) in raw_attributes {
            // Unprefixed attributes are in no namespace
            let attr_qname = match split_qname(&attr_name) {
                (Some(prefix), local) => {
                    let namespace = namespaces.get_namespace(prefix).ok_or_else(|| {
                        malformed(
                            format!("Undeclared namespace prefix '{}' on attribute {}", prefix, attr_name),
                            line,
                        )
                    })?;
                    QName::namespaced(namespace, local)
                }
                (None, local) => QName::local(local),
            };
            element.attributes.insert(attr_qname, attr_value);
        }

        element.namespaces = namespaces;
        Ok(element)
    }
}

fn malformed(message: impl Into<String>, line: usize) -> Error {
    Error::MalformedSchema(ParseError::new(message).with_location(format!("line {}", line)))
}

/// Incremental byte offset to line number conversion
struct LineCounter<'a> {
    data: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            line: 1,
        }
    }

    /// First non-whitespace position at or after `position`
    fn skip_whitespace(&self, position: usize) -> usize {
        let rest = self.data.get(position..).unwrap_or_default();
        position + rest.iter().take_while(|b| b.is_ascii_whitespace()).count()
    }

    /// Line of the byte at `position`; positions must not decrease
    fn line_at(&mut self, position: usize) -> usize {
        let end = position.min(self.data.len());
        if end > self.offset {
            self.line += self.data[self.offset..end]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.offset = end;
        }
        self.line
    }
}
