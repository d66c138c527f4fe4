//! XML document adapter.
//!
//! The document is read with `quick-xml` into an owned [`XmlElement`] tree,
//! then viewed through [`XmlToken`]. Element and attribute names are matched
//! by local name, so `<ns:order>` answers to `order`.

use std::str;

use docshape_core::{DocumentToken, TokenError};
use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Why XML text could not be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XmlError {
    #[error("malformed XML at byte {position}: {message}")]
    Syntax { position: u64, message: String },
    #[error("invalid UTF-8 in XML content")]
    InvalidUtf8,
    #[error("unknown entity reference '&{0};'")]
    UnknownEntity(String),
    #[error("document has no root element")]
    NoRoot,
    #[error("document has more than one root element")]
    MultipleRoots,
    #[error("text outside the root element")]
    TextOutsideRoot,
    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

/// One element of a parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    nil: bool,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by local name. Namespace declarations are not
    /// attributes.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the element carries `xsi:nil="true"`.
    pub fn is_nil(&self) -> bool {
        self.nil
    }

    /// Trimmed text content, CDATA included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    fn is_text_leaf(&self) -> bool {
        self.children.is_empty() && !self.text.is_empty()
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = utf8(start.local_name().as_ref())?.to_string();
        let mut element = XmlElement {
            name,
            ..Self::default()
        };

        for attr in start.attributes() {
            let attr = attr.map_err(|e| XmlError::Syntax {
                position: 0,
                message: e.to_string(),
            })?;
            let key = attr.key;
            if key.as_ref() == b"xmlns" {
                continue;
            }
            let prefix = key.prefix();
            if prefix.as_ref().is_some_and(|p| p.as_ref() == b"xmlns") {
                continue;
            }
            let local = utf8(key.local_name().as_ref())?.to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError::Syntax {
                    position: 0,
                    message: e.to_string(),
                })?
                .into_owned();

            if prefix.is_some() && local == "nil" {
                element.nil = matches!(value.trim(), "true" | "1");
                continue;
            }
            element.attributes.push((local, value));
        }
        Ok(element)
    }
}

/// A parsed XML document: exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

struct OpenElement {
    element: XmlElement,
    text: String,
}

impl OpenElement {
    fn close(mut self) -> XmlElement {
        self.element.text = self.text.trim().to_string();
        self.element
    }
}

impl XmlDocument {
    /// Parses XML text into an element tree.
    ///
    /// # Errors
    ///
    /// Malformed markup, mismatched or unclosed tags, unknown entities,
    /// text outside the root, and more or fewer than one root element.
    pub fn parse(text: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(text);
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| XmlError::Syntax {
                position: reader.error_position(),
                message: e.to_string(),
            })?;
            match event {
                Event::Start(start) => stack.push(OpenElement {
                    element: XmlElement::from_start(&start)?,
                    text: String::new(),
                }),
                Event::Empty(start) => {
                    let element = XmlElement::from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let open = stack.pop().ok_or_else(|| XmlError::Syntax {
                        position: reader.buffer_position(),
                        message: "closing tag without an open element".to_string(),
                    })?;
                    attach(&mut stack, &mut root, open.close())?;
                }
                Event::Text(content) => {
                    let decoded = content.decode().map_err(|_| XmlError::InvalidUtf8)?;
                    push_text(&mut stack, &decoded)?;
                }
                Event::CData(content) => {
                    push_text(&mut stack, utf8(&content)?)?;
                }
                Event::GeneralRef(reference) => {
                    let raw = reference.decode().map_err(|_| XmlError::InvalidUtf8)?;
                    push_text(&mut stack, &resolve_entity(&raw)?)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.element.name));
        }
        root.map(|root| Self { root }).ok_or(XmlError::NoRoot)
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Token for the root element.
    pub fn root_token(&self) -> XmlToken<'_> {
        XmlToken::element(&self.root)
    }
}

fn attach(
    stack: &mut [OpenElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.element.children.push(element),
        None if root.is_some() => return Err(XmlError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [OpenElement], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(open) => open.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => return Err(XmlError::TextOutsideRoot),
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<&str, XmlError> {
    str::from_utf8(bytes).map_err(|_| XmlError::InvalidUtf8)
}

fn resolve_entity(raw: &str) -> Result<String, XmlError> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.to_string());
    }
    let code = match raw.strip_prefix('#') {
        Some(rest) => match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => rest.parse::<u32>().ok(),
        },
        None => None,
    };
    code.and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| XmlError::UnknownEntity(raw.to_string()))
}

#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    Absent,
    Element(&'a XmlElement),
    Attribute(&'a str),
}

/// A node of a parsed XML document: an element, an attribute value, or an
/// absent node.
///
/// Lists are same-named sibling elements, so any element that is not a
/// text leaf is list-like. An element with `xsi:nil="true"` is absent; an
/// empty element is a primitive with empty text.
#[derive(Debug, Clone, Copy)]
pub struct XmlToken<'a> {
    node: Node<'a>,
}

impl<'a> XmlToken<'a> {
    pub fn element(element: &'a XmlElement) -> Self {
        Self {
            node: Node::Element(element),
        }
    }

    fn absent() -> Self {
        Self { node: Node::Absent }
    }

    fn as_element(&self) -> Option<&'a XmlElement> {
        match self.node {
            Node::Element(element) if !element.nil => Some(element),
            _ => None,
        }
    }
}

impl DocumentToken for XmlToken<'_> {
    fn is_absent(&self) -> bool {
        match self.node {
            Node::Absent => true,
            Node::Element(element) => element.nil,
            Node::Attribute(_) => false,
        }
    }

    fn is_primitive(&self) -> bool {
        match self.node {
            Node::Attribute(_) => true,
            _ => self.as_element().is_some_and(|e| e.children.is_empty()),
        }
    }

    fn is_object(&self) -> bool {
        self.as_element().is_some_and(|e| !e.is_text_leaf())
    }

    fn is_array_like(&self, _name: &str) -> bool {
        self.is_object()
    }

    fn child(&self, name: &str) -> Self {
        self.as_element()
            .and_then(|e| e.children.iter().find(|c| c.name == name))
            .map_or_else(Self::absent, Self::element)
    }

    fn children(&self, name: &str) -> Vec<Self> {
        self.as_element()
            .map(|e| {
                e.children
                    .iter()
                    .filter(|c| c.name == name)
                    .map(Self::element)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn attribute(&self, name: &str) -> Result<Self, TokenError> {
        Ok(self
            .as_element()
            .and_then(|e| e.attribute(name))
            .map_or_else(Self::absent, |value| Self {
                node: Node::Attribute(value),
            }))
    }

    fn as_text(&self) -> Option<String> {
        match self.node {
            Node::Attribute(value) => Some(value.to_string()),
            _ => self
                .as_element()
                .filter(|e| e.children.is_empty())
                .map(|e| e.text.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_tree_with_local_names() {
        let doc = XmlDocument::parse(
            r#"<?xml version="1.0"?>
            <o:order xmlns:o="urn:orders" xmlns="urn:default" o:id="7">
                <o:line sku="A1">  widget &amp; bolt </o:line>
                <line sku="B2"><![CDATA[<raw>]]></line>
                <!-- comment -->
            </o:order>"#,
        )
        .unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "order");
        assert_eq!(root.attribute("id"), Some("7"));
        assert_eq!(root.attribute("o"), None);
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].text(), "widget & bolt");
        assert_eq!(root.children()[1].text(), "<raw>");
        assert_eq!(root.children()[1].attribute("sku"), Some("B2"));
    }

    #[test]
    fn test_character_references_resolve() {
        let doc = XmlDocument::parse("<a>&#65;&#x42;</a>").unwrap();
        assert_eq!(doc.root().text(), "AB");
        assert_eq!(
            XmlDocument::parse("<a>&bogus;</a>").unwrap_err(),
            XmlError::UnknownEntity("bogus".into())
        );
    }

    #[test]
    fn test_rejects_malformed_documents() {
        assert_eq!(XmlDocument::parse("<a/><b/>").unwrap_err(), XmlError::MultipleRoots);
        assert_eq!(XmlDocument::parse("   ").unwrap_err(), XmlError::NoRoot);
        assert_eq!(XmlDocument::parse("<a/>junk").unwrap_err(), XmlError::TextOutsideRoot);
        assert!(matches!(
            XmlDocument::parse("<a><b></a>").unwrap_err(),
            XmlError::Syntax { .. }
        ));
        assert!(XmlDocument::parse("<a><b>").is_err());
    }

    #[test]
    fn test_nil_elements_are_absent() {
        let doc = XmlDocument::parse(
            r#"<r xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                <a xsi:nil="true"/><b/><c xsi:nil="false">x</c>
            </r>"#,
        )
        .unwrap();
        let root = doc.root_token();
        assert!(root.child("a").is_absent());
        assert!(!root.child("b").is_absent());
        assert_eq!(root.child("b").as_text().as_deref(), Some(""));
        assert_eq!(root.child("c").as_text().as_deref(), Some("x"));
        assert!(root.child("missing").is_absent());
    }

    #[test]
    fn test_token_classification() {
        let doc = XmlDocument::parse(
            r#"<user id="9"><name>Ada</name><tag>a</tag><tag>b</tag><address><city>X</city></address></user>"#,
        )
        .unwrap();
        let root = doc.root_token();
        assert!(root.is_object());
        assert!(root.is_array_like("tag"));
        assert_eq!(root.children("tag").len(), 2);
        assert!(root.children("none").is_empty());

        let name = root.child("name");
        assert!(name.is_primitive());
        assert!(!name.is_object());
        assert!(!name.is_array_like("anything"));

        let address = root.child("address");
        assert!(address.is_object());
        assert!(!address.is_primitive());
        assert_eq!(address.as_text(), None);

        let id = root.attribute("id").unwrap();
        assert!(id.is_primitive());
        assert_eq!(id.as_text().as_deref(), Some("9"));
        assert!(root.attribute("missing").unwrap().is_absent());
    }
}
