//! Minimal XML document tree for `xml` responses.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A node inside an [`XmlElement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            attributes.push((key, value.to_string()));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    /// Value of an attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated text of this element and all its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for node in &element.children {
        match node {
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Element(e) => collect_text(e, out),
        }
    }
}

/// A parsed XML document with a single root element.
///
/// # Examples
///
/// ```
/// use xhrkit::XmlDocument;
///
/// let doc = XmlDocument::parse(r#"<user id="7"><name>Ada</name></user>"#).unwrap();
/// assert_eq!(doc.root().name, "user");
/// assert_eq!(doc.root().attribute("id"), Some("7"));
/// assert_eq!(doc.root().child("name").unwrap().text(), "Ada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    /// Parses a document.
    ///
    /// # Errors
    ///
    /// Returns the parser message if the text is not well-formed or does not
    /// have exactly one root element.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if root.is_some() && stack.is_empty() {
                        return Err("multiple root elements".to_string());
                    }
                    stack.push(XmlElement::from_start(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = XmlElement::from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| "unexpected closing tag".to_string())?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|e| e.to_string())?;
                    if text.is_empty() {
                        continue;
                    }
                    let parent = stack
                        .last_mut()
                        .ok_or_else(|| "text outside the root element".to_string())?;
                    parent.children.push(XmlNode::Text(text.to_string()));
                }
                Ok(Event::CData(e)) => {
                    let parent = stack
                        .last_mut()
                        .ok_or_else(|| "CDATA outside the root element".to_string())?;
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    parent.children.push(XmlNode::Text(text));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(format!(
                        "error at position {}: {}",
                        reader.error_position(),
                        e
                    ))
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err("unclosed element at end of document".to_string());
        }
        root.map(|root| Self { root })
            .ok_or_else(|| "document has no root element".to_string())
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn into_root(self) -> XmlElement {
        self.root
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err("multiple root elements".to_string()),
    }
}
