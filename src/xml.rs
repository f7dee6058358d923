//! Owned XML document tree built on `quick-xml`'s event reader.
//!
//! Element tags are stored with their namespace prefix removed; attributes
//! keep their prefix and the namespace it resolves to.

use std::borrow::Cow;

use log::trace;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{Error, Result};

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Deepest element nesting accepted from a document.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Unqualified attribute lookup. `id` matches `id="..."` but not `x:id="..."`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.prefix.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// The `xsi:type` annotation. An unbound `xsi` prefix is accepted too,
    /// since hand-edited exports sometimes drop the declaration.
    pub fn type_annotation(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| {
                a.name == "type"
                    && match a.namespace.as_deref() {
                        Some(ns) => ns == XSI_NAMESPACE,
                        None => a.prefix.as_deref() == Some("xsi"),
                    }
            })
            .map(|a| a.value.as_str())
    }

    /// This node followed by every node beneath it, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First node strictly beneath this one with the given tag.
    pub fn find_descendant(&self, tag: &str) -> Option<&XmlNode> {
        self.descendants().skip(1).find(|n| n.is(tag))
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.is(tag))
    }
}

/// Pre-order walk over a subtree with an explicit stack.
pub struct Descendants<'a> {
    stack: Vec<&'a XmlNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub root: XmlNode,
}

type Scope = Vec<(String, String)>;

impl Document {
    pub fn parse(source: &str) -> Result<Self> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut scopes: Vec<Scope> = Vec::new();
        let mut root: Option<XmlNode> = None;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|source| Error::Xml {
                position: reader.error_position() as u64,
                source,
            })?;

            match event {
                Event::Start(ref e) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(Error::Structure(format!(
                            "elements nested deeper than {MAX_DEPTH} levels"
                        )));
                    }
                    let node = open_element(e, &mut scopes)?;
                    stack.push(node);
                }
                Event::Empty(ref e) => {
                    let node = open_element(e, &mut scopes)?;
                    scopes.pop();
                    attach(node, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    scopes.pop();
                    let node = stack
                        .pop()
                        .ok_or_else(|| Error::Structure("unexpected closing tag".to_string()))?;
                    attach(node, &mut stack, &mut root)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(Error::Structure(format!(
                "unexpected end of document inside <{}>",
                open.tag
            )));
        }

        let root =
            root.ok_or_else(|| Error::Structure("document has no root element".to_string()))?;
        trace!(root = root.tag.as_str(); "Parsed XML document");
        Ok(Document { root })
    }

    pub fn descendants(&self) -> Descendants<'_> {
        self.root.descendants()
    }
}

fn attach(node: XmlNode, stack: &mut [XmlNode], root: &mut Option<XmlNode>) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(Error::Structure(format!(
            "second root element <{}> after document element",
            node.tag
        )));
    }
    *root = Some(node);
    Ok(())
}

/// Reads one start tag, pushing its namespace declarations as a new scope.
/// The caller pops the scope when the element closes.
fn open_element(e: &BytesStart<'_>, scopes: &mut Vec<Scope>) -> Result<XmlNode> {
    let mut declarations = Scope::new();
    let mut pending = Vec::new();

    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Structure(format!("invalid attribute: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = unescape_value(&attr.value)?;

        if key == "xmlns" {
            declarations.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declarations.push((prefix.to_string(), value));
        } else {
            match key.split_once(':') {
                Some((prefix, name)) => {
                    pending.push((Some(prefix.to_string()), name.to_string(), value))
                }
                None => pending.push((None, key, value)),
            }
        }
    }
    scopes.push(declarations);

    let attributes = pending
        .into_iter()
        .map(|(prefix, name, value)| Attribute {
            namespace: prefix.as_deref().and_then(|p| resolve_prefix(scopes, p)),
            prefix,
            name,
            value,
        })
        .collect();

    Ok(XmlNode {
        tag: strip_namespace(&String::from_utf8_lossy(e.name().as_ref())).to_string(),
        attributes,
        children: Vec::new(),
    })
}

fn resolve_prefix(scopes: &[Scope], prefix: &str) -> Option<String> {
    if prefix == "xml" {
        return Some(XML_NAMESPACE.to_string());
    }
    scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter().rev())
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.clone())
}

fn unescape_value(raw: &[u8]) -> Result<String> {
    let raw = String::from_utf8_lossy(raw);
    quick_xml::escape::unescape(&raw)
        .map(Cow::into_owned)
        .map_err(|err| Error::Structure(format!("invalid attribute value: {err}")))
}

/// Local part of a tag written as `prefix:name` or `{uri}name`.
pub fn strip_namespace(tag: &str) -> &str {
    if let Some((_, local)) = tag.rsplit_once('}') {
        return local;
    }
    tag.rsplit_once(':').map_or(tag, |(_, local)| local)
}

/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars().filter(|&c| is_valid_xml_char(c)) {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
