//! Lossless XML node tree
//!
//! Parts are read into a tree that keeps every `quick-xml` event verbatim:
//! start tags keep their raw attribute bytes (quote style, entity escapes,
//! namespace declarations) and text keeps its escaped form. Writing the tree
//! back produces the original bytes apart from end-tag whitespace, so a table
//! subtree that survives pruning is re-emitted exactly as it was read.

use quick_xml::events::{BytesCData, BytesDecl, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::constants::namespace;
use crate::error::{Result, SplitError};

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(BytesText<'static>),
    CData(BytesCData<'static>),
    Comment(BytesText<'static>),
    Decl(BytesDecl<'static>),
    PI(BytesPI<'static>),
    DocType(BytesText<'static>),
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    start: BytesStart<'static>,
    pub children: Vec<XmlNode>,
    self_closing: bool,
}

impl XmlElement {
    fn open(start: BytesStart<'static>) -> Self {
        Self {
            start,
            children: Vec::new(),
            self_closing: false,
        }
    }

    /// Build a new `<name attr="value" .../>` element.
    pub fn new_empty(name: &str, attributes: &[(&str, &str)]) -> Self {
        let start = BytesStart::new(name.to_string())
            .with_attributes(attributes.iter().copied())
            .into_owned();
        Self {
            start,
            children: Vec::new(),
            self_closing: true,
        }
    }

    /// Qualified name, e.g. `w:tbl`
    pub fn name(&self) -> &[u8] {
        self.start.name().into_inner()
    }

    /// Name without its namespace prefix, e.g. `tbl`
    pub fn local_name(&self) -> &[u8] {
        self.start.local_name().into_inner()
    }

    pub fn prefix(&self) -> &[u8] {
        let name = self.name();
        match name.iter().position(|b| *b == b':') {
            Some(pos) => &name[..pos],
            None => &[],
        }
    }

    /// Unescaped value of the attribute with the given qualified name
    pub fn attr(&self, key: &str) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|a| a.key.as_ref() == key.as_bytes())
            .map(|a| match a.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
            })
    }

    /// All attributes as `(qualified key, unescaped value)` pairs
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.start
            .attributes()
            .flatten()
            .map(|a| {
                let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                let value = match a.unescape_value() {
                    Ok(value) => value.into_owned(),
                    Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
                };
                (key, value)
            })
            .collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// First direct child with the given local name
    pub fn find_child(&self, local: &str) -> Option<&XmlElement> {
        self.child_elements()
            .find(|child| child.local_name() == local.as_bytes())
    }

    pub fn find_child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.child_elements_mut()
            .find(|child| child.local_name() == local.as_bytes())
    }

    /// Depth-first, document-order visit of this element and all its descendants
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a XmlElement)) {
        visit(self);
        for child in self.child_elements() {
            child.walk(visit);
        }
    }

    /// Concatenated, unescaped character data of all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.collect_text(out),
                XmlNode::Text(text) => match text.unescape() {
                    Ok(value) => out.push_str(&value),
                    Err(_) => out.push_str(&String::from_utf8_lossy(text)),
                },
                XmlNode::CData(cdata) => out.push_str(&String::from_utf8_lossy(cdata)),
                _ => {}
            }
        }
    }
}

/// A parsed XML part: prolog nodes, the root element and any trailing nodes
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut nodes = Vec::new();

        loop {
            let node = match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    stack.push(XmlElement::open(e.into_owned()));
                    None
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        SplitError::MalformedPackage("unbalanced XML end tag".to_string())
                    })?;
                    Some(XmlNode::Element(element))
                }
                Event::Empty(e) => {
                    let mut element = XmlElement::open(e.into_owned());
                    element.self_closing = true;
                    Some(XmlNode::Element(element))
                }
                Event::Text(e) => Some(XmlNode::Text(e.into_owned())),
                Event::CData(e) => Some(XmlNode::CData(e.into_owned())),
                Event::Comment(e) => Some(XmlNode::Comment(e.into_owned())),
                Event::Decl(e) => Some(XmlNode::Decl(e.into_owned())),
                Event::PI(e) => Some(XmlNode::PI(e.into_owned())),
                Event::DocType(e) => Some(XmlNode::DocType(e.into_owned())),
                Event::Eof => break,
            };
            buf.clear();

            if let Some(node) = node {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => nodes.push(node),
                }
            }
        }

        if !stack.is_empty() {
            return Err(SplitError::MalformedPackage(
                "XML ended before all elements were closed".to_string(),
            ));
        }

        Ok(Self { nodes })
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(XmlNode::as_element)
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(XmlNode::as_element_mut)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element(element) => {
            if element.self_closing && element.children.is_empty() {
                writer.write_event(Event::Empty(element.start.borrow()))?;
            } else {
                writer.write_event(Event::Start(element.start.borrow()))?;
                for child in &element.children {
                    write_node(writer, child)?;
                }
                writer.write_event(Event::End(element.start.to_end()))?;
            }
        }
        XmlNode::Text(text) => writer.write_event(Event::Text(text.clone()))?,
        XmlNode::CData(cdata) => writer.write_event(Event::CData(cdata.clone()))?,
        XmlNode::Comment(comment) => writer.write_event(Event::Comment(comment.clone()))?,
        XmlNode::Decl(decl) => writer.write_event(Event::Decl(decl.clone()))?,
        XmlNode::PI(pi) => writer.write_event(Event::PI(pi.clone()))?,
        XmlNode::DocType(doctype) => writer.write_event(Event::DocType(doctype.clone()))?,
    }
    Ok(())
}

/// Namespace prefixes declared on a part's root element.
///
/// Element and attribute matching goes through the declared prefixes rather
/// than assuming `w:` and `r:`, so documents written with unusual prefixes
/// (or Strict OOXML namespaces) are classified the same way.
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    wml: Vec<String>,
    rel: Vec<String>,
}

impl Namespaces {
    pub fn from_root(root: &XmlElement) -> Self {
        let mut ns = Namespaces::default();
        for (key, value) in root.attributes() {
            let prefix = if key == "xmlns" {
                ""
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                prefix
            } else {
                continue;
            };

            if namespace::WML.contains(&value.as_str()) {
                ns.wml.push(prefix.to_string());
            }
            if namespace::RELATIONSHIPS.contains(&value.as_str()) {
                ns.rel.push(prefix.to_string());
            }
        }

        if ns.wml.is_empty() {
            ns.wml.push("w".to_string());
        }
        if ns.rel.is_empty() {
            ns.rel.push("r".to_string());
        }
        ns
    }

    /// True when `element` is the WordprocessingML element `local`
    pub fn is_wml(&self, element: &XmlElement, local: &str) -> bool {
        element.local_name() == local.as_bytes()
            && self.wml.iter().any(|p| p.as_bytes() == element.prefix())
    }

    /// Value of the WordprocessingML attribute `local` (e.g. `w:val`)
    pub fn wml_attr(&self, element: &XmlElement, local: &str) -> Option<String> {
        self.wml.iter().find_map(|prefix| {
            if prefix.is_empty() {
                element.attr(local)
            } else {
                element.attr(&format!("{prefix}:{local}"))
            }
        })
    }

    /// True when the qualified attribute key lives in the relationships namespace
    pub fn is_relationship_attr(&self, key: &str) -> bool {
        match key.split_once(':') {
            Some((prefix, _)) => prefix != "xmlns" && self.rel.iter().any(|p| p == prefix),
            None => false,
        }
    }
}
