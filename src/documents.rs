//! Description document trees
//!
//! A parsed document is held in an [`ElementTree`]: an arena of nodes that
//! owns every element. Children are referenced by [`ElementId`] and each node
//! keeps the id of its parent, which is only used to build diagnostic paths.
//!
//! Besides the child list, every node records its [`Content`] in document
//! order so that text around children and CDATA sections can be written back
//! out as they were read.

use std::str::FromStr;

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::names;

/// Index of an element inside its [`ElementTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// One piece of an element's content, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Character data, unescaped and trimmed
    Text(String),
    /// A CDATA section, exactly as written
    CData(String),
    /// A child element
    Child(ElementId),
}

impl Content {
    /// Whether this is character data rather than a child
    pub fn is_text(&self) -> bool {
        !matches!(self, Content::Child(_))
    }
}

/// An attribute value together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Raw attribute value
    pub value: String,
    /// False when the value was filled in from a schema default
    pub explicit: bool,
}

impl Attribute {
    /// An attribute supplied by the document
    pub fn explicit(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            explicit: true,
        }
    }

    /// An attribute filled in from a schema default
    pub fn defaulted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            explicit: false,
        }
    }
}

/// A node of the description tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag of the element, including any namespace prefix
    pub name: String,
    /// Attributes in document order
    pub attributes: IndexMap<String, Attribute>,
    /// Text content used as the element's value (if any).
    ///
    /// For parsed elements this is all character data joined, with CDATA
    /// sections trimmed. The pieces themselves are kept by
    /// [`ElementTree::content`].
    pub text: Option<String>,
    opaque: bool,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let opaque = names::is_namespaced(&name);
        Self {
            name,
            attributes: IndexMap::new(),
            text: None,
            opaque,
        }
    }

    /// Create an element whose content is exempt from validation
    pub fn opaque(name: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.opaque = true;
        element
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder-style text setter
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Whether the element itself is marked opaque: its tag is namespace
    /// qualified or it was built with [`Element::opaque`].
    ///
    /// Types the schema declares opaque (such as `plugin`) are not seen
    /// here; use `Schema::is_opaque` for the full answer.
    pub fn is_marked_opaque(&self) -> bool {
        self.opaque
    }

    /// Get an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|a| a.value.as_str())
    }

    /// Get an attribute value only if the document supplied it
    pub fn explicit_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .filter(|a| a.explicit)
            .map(|a| a.value.as_str())
    }

    /// Check if an attribute is present (explicit or defaulted)
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Set an explicit attribute value, keeping its position if already present
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), Attribute::explicit(value));
    }

    /// Fill in a default value for an absent attribute.
    ///
    /// Returns false and leaves the element untouched if the attribute is
    /// already present.
    pub fn set_default_attribute(&mut self, name: &str, value: &str) -> bool {
        if self.attributes.contains_key(name) {
            return false;
        }
        self.attributes
            .insert(name.to_string(), Attribute::defaulted(value));
        true
    }

    /// The `name` attribute, if any
    pub fn name_attribute(&self) -> Option<&str> {
        self.attribute("name")
    }

    /// Set text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }
}

#[derive(Debug, Clone)]
struct Node {
    element: Element,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    content: Vec<Content>,
}

/// Arena-backed description tree
#[derive(Debug, Clone)]
pub struct ElementTree {
    nodes: Vec<Node>,
}

impl ElementTree {
    /// Create a tree holding only `root`
    pub fn new(root: Element) -> Self {
        Self {
            nodes: vec![Node {
                element: root,
                parent: None,
                children: Vec::new(),
                content: Vec::new(),
            }],
        }
    }

    /// Parse a document with default limits
    pub fn parse(xml: &str) -> Result<Self> {
        Self::parse_with_limits(xml.as_bytes(), &Limits::default())
    }

    /// Parse a document from bytes, enforcing `limits`
    pub fn parse_with_limits(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);
        reader.trim_text(true);

        let mut tree: Option<ElementTree> = None;
        let mut stack: Vec<ElementId> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_depth(stack.len() + 1)?;
                    let element = Self::parse_element(&e, limits)?;
                    let id = Self::attach(&mut tree, &stack, element)?;
                    if let Some(tree) = &tree {
                        limits.check_elements(tree.len())?;
                    }
                    stack.push(id);
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Empty(e)) => {
                    limits.check_depth(stack.len() + 1)?;
                    let element = Self::parse_element(&e, limits)?;
                    Self::attach(&mut tree, &stack, element)?;
                    if let Some(tree) = &tree {
                        limits.check_elements(tree.len())?;
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    if !text.is_empty() {
                        Self::append_content(&mut tree, &stack, Content::Text(text.into_owned()))?;
                    }
                }
                Ok(Event::CData(e)) => {
                    let raw = e.into_inner();
                    let text = std::str::from_utf8(&raw)
                        .map_err(|e| Error::Xml(format!("Invalid CDATA content: {}", e)))?;
                    Self::append_content(&mut tree, &stack, Content::CData(text.to_string()))?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, declarations, processing instructions)
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Xml("Unexpected end of document".to_string()));
        }
        let tree = tree.ok_or_else(|| Error::Xml("Document has no root element".to_string()))?;
        tracing::debug!(
            root = %tree.get(tree.root()).name,
            elements = tree.len(),
            "Parsed description document"
        );
        Ok(tree)
    }

    fn attach(
        tree: &mut Option<ElementTree>,
        stack: &[ElementId],
        element: Element,
    ) -> Result<ElementId> {
        match (tree.as_mut(), stack.last()) {
            (Some(tree), Some(&parent)) => Ok(tree.add_child(parent, element)),
            (Some(tree), None) => Err(Error::Xml(format!(
                "Multiple root elements: found <{}> after <{}>",
                element.name,
                tree.get(tree.root()).name
            ))),
            (None, _) => {
                let new_tree = ElementTree::new(element);
                let root = new_tree.root();
                *tree = Some(new_tree);
                Ok(root)
            }
        }
    }

    fn append_content(tree: &mut Option<ElementTree>, stack: &[ElementId], content: Content) -> Result<()> {
        let (tree, current) = match (tree.as_mut(), stack.last()) {
            (Some(tree), Some(&current)) => (tree, current),
            _ => {
                return Err(Error::Xml(format!(
                    "Text outside of the root element: '{:?}'",
                    content
                )))
            }
        };

        let value = match &content {
            Content::Text(text) => text.as_str(),
            Content::CData(raw) => raw.trim(),
            Content::Child(_) => "",
        };
        if !value.is_empty() {
            let element = tree.get_mut(current);
            match element.text.as_mut() {
                Some(existing) => existing.push_str(value),
                None => element.text = Some(value.to_string()),
            }
        }
        tree.nodes[current.0].content.push(content);
        Ok(())
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart, limits: &Limits) -> Result<Element> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?;

        let mut element = Element::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?;

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?;

            element.set_attribute(attr_name, attr_value.as_ref());
        }
        limits.check_attributes(element.attributes.len())?;

        Ok(element)
    }

    /// Id of the root element
    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Number of elements in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least its root
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Get an element.
    ///
    /// Ids are only handed out by this tree, so an id from another tree is a
    /// programming error and panics.
    pub fn get(&self, id: ElementId) -> &Element {
        &self.nodes[id.0].element
    }

    /// Get an element mutably
    pub fn get_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.nodes[id.0].element
    }

    /// Append `child` as the last child of `parent`
    pub fn add_child(&mut self, parent: ElementId, child: Element) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(Node {
            element: child,
            parent: Some(parent),
            children: Vec::new(),
            content: Vec::new(),
        });
        let parent = &mut self.nodes[parent.0];
        parent.children.push(id);
        parent.content.push(Content::Child(id));
        id
    }

    /// Children of an element in document order
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.nodes[id.0].children
    }

    /// Text, CDATA and children of an element in document order.
    ///
    /// Trees built through [`ElementTree::add_child`] and
    /// [`Element::set_text`] only record children here; their text lives in
    /// [`Element::text`].
    pub fn content(&self, id: ElementId) -> &[Content] {
        &self.nodes[id.0].content
    }

    /// Children of an element with the given tag, in document order
    pub fn children_named<'a>(
        &'a self,
        id: ElementId,
        name: &'a str,
    ) -> impl Iterator<Item = ElementId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&child| self.get(child).name == name)
    }

    /// First child with the given tag
    pub fn find_child(&self, id: ElementId, name: &str) -> Option<ElementId> {
        self.children_named(id, name).next()
    }

    /// Parent of an element (None for the root)
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes[id.0].parent
    }

    /// Diagnostic path such as `/sdf/model[box]/link[link]`
    pub fn path(&self, id: ElementId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let element = self.get(node);
            match element.name_attribute() {
                Some(name) => segments.push(format!("{}[{}]", element.name, name)),
                None => segments.push(element.name.clone()),
            }
            current = self.parent(node);
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// All element ids in pre-order
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            out.push(next);
            pending.extend(self.children(next).iter().rev().copied());
        }
        out
    }
}

impl FromStr for ElementTree {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
