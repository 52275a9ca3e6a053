//! Markup tree used by the template engine.
//!
//! The tree is an arena: a [`Document`] owns every node record and hands out
//! copyable [`NodeId`] handles. Removing a node only detaches it from its
//! parent, so a handle held by an in-progress traversal stays valid. The
//! traversal notices the removal because the node's parent changed, and skips
//! it.
//!
//! Parsing ([`parse`]) is a thin adapter over `quick-xml` configured to accept
//! everyday HTML. Serialization ([`serialize`]) writes HTML back out.
//! [`select`] implements the handful of CSS selectors that `data-include`
//! needs.

mod parser;
mod selector;
mod serializer;

pub use parser::{parse, strip_markup};
pub use selector::{Selector, SelectorError, select};
pub use serializer::{serialize, serialize_node};

/// Elements that never have children and are written without an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose body is raw text, read and written verbatim.
pub const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Whether `name` is a void element.
pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Whether `name` is a raw text element.
pub fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

/// Handle of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A single attribute, kept in declaration order on its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name
    pub name: String,
    /// Decoded attribute value, empty for valueless attributes
    pub value: String,
}

/// Element name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name
    pub name: String,
    /// Attributes in declaration order with unique names
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Create an element without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Value of the attribute `name`, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|a| a.name == name).map(|a| a.value.as_str())
    }

    /// Whether the attribute `name` is present.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Set an attribute, replacing the value in place or appending it.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    /// Whitespace separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root, parent of every top-level node
    Document,
    /// `<!DOCTYPE ...>` with its content, e.g. `html`
    Doctype(String),
    /// An element
    Element(Element),
    /// Decoded character data
    Text(String),
    /// Comment body without the `<!--` and `-->` delimiters
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed markup tree.
///
/// Node 0 is always the [`NodeKind::Document`] root. Detached nodes stay in
/// the arena until the document is dropped.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The document root.
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a detached node to the arena.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Add a detached element.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.create(NodeKind::Element(element))
    }

    /// Add a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Text(text.into()))
    }

    /// Kind of a node.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Mutable kind of a node.
    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    /// The node as an element, if it is one.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// The node as a mutable element, if it is one.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.kind_mut(id) {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Whether the node is an element named `name`.
    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.name == name)
    }

    /// Parent of a node; `None` for the root and for detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Children of a node in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether the node hangs below the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current == self.root()
    }

    /// Remove a node from its parent. Its subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `node` directly after `anchor` among the anchor's siblings.
    ///
    /// Does nothing when the anchor is detached.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        let Some(parent) = self.parent(anchor) else {
            return;
        };
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings.iter().position(|&c| c == anchor).map_or(siblings.len(), |i| i + 1);
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Copy a subtree inside this document, returning the detached copy.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let kind = self.kind(id).clone();
        let copy = self.create(kind);
        let children = self.children(id).to_vec();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Copy a subtree from another document into this one, returning the
    /// detached copy.
    pub fn import(&mut self, source: &Document, id: NodeId) -> NodeId {
        let copy = self.create(source.kind(id).clone());
        for &child in source.children(id) {
            let child_copy = self.import(source, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// All nodes below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if let NodeKind::Text(t) = self.kind(id) {
            text.push_str(t);
        }
        for node in self.descendants(id) {
            if let NodeKind::Text(t) = self.kind(node) {
                text.push_str(t);
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(doc: &mut Document, name: &str) -> NodeId {
        doc.create_element(Element::new(name))
    }

    #[test]
    fn test_append_and_detach() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = element(&mut doc, "div");
        doc.append_child(root, div);
        assert_eq!(doc.children(root), &[div]);
        assert!(doc.is_attached(div));

        doc.detach(div);
        assert!(doc.children(root).is_empty());
        assert_eq!(doc.parent(div), None);
        assert!(!doc.is_attached(div));
    }

    #[test]
    fn test_insert_after_keeps_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, "a");
        let b = element(&mut doc, "b");
        let c = element(&mut doc, "c");
        doc.append_child(root, a);
        doc.append_child(root, c);
        doc.insert_after(a, b);
        assert_eq!(doc.children(root), &[a, b, c]);
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = element(&mut doc, "div");
        let text = doc.create_text("hello");
        doc.append_child(root, div);
        doc.append_child(div, text);

        let copy = doc.deep_clone(div);
        assert_eq!(doc.parent(copy), None);
        let copied_text = doc.children(copy)[0];
        assert_ne!(copied_text, text);

        *doc.kind_mut(copied_text) = NodeKind::Text("changed".into());
        assert_eq!(doc.text_content(div), "hello");
        assert_eq!(doc.text_content(copy), "changed");
    }

    #[test]
    fn test_attribute_helpers() {
        let mut el = Element::new("div");
        el.set_attr("id", "a");
        el.set_attr("class", "x  y");
        el.set_attr("id", "b");
        assert_eq!(el.attr("id"), Some("b"));
        assert_eq!(el.attributes[0].name, "id");
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(el.remove_attr("id").as_deref(), Some("b"));
        assert!(!el.has_attr("id"));
    }

    #[test]
    fn test_descendants_in_document_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = element(&mut doc, "a");
        let b = element(&mut doc, "b");
        let c = element(&mut doc, "c");
        doc.append_child(root, a);
        doc.append_child(a, b);
        doc.append_child(root, c);
        assert_eq!(doc.descendants(root), vec![a, b, c]);
    }
}
