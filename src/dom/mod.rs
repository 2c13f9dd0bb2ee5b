//! Mutable XML document tree.
//!
//! Arena-based: nodes live in one `Vec` and refer to each other by [`NodeId`].
//! Detached nodes stay in the arena until the document is dropped.
//!
//! # Module Structure
//!
//! ```text
//! dom/
//! ├── mod.rs        # Document, Element, NodeId (this file)
//! ├── parse.rs      # quick-xml event stream → tree
//! ├── serialize.rs  # tree → text
//! └── query.rs      # selector queries
//! ```
//!
//! Text and attribute values are stored exactly as written in the source
//! (still escaped), so untouched parts of a document serialize back
//! byte-for-byte apart from attribute quoting and spacing.

mod parse;
mod query;
mod serialize;

use std::borrow::Cow;

use crate::error::{MungError, Result};
use crate::utils::entity::{escape, unescape};

// ============================================================================
// NodeId
// ============================================================================

/// Index of a node inside the [`Document`] that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

// ============================================================================
// Node
// ============================================================================

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Synthetic parent of all top-level content.
    Root,
    Element(Element),
    /// Raw (escaped) character data, entity references included.
    Text(String),
    /// Comment, CDATA, processing instruction, declaration or doctype,
    /// kept as written.
    Verbatim(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

// ============================================================================
// Element
// ============================================================================

/// An element's name, attributes and serialization hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    /// Insertion-ordered `(name, raw value)` pairs.
    attrs: Vec<(String, String)>,
    /// Serialize as `<name/>` when empty.
    self_closing: bool,
}

impl Element {
    /// A new element that serializes as `<name/>` while empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            self_closing: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unescaped value of attribute `name`.
    pub fn attr(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| unescape(v))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Set attribute `name` to `value`, replacing it in place if present.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let raw = escape(value).into_owned();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = raw,
            None => self.attrs.push((name.to_string(), raw)),
        }
    }

    /// Attribute names with their unescaped values, in document order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, Cow<'_, str>)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), unescape(v)))
    }

    pub(crate) fn push_raw_attr(&mut self, name: String, raw: String) {
        self.attrs.push((name, raw));
    }

    pub(crate) fn raw_attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub(crate) fn set_self_closing(&mut self, self_closing: bool) {
        self.self_closing = self_closing;
    }

    pub(crate) fn is_self_closing(&self) -> bool {
        self.self_closing
    }
}

// ============================================================================
// Document
// ============================================================================

/// An ordered, mutable XML tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Root,
            }],
        }
    }

    /// The synthetic root node.
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(MungError::UnknownNode(id.0))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(MungError::UnknownNode(id.0))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| n.children.as_slice())
    }

    /// Element children of `id`, in document order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    /// Ancestors of `id`, nearest first, up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |current| self.parent(*current))
    }

    /// All nodes below `id` in document (pre-)order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId> {
        self.node(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Append `element` as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, element: Element) -> Result<NodeId> {
        self.push_node(parent, NodeKind::Element(element))
    }

    /// Append raw (already escaped) text, merging with a trailing text node.
    pub fn append_raw_text(&mut self, parent: NodeId, raw: &str) -> Result<()> {
        if raw.is_empty() {
            return Ok(());
        }
        let last = self.node(parent)?.children.last().copied();
        if let Some(last) = last
            && let NodeKind::Text(existing) = &mut self.node_mut(last)?.kind
        {
            existing.push_str(raw);
            return Ok(());
        }
        self.push_node(parent, NodeKind::Text(raw.to_string()))?;
        Ok(())
    }

    pub(crate) fn append_verbatim(&mut self, parent: NodeId, raw: &str) -> Result<()> {
        self.push_node(parent, NodeKind::Verbatim(raw.to_string()))?;
        Ok(())
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Replace the children of element `id` with the parsed `markup`.
    pub fn set_inner_markup(&mut self, id: NodeId, markup: &str) -> Result<()> {
        if self.element(id).is_none() {
            return Err(MungError::InvariantViolation(format!(
                "node {} is not an element",
                id.0
            )));
        }
        self.clear_children(id)?;
        self.parse_into(id, markup)
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Unescaped text content of `id` and its descendants.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text(raw)) = self.kind(id) {
            out.push_str(&unescape(raw));
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(raw)) = self.kind(node) {
                out.push_str(&unescape(raw));
            }
        }
        out
    }

    /// Whether `id` has any children at all.
    pub fn has_content(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }
}
