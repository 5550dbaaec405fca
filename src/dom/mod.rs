//! Lenient, structure-preserving HTML-like document trees
//!
//! Arena-backed mutable trees for build-time markup rewriting. Unlike
//! spec-conforming HTML5 parsers, this module performs no tree surgery:
//! no implied `<html>`/`<body>`, no `<template>` content isolation, no
//! tag-case folding, no attribute reordering, no entity decoding. Custom
//! elements nest like any other element, comments are preserved, and raw
//! text inside opaque elements (`script`, `style`, `pre`, `noscript`) is
//! never reparsed. Serialization round-trips what the parser understood.

mod parser;
mod serialize;

use std::fmt;

use generational_arena::{Arena, Index};
use indexmap::IndexMap;
use tracing::instrument;

/// Elements serialized without an end tag and never given children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is kept as raw text and never parsed.
pub const OPAQUE_ELEMENTS: &[&str] = &["script", "style", "pre", "noscript"];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| tag.eq_ignore_ascii_case(v))
}

pub fn is_opaque(tag: &str) -> bool {
    OPAQUE_ELEMENTS.iter().any(|v| tag.eq_ignore_ascii_case(v))
}

/// Tag name, ordered attributes, and the source's self-closing spelling.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Original-case tag name
    pub tag: String,
    /// Attributes in source order; names are case-sensitive
    pub attrs: IndexMap<String, String>,
    /// Source used `/>`
    pub self_closing: bool,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Synthetic root holding the document's top-level nodes
    Document,
    Element(ElementData),
    Text(String),
    Comment(String),
    /// Doctype and other `<!...>`/`<?...>` constructs, kept verbatim
    Raw(String),
}

/// Tree node in the arena-based document structure.
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    /// Index of parent node in the arena, None for detached nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena
    pub children: Vec<Index>,
}

/// Arena-based document tree.
///
/// Nodes are addressed by `generational_arena::Index`; mutation goes through
/// the arena, so callers collect indices first and never hold a live
/// iterator across edits. Detached subtrees stay allocated until the tree
/// is dropped; serialization walks from the root, so they never reappear
/// in output.
#[derive(Debug)]
pub struct Dom {
    arena: Arena<Node>,
    root: Index,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Node {
            kind: NodeKind::Document,
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    /// Parses a full document. Lenient: never fails, junk degrades to text.
    #[instrument(level = "trace", skip(input), fields(len = input.len()))]
    pub fn parse(input: &str) -> Self {
        let mut dom = Self::new();
        let top_level = parser::parse_nodes(&mut dom, input);
        for idx in top_level {
            dom.attach(dom.root, idx);
        }
        dom
    }

    /// Parses markup into this tree's arena without attaching it.
    ///
    /// Fragment parsing is identical to document parsing; the returned
    /// top-level indices are unparented until the caller grafts them.
    #[instrument(level = "trace", skip(self, input), fields(len = input.len()))]
    pub fn parse_fragment(&mut self, input: &str) -> Vec<Index> {
        parser::parse_nodes(self, input)
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn node(&self, idx: Index) -> Option<&Node> {
        self.arena.get(idx)
    }

    pub fn node_mut(&mut self, idx: Index) -> Option<&mut Node> {
        self.arena.get_mut(idx)
    }

    /// Allocates a node; attaches it under `parent` when given.
    pub fn insert_node(&mut self, kind: NodeKind, parent: Option<Index>) -> Index {
        let idx = self.arena.insert(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent_idx) = parent {
            if let Some(parent_node) = self.arena.get_mut(parent_idx) {
                parent_node.children.push(idx);
            }
        }
        idx
    }

    /// Appends `child` to `parent`'s children and sets its parent link.
    pub fn attach(&mut self, parent: Index, child: Index) {
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(child);
        }
    }

    /// Unlinks a node from its parent. The subtree stays in the arena but
    /// is no longer reachable from the root.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, idx: Index) {
        let Some(parent_idx) = self.node(idx).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_node) = self.arena.get_mut(parent_idx) {
            parent_node.children.retain(|&c| c != idx);
        }
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = None;
        }
    }

    /// Splices `replacements` into the parent at the node's position and
    /// unlinks the node. No-op for detached nodes.
    #[instrument(level = "trace", skip(self, replacements))]
    pub fn replace_with(&mut self, idx: Index, replacements: &[Index]) {
        let Some(parent_idx) = self.node(idx).and_then(|n| n.parent) else {
            return;
        };
        let Some(pos) = self
            .node(parent_idx)
            .and_then(|p| p.children.iter().position(|&c| c == idx))
        else {
            return;
        };
        for &replacement in replacements {
            if let Some(node) = self.arena.get_mut(replacement) {
                node.parent = Some(parent_idx);
            }
        }
        if let Some(parent_node) = self.arena.get_mut(parent_idx) {
            parent_node
                .children
                .splice(pos..=pos, replacements.iter().copied());
        }
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = None;
        }
    }

    pub fn children(&self, idx: Index) -> Vec<Index> {
        self.node(idx).map(|n| n.children.clone()).unwrap_or_default()
    }

    /// Tag name for element nodes, None otherwise.
    pub fn tag(&self, idx: Index) -> Option<&str> {
        match self.node(idx)?.kind {
            NodeKind::Element(ref el) => Some(el.tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, idx: Index) -> bool {
        matches!(self.node(idx), Some(n) if matches!(n.kind, NodeKind::Element(_)))
    }

    /// Element tag comparison, ASCII case-insensitive.
    pub fn is_element_named(&self, idx: Index, tag: &str) -> bool {
        self.tag(idx)
            .map(|t| t.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    pub fn attr(&self, idx: Index, name: &str) -> Option<&str> {
        match self.node(idx)?.kind {
            NodeKind::Element(ref el) => el.attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn attrs(&self, idx: Index) -> Option<&IndexMap<String, String>> {
        match self.node(idx)?.kind {
            NodeKind::Element(ref el) => Some(&el.attrs),
            _ => None,
        }
    }

    pub fn set_attr(&mut self, idx: Index, name: &str, value: &str) {
        if let Some(node) = self.arena.get_mut(idx) {
            if let NodeKind::Element(ref mut el) = node.kind {
                el.attrs.insert(name.to_string(), value.to_string());
            }
        }
    }

    /// Pre-order iterator over the whole document.
    pub fn iter(&self) -> DomIterator<'_> {
        DomIterator::new(self, self.root)
    }

    /// Pre-order iterator over a subtree, starting node included.
    pub fn descendants(&self, start: Index) -> DomIterator<'_> {
        DomIterator::new(self, start)
    }

    /// First element with the given tag, in document order.
    #[instrument(level = "trace", skip(self))]
    pub fn find_first(&self, tag: &str) -> Option<Index> {
        self.iter()
            .find(|&(idx, _)| self.is_element_named(idx, tag))
            .map(|(idx, _)| idx)
    }

    /// All elements with the given tag under `start`, in document order.
    pub fn collect_tagged(&self, start: Index, tag: &str) -> Vec<Index> {
        self.descendants(start)
            .filter(|&(idx, _)| self.is_element_named(idx, tag))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Serialized markup of a node's children.
    pub fn inner_html(&self, idx: Index) -> String {
        serialize::children_to_string(self, idx)
    }

    /// Serialized markup of a node, subtree included.
    pub fn outer_html(&self, idx: Index) -> String {
        serialize::node_to_string(self, idx)
    }

    /// Serialized markup of the whole document.
    pub fn serialize(&self) -> String {
        serialize::children_to_string(self, self.root)
    }
}

impl fmt::Display for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

pub struct DomIterator<'a> {
    dom: &'a Dom,
    stack: Vec<Index>,
}

impl<'a> DomIterator<'a> {
    fn new(dom: &'a Dom, start: Index) -> Self {
        Self {
            dom,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for DomIterator<'a> {
    type Item = (Index, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.dom.node(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current, node));
            }
        }
        None
    }
}
