//! Serialization back to markup
//!
//! Text, comments and raw nodes come back verbatim. Tags are rebuilt from
//! the element data, so attribute spacing and quoting are canonicalized:
//! double quotes, one space between attributes, bare names for empty
//! values. Double quotes inside a value are the only thing escaped.

use std::borrow::Cow;
use std::fmt::Write;

use generational_arena::Index;

use super::{is_void, Dom, ElementData, NodeKind};

/// Serializes the node itself, including its descendants.
pub(crate) fn node_to_string(dom: &Dom, idx: Index) -> String {
    let mut out = String::new();
    write_node(dom, idx, &mut out);
    out
}

/// Serializes the children of `idx` without the node itself.
pub(crate) fn children_to_string(dom: &Dom, idx: Index) -> String {
    let mut out = String::new();
    if let Some(node) = dom.node(idx) {
        for &child in &node.children {
            write_node(dom, child, &mut out);
        }
    }
    out
}

fn write_node(dom: &Dom, idx: Index, out: &mut String) {
    let Some(node) = dom.node(idx) else {
        return;
    };
    match &node.kind {
        NodeKind::Document => {
            for &child in &node.children {
                write_node(dom, child, out);
            }
        }
        NodeKind::Element(data) => write_element(dom, &node.children, data, out),
        NodeKind::Text(text) | NodeKind::Raw(text) => out.push_str(text),
        NodeKind::Comment(text) => {
            let _ = write!(out, "<!--{}-->", text);
        }
    }
}

fn write_element(dom: &Dom, children: &[Index], data: &ElementData, out: &mut String) {
    out.push('<');
    out.push_str(&data.tag);
    for (name, value) in &data.attrs {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            let _ = write!(out, "=\"{}\"", escape_attr(value));
        }
    }
    if data.self_closing {
        out.push_str("/>");
        return;
    }
    out.push('>');
    if is_void(&data.tag) {
        return;
    }
    for &child in children {
        write_node(dom, child, out);
    }
    let _ = write!(out, "</{}>", data.tag);
}

fn escape_attr(value: &str) -> Cow<'_, str> {
    if value.contains('"') {
        Cow::Owned(value.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}
