//! Tokenizing parser for HTML-like text
//!
//! One pass over the input bytes. All structural characters are ASCII, so
//! byte offsets found by scanning are always valid char boundaries and the
//! source slices carried into text nodes stay verbatim. Junk degrades to
//! text instead of failing: a stray `<`, an end tag with no matching open
//! element, or a tag cut off by end of input all land in the output
//! unchanged or as close to unchanged as nesting allows.

use generational_arena::Index;
use indexmap::IndexMap;

use super::{is_opaque, is_void, Dom, ElementData, NodeKind};

/// Parses `input`, allocating nodes into `dom`'s arena. Returns the
/// top-level node indices, unattached.
pub(crate) fn parse_nodes(dom: &mut Dom, input: &str) -> Vec<Index> {
    Parser {
        dom,
        input,
        pos: 0,
        roots: Vec::new(),
        stack: Vec::new(),
    }
    .run()
}

struct Parser<'a, 'd> {
    dom: &'d mut Dom,
    input: &'a str,
    pos: usize,
    /// Top-level nodes produced so far
    roots: Vec<Index>,
    /// Open elements awaiting their end tag
    stack: Vec<Index>,
}

fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':')
}

/// Case-insensitive search for `needle` in `haystack` starting at `from`.
/// Both sides are treated as bytes; `needle` must be ASCII.
fn find_ignore_case(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

impl<'a, 'd> Parser<'a, 'd> {
    fn run(mut self) -> Vec<Index> {
        let bytes = self.input.as_bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos..].iter().position(|&b| b == b'<') {
                None => {
                    self.emit_text(self.pos, bytes.len());
                    self.pos = bytes.len();
                }
                Some(offset) => {
                    if offset > 0 {
                        self.emit_text(self.pos, self.pos + offset);
                        self.pos += offset;
                    }
                    self.consume_markup();
                }
            }
        }
        self.roots
    }

    /// `pos` is at `<`; dispatch on the following byte.
    fn consume_markup(&mut self) {
        let bytes = self.input.as_bytes();
        let lt = self.pos;
        match bytes.get(lt + 1) {
            None => {
                self.emit_text(lt, bytes.len());
                self.pos = bytes.len();
            }
            Some(b'/') => self.consume_end_tag(),
            Some(b'!') => self.consume_declaration(),
            Some(b'?') => self.consume_raw_until_gt(),
            Some(b) if b.is_ascii_alphabetic() => self.consume_start_tag(),
            Some(_) => {
                // Literal '<' in text
                self.emit_text(lt, lt + 1);
                self.pos = lt + 1;
            }
        }
    }

    fn consume_start_tag(&mut self) {
        let bytes = self.input.as_bytes();
        let lt = self.pos;
        let name_start = lt + 1;
        let mut i = name_start;
        while i < bytes.len() && is_tag_name_byte(bytes[i]) {
            i += 1;
        }
        let tag = &self.input[name_start..i];

        let mut attrs: IndexMap<String, String> = IndexMap::new();
        let mut self_closing = false;
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                None => {
                    // Tag cut off by end of input; keep the source as text
                    self.emit_text(lt, bytes.len());
                    self.pos = bytes.len();
                    return;
                }
                Some(b'>') => {
                    i += 1;
                    break;
                }
                Some(b'/') => {
                    if bytes.get(i + 1) == Some(&b'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                Some(_) => match self.scan_attribute(i) {
                    Some((next, name, value)) => {
                        attrs.insert(name, value);
                        i = next;
                    }
                    None => {
                        self.emit_text(lt, bytes.len());
                        self.pos = bytes.len();
                        return;
                    }
                },
            }
        }
        self.pos = i;

        let element = NodeKind::Element(ElementData {
            tag: tag.to_string(),
            attrs,
            self_closing,
        });
        let idx = self.append_node(element);

        if self_closing || is_void(tag) {
            return;
        }
        if is_opaque(tag) {
            self.consume_raw_text(idx, tag);
            return;
        }
        self.stack.push(idx);
    }

    /// Scans one attribute starting at `i` (not whitespace, `>` or `/`).
    /// Returns None when the input ends mid-attribute.
    fn scan_attribute(&self, mut i: usize) -> Option<(usize, String, String)> {
        let bytes = self.input.as_bytes();
        let name_start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'>' | b'/')
        {
            i += 1;
        }
        let mut name = &self.input[name_start..i];
        if name.is_empty() {
            // Stray '=' before any name; consume it so scanning advances
            name = &self.input[i..i + 1];
            i += 1;
        }
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            return Some((i, name.to_string(), String::new()));
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let value = match bytes.get(i) {
            None => return None,
            Some(&(quote @ (b'"' | b'\''))) => {
                let value_start = i + 1;
                let end = bytes[value_start..]
                    .iter()
                    .position(|&b| b == quote)
                    .map(|p| value_start + p)?;
                i = end + 1;
                &self.input[value_start..end]
            }
            Some(b'>') => "",
            Some(_) => {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &self.input[value_start..i]
            }
        };
        Some((i, name.to_string(), value.to_string()))
    }

    fn consume_end_tag(&mut self) {
        let bytes = self.input.as_bytes();
        let lt = self.pos;
        let name_start = lt + 2;
        if !matches!(bytes.get(name_start), Some(b) if b.is_ascii_alphabetic()) {
            // "</" not followed by a name stays literal text
            self.emit_text(lt, name_start.min(bytes.len()));
            self.pos = name_start.min(bytes.len());
            return;
        }
        let mut i = name_start;
        while i < bytes.len() && is_tag_name_byte(bytes[i]) {
            i += 1;
        }
        let tag = &self.input[name_start..i];
        match bytes[i..].iter().position(|&b| b == b'>') {
            None => {
                self.emit_text(lt, bytes.len());
                self.pos = bytes.len();
                return;
            }
            Some(offset) => self.pos = i + offset + 1,
        }
        // Close the nearest matching open element; ignore stray end tags.
        // Anything above the match is implicitly closed.
        if let Some(open) = self
            .stack
            .iter()
            .rposition(|&idx| self.dom.is_element_named(idx, tag))
        {
            self.stack.truncate(open);
        }
    }

    fn consume_declaration(&mut self) {
        let bytes = self.input.as_bytes();
        let lt = self.pos;
        if self.input[lt..].starts_with("<!--") {
            let content_start = lt + 4;
            match self.input[content_start..].find("-->") {
                Some(rel) => {
                    let end = content_start + rel;
                    let comment = self.input[content_start..end].to_string();
                    self.append_node(NodeKind::Comment(comment));
                    self.pos = end + 3;
                }
                None => {
                    let comment = self.input[content_start..].to_string();
                    self.append_node(NodeKind::Comment(comment));
                    self.pos = bytes.len();
                }
            }
            return;
        }
        self.consume_raw_until_gt();
    }

    /// Doctype, processing instructions and other bogus markup: kept
    /// verbatim through `>`.
    fn consume_raw_until_gt(&mut self) {
        let bytes = self.input.as_bytes();
        let lt = self.pos;
        let end = match bytes[lt..].iter().position(|&b| b == b'>') {
            Some(offset) => lt + offset + 1,
            None => bytes.len(),
        };
        let raw = self.input[lt..end].to_string();
        self.append_node(NodeKind::Raw(raw));
        self.pos = end;
    }

    /// Content of an opaque element: a single raw text child ending at the
    /// matching end tag (case-insensitive), or at end of input.
    fn consume_raw_text(&mut self, parent: Index, tag: &str) {
        let bytes = self.input.as_bytes();
        let needle = format!("</{}", tag);
        let mut search_from = self.pos;
        loop {
            match find_ignore_case(bytes, needle.as_bytes(), search_from) {
                Some(at) => {
                    let boundary = bytes.get(at + needle.len());
                    let is_close = match boundary {
                        None => true,
                        Some(b) => b.is_ascii_whitespace() || matches!(b, b'>' | b'/'),
                    };
                    if !is_close {
                        // e.g. "</script2>" inside a script body
                        search_from = at + 1;
                        continue;
                    }
                    if at > self.pos {
                        let text = self.input[self.pos..at].to_string();
                        self.dom.insert_node(NodeKind::Text(text), Some(parent));
                    }
                    self.pos = match bytes[at..].iter().position(|&b| b == b'>') {
                        Some(offset) => at + offset + 1,
                        None => bytes.len(),
                    };
                    return;
                }
                None => {
                    if self.pos < bytes.len() {
                        let text = self.input[self.pos..].to_string();
                        self.dom.insert_node(NodeKind::Text(text), Some(parent));
                    }
                    self.pos = bytes.len();
                    return;
                }
            }
        }
    }

    /// Text node from a byte range of the input.
    fn emit_text(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let text = self.input[start..end].to_string();
        self.append_node(NodeKind::Text(text));
    }

    /// Attaches a node under the innermost open element, or records it as a
    /// top-level node.
    fn append_node(&mut self, kind: NodeKind) -> Index {
        match self.stack.last().copied() {
            Some(parent) => self.dom.insert_node(kind, Some(parent)),
            None => {
                let idx = self.dom.insert_node(kind, None);
                self.roots.push(idx);
                idx
            }
        }
    }
}
