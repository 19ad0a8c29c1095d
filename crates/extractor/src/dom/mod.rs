// ABOUTME: DOM helpers shared by the extraction engines: text metrics and filtered serialization.
// ABOUTME: Submodules hold readability scoring, article cleaning and <br> paragraph repair.

//! DOM utilities for HTML document inspection and rewriting.
//!
//! scraper trees are immutable, so cleaning works by computing a set of node
//! ids to drop (and tags to rename) and re-serializing the tree with
//! [`serialize_children`].

pub mod brs;
pub mod cleaners;
pub mod scoring;

use std::collections::{HashMap, HashSet};

use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Node, Selector};

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-normalized text of an element.
pub fn element_text(element: &ElementRef) -> String {
    normalize_spaces(&element.text().collect::<Vec<_>>().join(" "))
}

/// Ratio of link text to total text inside an element.
pub fn link_density(element: &ElementRef) -> f64 {
    let total_len = element.text().map(str::len).sum::<usize>();
    if total_len == 0 {
        return 0.0;
    }

    let link_len: usize = element
        .select(&ANCHOR_SELECTOR)
        .map(|a| a.text().map(str::len).sum::<usize>())
        .sum();

    link_len as f64 / total_len as f64
}

/// Whether text ends the way a sentence does.
pub fn has_sentence_end(text: &str) -> bool {
    matches!(
        text.trim_end().chars().last(),
        Some('.' | '!' | '?' | ':' | ';')
    )
}

pub(crate) fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn is_void_element(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Rewrite plan applied while serializing a tree.
#[derive(Debug, Default)]
pub struct Rewrite<'a> {
    /// Nodes dropped together with their subtrees.
    pub skip: HashSet<NodeId>,
    /// Elements emitted under a different tag name.
    pub rename: HashMap<NodeId, &'static str>,
    /// When set, only these attribute names survive.
    pub keep_attrs: Option<&'a [&'a str]>,
}

impl Rewrite<'_> {
    fn keeps_attr(&self, name: &str) -> bool {
        self.keep_attrs
            .map_or(true, |allowed| allowed.iter().any(|a| a.eq_ignore_ascii_case(name)))
    }
}

/// Serialize the children of `node` applying `rewrite`.
pub fn serialize_children(node: NodeRef<Node>, rewrite: &Rewrite, out: &mut String) {
    for child in node.children() {
        serialize_node(child, rewrite, out);
    }
}

/// Serialize `node` and its subtree applying `rewrite`.
pub fn serialize_node(node: NodeRef<Node>, rewrite: &Rewrite, out: &mut String) {
    if rewrite.skip.contains(&node.id()) {
        return;
    }

    match node.value() {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(el) => {
            let tag: &str = match rewrite.rename.get(&node.id()) {
                Some(renamed) => renamed,
                None => el.name(),
            };
            out.push('<');
            out.push_str(tag);
            for (name, value) in el.attrs() {
                if !rewrite.keeps_attr(name) {
                    continue;
                }
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            if is_void_element(tag) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            serialize_children(node, rewrite, out);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        _ => {}
    }
}
