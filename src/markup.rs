//! Owned markup tree for snippet content
//!
//! Clipboard markup is parsed with `scraper` and copied into this small
//! tree so it can be edited (indent stripping, line numbers) and written
//! back out. Only elements and text survive the copy; comments, doctypes
//! and head-only elements are dropped.

use crate::style::StyleMap;
use crate::{Error, Result};
use scraper::{ElementRef, Html};

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements that never contribute visible snippet content
const DROPPED_ELEMENTS: &[&str] = &["meta", "style", "script", "title", "link", "head"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// A parsed fragment: the top-level nodes of a pasted payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    /// Parse an HTML fragment.
    ///
    /// Fails when the input contains no element at all, which is how
    /// clipboard payloads that are not markup show up.
    pub fn parse(html: &str) -> Result<Self> {
        let document = Html::parse_fragment(html);
        let nodes = convert_children(document.root_element());

        if !nodes.iter().any(|n| matches!(n, Node::Element(_))) {
            return Err(Error::InvalidPaste(format!(
                "no markup elements found ({} parse errors)",
                document.errors.len()
            )));
        }

        Ok(Self { nodes })
    }

    /// Top-level elements, skipping whitespace text between them
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(Node::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.nodes.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out);
        }
        out
    }
}

fn convert_children(parent: ElementRef<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        match child.value() {
            scraper::Node::Text(text) => nodes.push(Node::Text((&**text).to_owned())),
            scraper::Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child).and_then(convert_element) {
                    nodes.push(Node::Element(el));
                }
            }
            _ => {}
        }
    }
    nodes
}

fn convert_element(el: ElementRef<'_>) -> Option<Element> {
    let name = el.value().name().to_ascii_lowercase();
    if DROPPED_ELEMENTS.contains(&name.as_str()) {
        return None;
    }
    Some(Element {
        name,
        attrs: el
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children: convert_children(el),
    })
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Element(el) => el.text_content(),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&escape_text(t)),
            Node::Element(el) => el.write_html(out),
        }
    }
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_style(mut self, style: &StyleMap) -> Self {
        self.set_style(style);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_child(Node::Text(text.to_string()))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Inline style parsed from the `style` attribute
    pub fn style(&self) -> StyleMap {
        self.attr("style").map(StyleMap::parse).unwrap_or_default()
    }

    pub fn set_style(&mut self, style: &StyleMap) {
        if style.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", &style.to_css());
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }

    /// First text node in document order, descending into the first
    /// element child that has any text
    pub fn first_text_mut(&mut self) -> Option<&mut String> {
        for child in self.children.iter_mut() {
            match child {
                Node::Text(t) => return Some(t),
                Node::Element(el) => {
                    if let Some(t) = el.first_text_mut() {
                        return Some(t);
                    }
                }
            }
        }
        None
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape_attr(v));
            out.push('"');
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.name.as_str()) {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}
