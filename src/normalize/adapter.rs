//! Mapping between an upstream rich-markup shape and snippet lines
//!
//! The normalizer never walks markup itself. It asks a [`LineAdapter`] for
//! the line containers of a payload and for the text run that carries each
//! line's leading whitespace, so other copy formats can be supported by
//! swapping the adapter.

use crate::markup::{Element, Fragment, Node};
use crate::style::StyleMap;

pub trait LineAdapter: Send + Sync {
    /// Line containers of a parsed payload, in document order
    fn lines_mut<'a>(&self, fragment: &'a mut Fragment) -> Vec<&'a mut Element>;

    /// The text run holding a line's leading whitespace, if any
    fn leading_text_mut<'a>(&self, line: &'a mut Element) -> Option<&'a mut String> {
        line.first_text_mut()
    }

    /// Build a fragment in this adapter's shape from plain lines
    fn synthesize(&self, lines: &[String]) -> Fragment;
}

/// The editor's "copy with syntax highlighting" format.
///
/// ```text
/// <div style="...">            outer container
///   <div><span>  fn</span>...  one div per line
///   <div><br></div>            empty line
/// </div>
/// ```
///
/// Assumes every line renders its leading whitespace inside a single
/// leading text run (the first `span`, or a bare text node).
#[derive(Debug, Clone, Default)]
pub struct EditorLineAdapter;

impl EditorLineAdapter {
    /// Inline style of synthesized snippets, matching the welcome content
    pub fn base_style() -> StyleMap {
        let mut style = StyleMap::new();
        style.set("color", "#d8dee9");
        style.set("background-color", "#2e3440");
        style.set("font-family", MONO_FONT_STACK);
        style.set("font-weight", "normal");
        style.set("font-size", "13px");
        style.set("line-height", "20px");
        style.set("white-space", "pre");
        style
    }
}

pub const MONO_FONT_STACK: &str = "'SF Mono', SFMono-Regular, Consolas, 'DejaVu Sans Mono', \
     Ubuntu Mono, 'Liberation Mono', Menlo, Courier, monospace";

impl LineAdapter for EditorLineAdapter {
    fn lines_mut<'a>(&self, fragment: &'a mut Fragment) -> Vec<&'a mut Element> {
        fragment
            .elements_mut()
            .filter(|el| el.name == "div")
            .flat_map(|outer| outer.child_elements_mut().filter(|el| el.name == "div"))
            .collect()
    }

    fn synthesize(&self, lines: &[String]) -> Fragment {
        let mut outer = Element::new("div").with_style(&Self::base_style());
        for line in lines {
            let row = if line.is_empty() {
                Element::new("div").with_child(Node::Element(Element::new("br")))
            } else {
                Element::new("div").with_child(Node::Element(Element::new("span").with_text(line)))
            };
            outer.children.push(Node::Element(row));
        }
        Fragment {
            nodes: vec![Node::Element(outer)],
        }
    }
}
