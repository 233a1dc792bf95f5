//! Character-grid layout of a capture region
//!
//! Every character occupies one fixed cell. Block elements (`div`, `p`)
//! and `br` start new rows; text keeps its whitespace as in `white-space: pre`.

use crate::markup::{Element, Fragment, Node};
use crate::rendering::paint::{parse_color, Rgba, DEFAULT_PANEL, DEFAULT_TEXT};

pub const CELL_WIDTH: u32 = 8;
pub const CELL_HEIGHT: u32 = 20;
/// Space between the snippet panel and the footer
pub const FOOTER_GAP: u32 = 8;
const TAB_WIDTH: u32 = 4;

const DEFAULT_CONTAINER_PADDING: u32 = 16;
const DEFAULT_SNIPPET_PADDING: u32 = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub col: u32,
    pub row: u32,
    pub color: Rgba,
}

/// Visible characters of a block of text on the cell grid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextGrid {
    pub columns: u32,
    pub rows: u32,
    pub glyphs: Vec<Glyph>,
}

impl TextGrid {
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.columns * CELL_WIDTH, self.rows * CELL_HEIGHT)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionLayout {
    pub container_padding: u32,
    pub snippet_padding: u32,
    pub panel_color: Rgba,
    pub snippet: TextGrid,
    /// Anything in the container after the snippet (attribution)
    pub footer: Option<TextGrid>,
}

impl RegionLayout {
    /// Size of the snippet panel including its padding
    pub fn panel_size(&self) -> (u32, u32) {
        let (w, h) = self.snippet.pixel_size();
        (
            w.max(CELL_WIDTH) + self.snippet_padding * 2,
            h.max(CELL_HEIGHT) + self.snippet_padding * 2,
        )
    }

    /// Size of the whole image in CSS pixels
    pub fn size(&self) -> (u32, u32) {
        let (panel_w, panel_h) = self.panel_size();
        let (footer_w, footer_h) = match &self.footer {
            Some(grid) => {
                let (w, h) = grid.pixel_size();
                (w, h + FOOTER_GAP)
            }
            None => (0, 0),
        };
        let pad = self.container_padding * 2;
        (panel_w.max(footer_w) + pad, panel_h + footer_h + pad)
    }
}

/// Lay out a region built by the surface: a container holding a
/// `#snippet` element and optional trailing blocks. Elements matching
/// `exclude` are skipped with their subtree.
pub fn layout_region(region: &Fragment, exclude: fn(&Element) -> bool) -> RegionLayout {
    let container = region.elements().find(|el| !exclude(el));

    let container_padding = container
        .and_then(|el| px_value(el.style().get("padding")?))
        .unwrap_or(DEFAULT_CONTAINER_PADDING);

    let snippet = container.and_then(|el| find_by_id(el, "snippet"));
    let snippet_padding = snippet
        .and_then(|el| px_value(el.style().get("padding")?))
        .unwrap_or(DEFAULT_SNIPPET_PADDING);
    let panel_color = snippet.and_then(find_background).unwrap_or(DEFAULT_PANEL);

    let snippet_grid = match snippet {
        Some(el) => grid_of(&el.children, exclude),
        None => TextGrid::default(),
    };

    let footer_nodes: Vec<Node> = container
        .map(|el| {
            el.children
                .iter()
                .filter(|n| match n {
                    Node::Element(child) => child.attr("id") != Some("snippet"),
                    Node::Text(t) => !t.trim().is_empty(),
                })
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    let footer = Some(grid_of(&footer_nodes, exclude)).filter(|g| !g.glyphs.is_empty());

    RegionLayout {
        container_padding,
        snippet_padding,
        panel_color,
        snippet: snippet_grid,
        footer,
    }
}

/// First number of a length list such as `32px` or `16px 8px`
fn px_value(value: &str) -> Option<u32> {
    let first = value.split_whitespace().next()?;
    let number = first.strip_suffix("px").unwrap_or(first);
    number.parse::<f32>().ok().map(|n| n.max(0.0).round() as u32)
}

fn find_by_id<'a>(el: &'a Element, id: &str) -> Option<&'a Element> {
    if el.attr("id") == Some(id) {
        return Some(el);
    }
    el.child_elements().find_map(|child| find_by_id(child, id))
}

/// The snippet's own background, or the first one declared inside it
fn find_background(el: &Element) -> Option<Rgba> {
    let style = el.style();
    let own = style
        .get("background-color")
        .or_else(|| style.get("background"))
        .and_then(parse_color);
    own.or_else(|| el.child_elements().find_map(find_background))
}

struct Cursor {
    col: u32,
    row: u32,
    grid: TextGrid,
}

impl Cursor {
    fn newline(&mut self) {
        self.row += 1;
        self.col = 0;
    }

    fn text(&mut self, text: &str, color: Rgba) {
        for c in text.chars() {
            match c {
                '\n' => self.newline(),
                '\r' => {}
                '\t' => self.col += TAB_WIDTH - self.col % TAB_WIDTH,
                c if c.is_whitespace() => self.col += 1,
                _ => {
                    self.grid.glyphs.push(Glyph {
                        col: self.col,
                        row: self.row,
                        color,
                    });
                    self.col += 1;
                }
            }
            self.grid.columns = self.grid.columns.max(self.col);
        }
    }
}

fn grid_of(nodes: &[Node], exclude: fn(&Element) -> bool) -> TextGrid {
    let mut cursor = Cursor {
        col: 0,
        row: 0,
        grid: TextGrid::default(),
    };
    for node in nodes {
        walk(node, DEFAULT_TEXT, exclude, &mut cursor);
    }
    let mut grid = cursor.grid;
    grid.rows = cursor.row + u32::from(cursor.col > 0);
    grid
}

fn is_block(name: &str) -> bool {
    matches!(name, "div" | "p" | "pre" | "li" | "h1" | "h2" | "h3")
}

fn walk(node: &Node, color: Rgba, exclude: fn(&Element) -> bool, cursor: &mut Cursor) {
    match node {
        Node::Text(text) => cursor.text(text, color),
        Node::Element(el) => {
            if exclude(el) {
                return;
            }
            if el.name == "br" {
                cursor.newline();
                return;
            }
            let color = el.style().get("color").and_then(parse_color).unwrap_or(color);
            let block = is_block(&el.name);
            if block && cursor.col > 0 {
                cursor.newline();
            }
            for child in &el.children {
                walk(child, color, exclude, cursor);
            }
            if block && cursor.col > 0 {
                cursor.newline();
            }
        }
    }
}
