//! Inline style state and the export styler
//!
//! The surface's visual state is two inline style maps: the outer
//! container and the inner snippet node. Exporting temporarily rewrites
//! both into a capture-ready layout; [`StyleRestore`] puts back exactly
//! what was changed, one property at a time.

use crate::settings::PresentationSettings;

/// Ordered CSS declarations (`name: value`) of one node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap {
    decls: Vec<(String, String)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute. Malformed declarations are skipped.
    pub fn parse(css: &str) -> Self {
        let mut map = Self::new();
        for decl in css.split(';') {
            if let Some((name, value)) = decl.split_once(':') {
                let name = name.trim();
                let value = value.trim();
                if !name.is_empty() && !value.is_empty() {
                    map.set(name, value);
                }
            }
        }
        map
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, keeping its original position when already present
    pub fn set(&mut self, name: &str, value: &str) {
        match self.decls.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.decls.push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.decls.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    /// Set when `Some`, remove when `None`
    pub fn assign(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(v) => self.set(name, v),
            None => self.remove(name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_css(&self) -> String {
        self.decls
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Which styled node a property belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTarget {
    Container,
    Snippet,
}

/// The visible style state of the surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub container: StyleMap,
    pub snippet: StyleMap,
}

impl Default for Layout {
    fn default() -> Self {
        let mut container = StyleMap::new();
        container.set("padding", "16px");
        container.set("display", "flex");
        container.set("opacity", "1");

        let mut snippet = StyleMap::new();
        snippet.set("border-radius", "6px");
        snippet.set("padding", "18px");
        snippet.set("border", "1px solid rgba(255, 255, 255, 0.08)");
        Self { container, snippet }
    }
}

impl Layout {
    pub fn node(&self, target: StyleTarget) -> &StyleMap {
        match target {
            StyleTarget::Container => &self.container,
            StyleTarget::Snippet => &self.snippet,
        }
    }

    pub fn node_mut(&mut self, target: StyleTarget) -> &mut StyleMap {
        match target {
            StyleTarget::Container => &mut self.container,
            StyleTarget::Snippet => &mut self.snippet,
        }
    }
}

/// Properties the export styler may touch, on both nodes
pub const SNAPSHOT_PROPERTIES: &[&str] = &[
    "background",
    "border",
    "padding",
    "width",
    "height",
    "display",
    "text-align",
    "opacity",
    "margin",
];

/// Rewrites the surface into a capture-ready layout
#[derive(Debug, Clone)]
pub struct ExportStyler {
    /// Symmetric padding around the snippet in the export, in pixels
    pub padding_px: u32,
}

impl Default for ExportStyler {
    fn default() -> Self {
        Self { padding_px: 32 }
    }
}

impl ExportStyler {
    pub fn new(padding_px: u32) -> Self {
        Self { padding_px }
    }

    /// Snapshot every property about to change, then apply the export layout.
    ///
    /// The returned value must be restored exactly once on every exit path
    /// of the caller.
    pub fn apply(&self, layout: &mut Layout, settings: &PresentationSettings) -> StyleRestore {
        let mut saved = Vec::with_capacity(SNAPSHOT_PROPERTIES.len() * 2);
        for target in [StyleTarget::Container, StyleTarget::Snippet] {
            let node = layout.node(target);
            for prop in SNAPSHOT_PROPERTIES {
                saved.push(SavedProperty {
                    target,
                    name: *prop,
                    value: node.get(prop).map(str::to_string),
                });
            }
        }

        let background = settings.resolved_background().to_css();
        let padding = format!("{}px", self.padding_px);

        let container = &mut layout.container;
        container.set("background", &background);
        container.set("border", "none");
        container.set("padding", &padding);
        container.set("width", "fit-content");
        container.set("height", "fit-content");
        container.set("display", "inline-block");
        container.set("opacity", "1");
        container.set("margin", "0");

        let snippet = &mut layout.snippet;
        snippet.set("width", "auto");
        snippet.set("height", "auto");
        snippet.set("display", "block");
        snippet.set("margin", "0 auto");
        snippet.set("text-align", "left");
        snippet.set("border", "none");
        snippet.set("opacity", "1");

        log::debug!("export layout applied (background: {})", background);

        StyleRestore {
            saved,
            restored: false,
        }
    }
}

#[derive(Debug, Clone)]
struct SavedProperty {
    target: StyleTarget,
    name: &'static str,
    value: Option<String>,
}

/// Snapshot taken by [`ExportStyler::apply`]
#[derive(Debug, Clone)]
pub struct StyleRestore {
    saved: Vec<SavedProperty>,
    restored: bool,
}

impl StyleRestore {
    /// Put every snapshotted property back. Later calls are no-ops.
    pub fn restore(&mut self, layout: &mut Layout) {
        if self.restored {
            return;
        }
        for prop in &self.saved {
            layout
                .node_mut(prop.target)
                .assign(prop.name, prop.value.as_deref());
        }
        self.restored = true;
        log::debug!("export layout restored ({} properties)", self.saved.len());
    }

    pub fn is_restored(&self) -> bool {
        self.restored
    }
}
