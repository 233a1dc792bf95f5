//! Paste normalization
//!
//! Turns a clipboard payload (rich markup plus plain text) into snippet
//! content with the common indentation of the selection removed.

pub mod adapter;
pub mod indent;

pub use adapter::{EditorLineAdapter, LineAdapter};
pub use indent::{strip_chars, IndentProfile};

use crate::markup::Fragment;
use crate::Result;
use regex::Regex;
use std::sync::OnceLock;

/// Lines longer than this are cut in the plain-text fallback
pub const MAX_LINE_CHARS: usize = 120;

/// Both representations a clipboard paste may carry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub html: Option<String>,
    pub text: Option<String>,
}

impl ClipboardPayload {
    pub fn new(html: Option<String>, text: Option<String>) -> Self {
        Self { html, text }
    }

    fn rich(&self) -> Option<&str> {
        self.html.as_deref().filter(|h| !h.trim().is_empty())
    }

    fn plain(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOutcome {
    /// Normalized snippet markup
    pub content: String,
    /// Background color declared by the rich payload, if any
    pub background: Option<String>,
    pub indent: IndentProfile,
}

pub struct PasteNormalizer {
    adapter: Box<dyn LineAdapter>,
    max_line_chars: usize,
}

impl Default for PasteNormalizer {
    fn default() -> Self {
        Self::new(Box::new(EditorLineAdapter))
    }
}

impl std::fmt::Debug for PasteNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasteNormalizer")
            .field("max_line_chars", &self.max_line_chars)
            .finish_non_exhaustive()
    }
}

impl PasteNormalizer {
    pub fn new(adapter: Box<dyn LineAdapter>) -> Self {
        Self {
            adapter,
            max_line_chars: MAX_LINE_CHARS,
        }
    }

    pub fn with_max_line_chars(mut self, max: usize) -> Self {
        self.max_line_chars = max;
        self
    }

    pub fn adapter(&self) -> &dyn LineAdapter {
        self.adapter.as_ref()
    }

    /// Normalize a paste.
    ///
    /// Returns `Ok(None)` when the payload carries nothing usable; the
    /// caller keeps its current content in that case. A rich payload that
    /// is not markup fails with [`crate::Error::InvalidPaste`].
    pub fn normalize(&self, payload: &ClipboardPayload) -> Result<Option<PasteOutcome>> {
        let indent = payload
            .plain()
            .map(IndentProfile::from_plain_text)
            .unwrap_or_default();

        if let Some(html) = payload.rich() {
            let mut fragment = Fragment::parse(html)?;
            if !indent.is_zero() {
                self.strip_indent(&mut fragment, indent);
            }
            log::debug!("normalized rich paste (indent {})", indent.0);
            return Ok(Some(PasteOutcome {
                content: fragment.to_html(),
                background: detect_background_color(html),
                indent,
            }));
        }

        if let Some(text) = payload.plain() {
            let lines: Vec<String> = text
                .lines()
                .map(|line| self.prepare_plain_line(line, indent))
                .collect();
            log::debug!("synthesized snippet from {} plain lines", lines.len());
            return Ok(Some(PasteOutcome {
                content: self.adapter.synthesize(&lines).to_html(),
                background: None,
                indent,
            }));
        }

        Ok(None)
    }

    fn strip_indent(&self, fragment: &mut Fragment, indent: IndentProfile) {
        for line in self.adapter.lines_mut(fragment) {
            if let Some(text) = self.adapter.leading_text_mut(line) {
                *text = strip_chars(text, indent.0);
            }
        }
    }

    fn prepare_plain_line(&self, line: &str, indent: IndentProfile) -> String {
        if line.trim().is_empty() {
            return String::new();
        }
        let line = strip_chars(line, indent.0);
        if line.chars().count() > self.max_line_chars {
            let mut cut: String = line.chars().take(self.max_line_chars).collect();
            cut.push('…');
            cut
        } else {
            line
        }
    }
}

/// First `background-color: #hex` declaration in a markup payload
pub fn detect_background_color(html: &str) -> Option<String> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"background-color:\s*(#[a-fA-F0-9]+)").ok())
        .as_ref()?
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
