//! The presentation surface
//!
//! Owns the snippet content, the visible style state and the capture
//! pipeline. All mutable state lives in one [`SurfaceState`] behind a
//! mutex that is never held across an `.await`.

use crate::bridge::{HostMessage, Outbox, PresentationMessage};
use crate::capture::{
    rasterize_checked, CaptureMode, CaptureOutcome, CapturePhase, CaptureRequest, Rasterizer,
};
use crate::clipboard::{ClipboardSink, RgbaImage};
use crate::markup::{Element, Fragment, Node};
use crate::normalize::adapter::MONO_FONT_STACK;
use crate::normalize::{ClipboardPayload, LineAdapter, PasteNormalizer};
use crate::serialize::{to_base64, SerializedImage};
use crate::settings::{BackgroundKind, GradientStops, PresentationSettings};
use crate::style::{ExportStyler, Layout, StyleMap, StyleRestore};
use crate::{Error, Result, SurfaceConfig};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Resting label of the export button
pub const DEFAULT_LABEL: &str = "Save as PNG";

/// Everything the surface knows, in one place
#[derive(Debug, Clone)]
pub struct SurfaceState {
    content: String,
    saved_content: Option<String>,
    settings: PresentationSettings,
    layout: Layout,
    label: String,
    label_generation: u64,
    phase: CapturePhase,
    font_family: String,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            content: String::new(),
            saved_content: None,
            settings: PresentationSettings::default(),
            layout: Layout::default(),
            label: DEFAULT_LABEL.to_string(),
            label_generation: 0,
            phase: CapturePhase::Idle,
            font_family: String::new(),
        }
    }
}

impl SurfaceState {
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the content and remember it as the state to restore
    pub fn set_content(&mut self, content: String) {
        self.saved_content = Some(content.clone());
        self.content = content;
    }

    pub fn saved_content(&self) -> Option<&str> {
        self.saved_content.as_deref()
    }

    pub fn settings(&self) -> &PresentationSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PresentationSettings {
        &mut self.settings
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Change the button label; returns the generation that now owns it
    pub fn set_label(&mut self, label: &str) -> u64 {
        self.label = label.to_string();
        self.label_generation += 1;
        self.label_generation
    }

    pub fn label_generation(&self) -> u64 {
        self.label_generation
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == CapturePhase::Capturing
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn set_font_family(&mut self, font_family: &str) {
        self.font_family = font_family.to_string();
    }

    /// Apply a snippet background color detected in pasted markup
    pub fn set_snippet_background(&mut self, color: &str) {
        self.layout.snippet.set("background-color", color);
    }

    /// Push the settings that live on the snippet node into its style
    fn sync_snippet_style(&mut self) {
        let shadow = self.settings.shadow.clone();
        let ligatures = if self.settings.ligatures_enabled {
            "normal"
        } else {
            "none"
        };
        let snippet = &mut self.layout.snippet;
        if shadow.is_empty() {
            snippet.remove("box-shadow");
        } else {
            snippet.set("box-shadow", &shadow);
        }
        snippet.set("font-variant-ligatures", ligatures);
    }
}

/// Handle to the presentation surface. Clones share the same state.
#[derive(Clone)]
pub struct Surface {
    state: Arc<Mutex<SurfaceState>>,
    rasterizer: Arc<dyn Rasterizer>,
    clipboard: Arc<dyn ClipboardSink>,
    normalizer: Arc<PasteNormalizer>,
    styler: ExportStyler,
    outbox: Outbox<PresentationMessage>,
    config: SurfaceConfig,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Surface {
    pub fn new(
        config: SurfaceConfig,
        rasterizer: Arc<dyn Rasterizer>,
        clipboard: Arc<dyn ClipboardSink>,
        outbox: Outbox<PresentationMessage>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState::default())),
            rasterizer,
            clipboard,
            normalizer: Arc::new(PasteNormalizer::default()),
            styler: ExportStyler::new(config.export_padding_px),
            outbox,
            config,
        }
    }

    /// Use a different paste normalizer (for another upstream copy format)
    pub fn with_normalizer(mut self, normalizer: PasteNormalizer) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SurfaceState {
        self.lock().clone()
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Ask the host for persisted settings
    pub fn start(&self) -> Result<()> {
        self.outbox.send(PresentationMessage::GetAndUpdateCacheAndSettings)
    }

    /// Process host messages until the host goes away.
    ///
    /// Save requests run as their own task so settings updates keep
    /// flowing while a capture is in flight.
    pub async fn run(self, mut inbox: tokio::sync::mpsc::UnboundedReceiver<HostMessage>) -> Result<()> {
        self.start()?;
        while let Some(msg) = inbox.recv().await {
            match msg {
                HostMessage::Save => {
                    let surface = self.clone();
                    tokio::spawn(async move {
                        surface.capture(CaptureMode::Save).await;
                    });
                }
                other => self.handle_host_message(other).await?,
            }
        }
        log::debug!("host channel closed, surface stopping");
        Ok(())
    }

    /// Apply one message from the host
    pub async fn handle_host_message(&self, msg: HostMessage) -> Result<()> {
        match msg {
            HostMessage::Init {
                font_family,
                bg_color,
            } => {
                let mut state = self.lock();
                state.set_font_family(&font_family);
                state.set_content(welcome_content(&font_family));
                if !bg_color.is_empty() {
                    state.settings_mut().background_color = bg_color;
                }
            }
            HostMessage::Restore {
                inner_html,
                bg_color,
            } => {
                let mut state = self.lock();
                state.set_content(inner_html);
                if !bg_color.is_empty() {
                    state.settings_mut().background_color = bg_color;
                }
            }
            HostMessage::RestoreBgColor { bg_color } => {
                if !bg_color.is_empty() {
                    self.lock().settings_mut().background_color = bg_color;
                }
            }
            HostMessage::UpdateSettings { settings } => {
                let mut state = self.lock();
                *state.settings_mut() = settings;
                state.sync_snippet_style();
            }
            HostMessage::Save => {
                self.capture(CaptureMode::Save).await;
            }
            HostMessage::SaveSuccess {
                file_name,
                file_path,
            } => {
                log::info!("saved {} ({})", file_name, file_path);
                self.show_label("Saved!", true);
            }
            HostMessage::SaveError { message } => {
                log::warn!("save failed: {}", message);
                self.show_label(DEFAULT_LABEL, false);
            }
            HostMessage::ShareSuccess => {
                self.show_label("Shared!", true);
            }
            HostMessage::ShareError { message } => {
                log::warn!("share failed: {}", message);
                self.show_label(DEFAULT_LABEL, false);
            }
        }
        Ok(())
    }

    /// Normalize a clipboard paste into the surface.
    ///
    /// Returns whether the content changed. Markup that cannot be read is
    /// reported to the host and leaves the content as it was.
    pub fn paste(&self, payload: &ClipboardPayload) -> Result<bool> {
        match self.normalizer.normalize(payload) {
            Ok(Some(outcome)) => {
                let mut state = self.lock();
                if let Some(bg) = &outcome.background {
                    state.set_snippet_background(bg);
                }
                state.set_content(outcome.content);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(Error::InvalidPaste(reason)) => {
                log::warn!("ignoring paste: {}", reason);
                self.outbox.send(PresentationMessage::InvalidPasteContent)?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Pick a new panel background and tell the host to persist it
    pub fn set_background_color(&self, color: &str) -> Result<()> {
        self.lock().settings_mut().background_color = color.to_string();
        self.outbox.send(PresentationMessage::UpdateBgColor {
            bg_color: color.to_string(),
        })
    }

    /// Pick gradient settings and tell the host to persist them
    pub fn set_background_settings(
        &self,
        kind: BackgroundKind,
        stops: GradientStops,
        direction: &str,
    ) -> Result<()> {
        {
            let mut state = self.lock();
            let settings = state.settings_mut();
            settings.background_kind = kind;
            settings.gradient_stops = stops.clone();
            settings.gradient_direction = direction.to_string();
        }
        self.outbox.send(PresentationMessage::UpdateBgSettings {
            background_kind: kind,
            gradient_stops: stops,
            gradient_direction: direction.to_string(),
        })
    }

    pub fn set_line_numbers(&self, enabled: bool) {
        self.lock().settings_mut().line_numbers_enabled = enabled;
    }

    /// Set the button label, optionally reverting to the default later.
    /// A newer label change cancels an older pending revert.
    fn show_label(&self, label: &str, revert: bool) {
        let generation = self.lock().set_label(label);
        if !revert {
            return;
        }
        let state = self.state.clone();
        let delay = Duration::from_millis(self.config.label_reset_ms);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if state.label_generation() == generation {
                state.set_label(DEFAULT_LABEL);
            }
        });
    }

    /// The region a capture sees, built from the current state
    pub fn render_region(&self) -> Fragment {
        render_region(&self.lock(), self.normalizer.adapter())
    }

    /// Capture the snippet and route the image by `mode`.
    ///
    /// At most one capture runs at a time; a request while busy returns
    /// [`CaptureOutcome::Ignored`] without side effects. Every other path
    /// restores the layout, clears the busy flag and reports failures to
    /// the host exactly once.
    pub async fn capture(&self, mode: CaptureMode) -> CaptureOutcome {
        let (request, guard) = {
            let mut state = self.lock();
            if state.is_busy() {
                log::debug!("capture ({:?}) ignored, another capture is running", mode);
                return CaptureOutcome::Ignored;
            }
            state.phase = CapturePhase::Capturing;
            let busy_generation = state.set_label(mode.busy_label());

            let settings = state.settings().clone();
            let restore = self.styler.apply(state.layout_mut(), &settings);
            let request = CaptureRequest::new(
                render_region(&state, self.normalizer.adapter()),
                settings.resolved_background(),
                self.config.capture_scale,
            );
            let guard = CaptureGuard {
                state: self.state.clone(),
                restore,
                busy_generation,
            };
            (request, guard)
        };
        log::debug!("capture ({:?}) started", mode);

        let rasterizer = self.rasterizer.clone();
        let task = tokio::spawn(async move { rasterize_checked(rasterizer.as_ref(), &request).await });
        let watchdog = tokio::time::sleep(Duration::from_millis(self.config.watchdog_ms));

        // The rasterizer task is detached, not aborted, when the watchdog
        // wins; whatever it produces later is dropped.
        let rasterized = tokio::select! {
            biased;
            joined = task => Some(joined.unwrap_or_else(|e| {
                Err(Error::RasterizationFailure(format!("rasterizer task failed: {}", e)))
            })),
            _ = watchdog => None,
        };

        let outcome = match rasterized {
            None => CaptureOutcome::TimedOut,
            Some(Err(e)) => CaptureOutcome::Failed(e),
            Some(Ok(png)) => match self.deliver(mode, &png) {
                Ok(()) => CaptureOutcome::Succeeded(mode),
                Err(e) => CaptureOutcome::Failed(e),
            },
        };
        drop(guard);

        match &outcome {
            CaptureOutcome::Succeeded(CaptureMode::Save) => self.show_label("Saving…", false),
            CaptureOutcome::Succeeded(CaptureMode::Copy) => self.show_label("Copied!", true),
            CaptureOutcome::Succeeded(_) => self.show_label(DEFAULT_LABEL, false),
            CaptureOutcome::Failed(e) => {
                log::error!("capture ({:?}) failed: {}", mode, e);
                self.report_failure(mode, e);
            }
            CaptureOutcome::TimedOut => {
                let e = Error::Timeout(self.config.watchdog_ms);
                log::error!("capture ({:?}) timed out", mode);
                self.report_failure(mode, &e);
            }
            CaptureOutcome::Ignored => {}
        }
        log::debug!("capture ({:?}) finished", mode);
        outcome
    }

    fn deliver(&self, mode: CaptureMode, png: &[u8]) -> Result<()> {
        match mode {
            CaptureMode::Save => self.outbox.send(PresentationMessage::Shoot {
                serialized_blob: SerializedImage::from_bytes(png).into_string(),
            }),
            CaptureMode::Copy => {
                let image = RgbaImage::from_png(png)?;
                self.clipboard.write_image(&image)?;
                self.outbox.send(PresentationMessage::CopySuccess {
                    message: "Snippet copied to clipboard".to_string(),
                })
            }
            CaptureMode::Share => {
                let copied = RgbaImage::from_png(png)
                    .and_then(|image| self.clipboard.write_image(&image));
                if let Err(e) = &copied {
                    log::warn!("share: clipboard copy skipped: {}", e);
                }
                self.outbox.send(PresentationMessage::ShareToTwitter {
                    image_data: to_base64(png),
                    text: self.config.share_caption.clone(),
                    image_copied_to_clipboard: copied.is_ok(),
                })
            }
        }
    }

    fn report_failure(&self, mode: CaptureMode, error: &Error) {
        self.show_label(DEFAULT_LABEL, false);
        let message = error.to_string();
        let msg = match mode {
            CaptureMode::Copy => PresentationMessage::CopyError { message },
            CaptureMode::Save | CaptureMode::Share => PresentationMessage::ExportError { message },
        };
        if let Err(e) = self.outbox.send(msg) {
            log::error!("could not report capture failure: {}", e);
        }
    }
}

/// Holds the surface in the capturing phase. Dropping it restores the
/// export layout and returns to idle, also when the capture future itself
/// is dropped mid-flight.
struct CaptureGuard {
    state: Arc<Mutex<SurfaceState>>,
    restore: StyleRestore,
    busy_generation: u64,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.restore.restore(state.layout_mut());
        state.phase = CapturePhase::Idle;
        if state.label_generation() == self.busy_generation {
            state.set_label(DEFAULT_LABEL);
        }
    }
}

/// Placeholder content shown before the first paste
pub fn welcome_content(font_family: &str) -> String {
    let font_stack = if font_family.trim().is_empty() {
        MONO_FONT_STACK.to_string()
    } else {
        format!("'SF Mono', {}, {}", font_family, MONO_FONT_STACK.trim_start_matches("'SF Mono', "))
    };

    let mut outer = StyleMap::new();
    outer.set("color", "#d8dee9");
    outer.set("background-color", "#2e3440");
    outer.set("font-family", &font_stack);
    outer.set("font-weight", "normal");
    outer.set("font-size", "13px");
    outer.set("line-height", "20px");
    outer.set("white-space", "pre");
    outer.set("text-align", "left");

    let title = StyleMap::parse(
        "font-family: 'Inter', sans-serif; font-size: 22px; font-weight: bold; color: #e2e8f0",
    );
    let step = StyleMap::parse("font-family: 'Inter', sans-serif; color: #94a3b8");
    let mut first_step = step.clone();
    first_step.set("margin-top", "16px");

    let line = |style: Option<&StyleMap>, span_style: Option<&StyleMap>, text: &str| {
        let mut span = Element::new("span").with_text(text);
        if let Some(s) = span_style {
            span.set_style(s);
        }
        let mut div = Element::new("div").with_child(Node::Element(span));
        if let Some(s) = style {
            div.set_style(s);
        }
        Node::Element(div)
    };

    let welcome = Element::new("div")
        .with_style(&outer)
        .with_child(line(None, Some(&title), "Ready to create a SnippetShot?"))
        .with_child(line(Some(&first_step), None, "1. Copy some code from your editor."))
        .with_child(line(Some(&step), None, "2. Paste it here."))
        .with_child(line(Some(&step), None, "3. Click the 📸 button to save!"));
    welcome.to_html()
}

/// Prefix every line with its number. Lines that already carry one are
/// left alone, so repeated calls never duplicate numbers.
pub fn insert_line_numbers(fragment: &mut Fragment, adapter: &dyn LineAdapter) {
    let number_style = StyleMap::parse("color: #888; padding-right: 1em; user-select: none");
    for (i, line) in adapter.lines_mut(fragment).into_iter().enumerate() {
        let numbered = line
            .child_elements()
            .next()
            .map(|first| first.has_class("line-number"))
            .unwrap_or(false);
        if numbered {
            continue;
        }
        let number = Element::new("span")
            .with_attr("class", "line-number")
            .with_style(&number_style)
            .with_text(&(i + 1).to_string());
        line.children.insert(0, Node::Element(number));

        let mut style = line.style();
        style.set("display", "flex");
        line.set_style(&style);
    }
}

fn render_region(state: &SurfaceState, adapter: &dyn LineAdapter) -> Fragment {
    let mut content = Fragment::parse(state.content()).unwrap_or_default();
    if state.settings().line_numbers_enabled {
        insert_line_numbers(&mut content, adapter);
    }

    let layout = state.layout();
    let mut snippet = Element::new("div")
        .with_attr("id", "snippet")
        .with_style(&layout.snippet);
    snippet.children = content.nodes;

    let mut container = Element::new("div")
        .with_attr("id", "snippet-container")
        .with_style(&layout.container)
        .with_child(Node::Element(snippet));

    let settings = state.settings();
    if settings.attribution_enabled && !settings.attribution_text.trim().is_empty() {
        let footer = Element::new("div")
            .with_attr("class", "attribution")
            .with_style(&StyleMap::parse(
                "color: #94a3b8; font-size: 12px; text-align: right; padding-top: 8px",
            ))
            .with_text(settings.attribution_text.trim());
        container.children.push(Node::Element(footer));
    }

    let toolbar = Element::new("div").with_attr("class", "toolbar").with_child(Node::Element(
        Element::new("button").with_text(state.label()),
    ));
    container.children.push(Node::Element(toolbar));

    Fragment {
        nodes: vec![Node::Element(container)],
    }
}
