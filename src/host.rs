//! The host controller
//!
//! Owns everything that outlives a surface: persisted background settings,
//! file writes and user notifications. It talks to the surface only
//! through [`crate::bridge`] messages.

use crate::bridge::{HostMessage, Outbox, PresentationMessage};
use crate::serialize::{from_base64, SerializedImage};
use crate::settings::{BackgroundKind, GradientStops, PresentationSettings, DEFAULT_BG_COLOR};
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const TWEET_INTENT: &str = "https://twitter.com/intent/tweet";

const INVALID_PASTE_NOTICE: &str = "Pasted content is invalid. Only copy from your editor and \
     check that your copy/paste shortcuts do not conflict.";

/// Default file name for a save, e.g. `codesnippet-20240131-094500.png`
pub fn default_file_name() -> String {
    file_name_at(chrono::Local::now().naive_local())
}

pub fn file_name_at(at: NaiveDateTime) -> String {
    format!("codesnippet-{}.png", at.format("%Y%m%d-%H%M%S"))
}

/// Values the host persists between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreData {
    pub bg_color: String,
    pub background_kind: BackgroundKind,
    pub gradient_stops: GradientStops,
    pub gradient_direction: String,
    pub last_save_path: Option<PathBuf>,
}

impl Default for StoreData {
    fn default() -> Self {
        let settings = PresentationSettings::default();
        Self {
            bg_color: DEFAULT_BG_COLOR.to_string(),
            background_kind: settings.background_kind,
            gradient_stops: settings.gradient_stops,
            gradient_direction: settings.gradient_direction,
            last_save_path: None,
        }
    }
}

/// JSON key-value store backing [`StoreData`]
#[derive(Debug, Clone, Default)]
pub struct HostStore {
    path: Option<PathBuf>,
    data: StoreData,
}

impl HostStore {
    /// `<config dir>/snippetshot/store.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snippetshot").join("store.json"))
    }

    /// Load a store file. A missing file yields defaults; an unreadable
    /// one is logged and replaced with defaults on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("ignoring malformed store {}: {}", path.display(), e);
                StoreData::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => {
                log::warn!("could not read store {}: {}", path.display(), e);
                StoreData::default()
            }
        };
        Self {
            path: Some(path),
            data,
        }
    }

    /// A store that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn data(&self) -> &StoreData {
        &self.data
    }

    /// Change values and write the store through
    pub fn update(&mut self, f: impl FnOnce(&mut StoreData)) -> Result<()> {
        f(&mut self.data);
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::PersistenceFailure(format!("{}: {}", dir.display(), e)))?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(path, json)
            .map_err(|e| Error::PersistenceFailure(format!("{}: {}", path.display(), e)))?;
        log::debug!("store written to {}", path.display());
        Ok(())
    }
}

/// User-facing side effects of the host
pub trait HostUi: Send {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    /// Ask where to save. `None` means the user cancelled.
    fn pick_save_path(&self, suggested: &Path) -> Option<PathBuf>;
    fn open_url(&self, url: &Url) -> Result<()>;
}

/// Non-interactive UI: notices go to the log, saves go to a fixed path
/// or the suggested one, URLs are logged instead of opened.
#[derive(Debug, Clone, Default)]
pub struct HeadlessUi {
    pub output: Option<PathBuf>,
}

impl HostUi for HeadlessUi {
    fn info(&self, message: &str) {
        log::info!("{}", message);
    }

    fn error(&self, message: &str) {
        log::error!("{}", message);
    }

    fn pick_save_path(&self, suggested: &Path) -> Option<PathBuf> {
        Some(self.output.clone().unwrap_or_else(|| suggested.to_path_buf()))
    }

    fn open_url(&self, url: &Url) -> Result<()> {
        log::info!("open {}", url);
        Ok(())
    }
}

pub struct HostController<U: HostUi> {
    store: HostStore,
    ui: U,
    outbox: Outbox<HostMessage>,
    /// Presentation settings from configuration, before persisted overrides
    settings: PresentationSettings,
    font_family: String,
    save_dir: PathBuf,
}

impl<U: HostUi> HostController<U> {
    pub fn new(store: HostStore, ui: U, outbox: Outbox<HostMessage>) -> Self {
        let save_dir = dirs::picture_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            store,
            ui,
            outbox,
            settings: PresentationSettings::default(),
            font_family: String::new(),
            save_dir,
        }
    }

    pub fn with_settings(mut self, settings: PresentationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_font_family(mut self, font_family: &str) -> Self {
        self.font_family = font_family.to_string();
        self
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn store(&self) -> &HostStore {
        &self.store
    }

    /// Configured settings with persisted background values applied
    pub fn current_settings(&self) -> PresentationSettings {
        let data = self.store.data();
        PresentationSettings {
            background_color: data.bg_color.clone(),
            background_kind: data.background_kind,
            gradient_stops: data.gradient_stops.clone(),
            gradient_direction: data.gradient_direction.clone(),
            ..self.settings.clone()
        }
    }

    /// Open a fresh panel: welcome content plus current settings
    pub fn open_panel(&self) -> Result<()> {
        self.outbox.send(HostMessage::Init {
            font_family: self.font_family.clone(),
            bg_color: self.store.data().bg_color.clone(),
        })?;
        self.sync_settings()
    }

    /// Reopen a panel with previously saved content
    pub fn restore_panel(&self, inner_html: &str) -> Result<()> {
        self.outbox.send(HostMessage::Restore {
            inner_html: inner_html.to_string(),
            bg_color: self.store.data().bg_color.clone(),
        })?;
        self.sync_settings()
    }

    /// Replace configured settings (configuration changed) and push them
    pub fn update_settings(&mut self, settings: PresentationSettings) -> Result<()> {
        self.settings = settings;
        self.sync_settings()
    }

    pub fn request_save(&self) -> Result<()> {
        self.outbox.send(HostMessage::Save)
    }

    fn sync_settings(&self) -> Result<()> {
        self.outbox.send(HostMessage::UpdateSettings {
            settings: self.current_settings(),
        })
    }

    /// Handle messages until the surface goes away
    pub async fn run(
        mut self,
        mut inbox: tokio::sync::mpsc::UnboundedReceiver<PresentationMessage>,
    ) -> Result<Self> {
        while let Some(msg) = inbox.recv().await {
            self.handle(msg)?;
        }
        log::debug!("surface channel closed, host stopping");
        Ok(self)
    }

    /// Apply one message from the surface. Only a closed channel is an
    /// error; everything else is reported to the user.
    pub fn handle(&mut self, msg: PresentationMessage) -> Result<()> {
        match msg {
            PresentationMessage::GetAndUpdateCacheAndSettings => {
                self.outbox.send(HostMessage::RestoreBgColor {
                    bg_color: self.store.data().bg_color.clone(),
                })?;
                self.sync_settings()?;
            }
            PresentationMessage::Shoot { serialized_blob } => match self.save_snapshot(&serialized_blob) {
                Ok(path) => {
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    self.ui.info(&format!("Snippet saved to {}", path.display()));
                    self.outbox.send(HostMessage::SaveSuccess {
                        file_name,
                        file_path: path.display().to_string(),
                    })?;
                }
                Err(e) => {
                    self.ui.error(&e.to_string());
                    self.outbox.send(HostMessage::SaveError {
                        message: e.to_string(),
                    })?;
                }
            },
            PresentationMessage::UpdateBgColor { bg_color } => {
                self.persist(|data| data.bg_color = bg_color);
            }
            PresentationMessage::UpdateBgSettings {
                background_kind,
                gradient_stops,
                gradient_direction,
            } => {
                self.persist(|data| {
                    data.background_kind = background_kind;
                    data.gradient_stops = gradient_stops;
                    data.gradient_direction = gradient_direction;
                });
            }
            PresentationMessage::CopySuccess { message } => self.ui.info(&message),
            PresentationMessage::CopyError { message } => {
                self.ui.error(&format!("Copy failed: {}", message))
            }
            PresentationMessage::ExportError { message } => {
                self.ui.error(&format!("Export failed: {}", message))
            }
            PresentationMessage::ShareToTwitter {
                image_data,
                text,
                image_copied_to_clipboard,
            } => match self.share(&image_data, &text, image_copied_to_clipboard) {
                Ok(()) => self.outbox.send(HostMessage::ShareSuccess)?,
                Err(e) => {
                    self.ui.error(&format!("Share failed: {}", e));
                    self.outbox.send(HostMessage::ShareError {
                        message: e.to_string(),
                    })?;
                }
            },
            PresentationMessage::InvalidPasteContent => self.ui.info(INVALID_PASTE_NOTICE),
        }
        Ok(())
    }

    fn persist(&mut self, f: impl FnOnce(&mut StoreData)) {
        if let Err(e) = self.store.update(f) {
            self.ui.error(&e.to_string());
        }
    }

    fn suggested_save_path(&self) -> PathBuf {
        let dir = self
            .store
            .data()
            .last_save_path
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.save_dir.clone());
        dir.join(default_file_name())
    }

    fn save_snapshot(&mut self, serialized_blob: &str) -> Result<PathBuf> {
        let bytes = SerializedImage::from_string(serialized_blob).to_bytes()?;
        let path = self
            .ui
            .pick_save_path(&self.suggested_save_path())
            .ok_or_else(|| Error::PersistenceFailure("save cancelled".into()))?;
        write_file(&path, &bytes)?;
        log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
        self.persist(|data| data.last_save_path = Some(path.clone()));
        Ok(path)
    }

    fn share(&mut self, image_data: &str, text: &str, copied: bool) -> Result<()> {
        let bytes = from_base64(image_data)?;
        if bytes.is_empty() {
            return Err(Error::Serialization("empty share image".into()));
        }
        let url = Url::parse_with_params(TWEET_INTENT, &[("text", text)])
            .map_err(|e| Error::Other(format!("bad share url: {}", e)))?;

        if copied {
            self.ui
                .info("Image copied to clipboard. Paste it into your post.");
        } else {
            let path = self.suggested_save_path();
            write_file(&path, &bytes)?;
            self.ui.info(&format!(
                "Image saved to {}. Attach it to your post.",
                path.display()
            ));
        }
        self.ui.open_url(&url)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .map_err(|e| Error::PersistenceFailure(format!("{}: {}", path.display(), e)))
}
