//! Capture pipeline types
//!
//! The pipeline itself runs inside [`crate::surface::Surface::capture`];
//! this module holds the rasterizer seam and the values that flow through
//! a capture.

use crate::markup::{Element, Fragment};
use crate::settings::Background;
use crate::{Error, Result};
use async_trait::async_trait;

/// What happens with a successful capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Serialize and hand to the host for a file write
    Save,
    /// Write to the local clipboard
    Copy,
    /// Clipboard copy plus a share message to the host
    Share,
}

impl CaptureMode {
    /// Button label while the capture runs
    pub fn busy_label(self) -> &'static str {
        match self {
            CaptureMode::Copy => "Copying…",
            CaptureMode::Save | CaptureMode::Share => "Capturing…",
        }
    }
}

/// Pipeline phase, tracked in the surface state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePhase {
    #[default]
    Idle,
    Capturing,
}

/// Terminal result of one capture attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Succeeded(CaptureMode),
    Failed(Error),
    TimedOut,
    /// Another capture was already in flight; nothing was done
    Ignored,
}

impl CaptureOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CaptureOutcome::Succeeded(_))
    }
}

/// Everything a rasterizer needs for one capture. Built fresh per capture.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    /// The styled subtree to capture
    pub region: Fragment,
    pub background: Background,
    /// Device pixel multiplier
    pub scale: u32,
    /// Elements matching this are left out of the image
    pub exclude: fn(&Element) -> bool,
}

impl CaptureRequest {
    pub fn new(region: Fragment, background: Background, scale: u32) -> Self {
        Self {
            region,
            background,
            scale: scale.max(1),
            exclude: is_toolbar,
        }
    }
}

/// Default exclusion: the surface's control toolbar
pub fn is_toolbar(el: &Element) -> bool {
    el.has_class("toolbar")
}

/// Opaque capability that turns a styled region into PNG bytes
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, request: &CaptureRequest) -> Result<Vec<u8>>;
}

/// Run a rasterizer and treat an empty buffer as a failure
pub(crate) async fn rasterize_checked(
    rasterizer: &dyn Rasterizer,
    request: &CaptureRequest,
) -> Result<Vec<u8>> {
    let bytes = rasterizer.rasterize(request).await?;
    if bytes.is_empty() {
        return Err(Error::RasterizationFailure("rasterizer produced no data".into()));
    }
    Ok(bytes)
}
