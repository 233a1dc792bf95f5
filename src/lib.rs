//! SnippetShot
//!
//! Turn a highlighted code selection into a shareable PNG. A paste carries
//! the editor's rich markup; the surface normalizes it, lets the user adjust
//! the presentation and captures it as an image that is saved through the
//! host, copied to the clipboard or handed to a share flow.
//!
//! # Features
//!
//! - **Paste normalization**: common indentation is stripped from the
//!   rich markup of a selection, with a plain-text fallback
//! - **Export styling**: capture-ready layout applied and fully restored
//!   around each capture
//! - **Single-flight capture**: one capture at a time, guarded by a watchdog
//! - **Host/surface split**: the two sides only exchange serializable messages
//!
//! # Example
//!
//! ```no_run
//! use snippetshot::{bridge, new_surface, CaptureMode, ClipboardPayload, SurfaceConfig};
//!
//! # async fn run() -> snippetshot::Result<()> {
//! let (_host, surface_end) = bridge::channel();
//! let surface = new_surface(SurfaceConfig::default(), surface_end.outbox);
//!
//! surface.paste(&ClipboardPayload::new(
//!     Some("<div><div><span>    let x = 1;</span></div></div>".into()),
//!     Some("    let x = 1;".into()),
//! ))?;
//! let outcome = surface.capture(CaptureMode::Save).await;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod bridge;
pub mod capture;
pub mod clipboard;
pub mod host;
pub mod markup;
pub mod normalize;
pub mod rendering;
pub mod serialize;
pub mod settings;
pub mod style;
pub mod surface;

pub use capture::{CaptureMode, CaptureOutcome, CaptureRequest, Rasterizer};
pub use host::{HostController, HostStore, HostUi};
pub use normalize::{ClipboardPayload, IndentProfile, PasteNormalizer, PasteOutcome};
pub use settings::PresentationSettings;
pub use surface::Surface;

use std::sync::Arc;

/// Configuration for the presentation surface
///
/// The defaults mirror what an interactive session expects:
/// - a capture that has not finished after 30 seconds is abandoned
/// - transient button labels ("Saved!", "Copied!") revert after 2 seconds
///
/// # Examples
///
/// ```
/// let cfg = snippetshot::SurfaceConfig::default();
/// assert_eq!(cfg.watchdog_ms, 30_000);
/// ```
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Capture watchdog in milliseconds
    pub watchdog_ms: u64,
    /// Delay before a transient label reverts, in milliseconds
    pub label_reset_ms: u64,
    /// Device pixel multiplier for captures
    pub capture_scale: u32,
    /// Padding around the snippet in exported images, in CSS pixels
    pub export_padding_px: u32,
    /// Caption proposed when sharing
    pub share_caption: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            watchdog_ms: 30_000,
            label_reset_ms: 2_000,
            capture_scale: 2,
            export_padding_px: 32,
            share_caption: "Check out this code snippet! #SnippetShot".to_string(),
        }
    }
}

/// Create a surface with the built-in rasterizer and the best clipboard
/// this build supports.
pub fn new_surface(config: SurfaceConfig, outbox: bridge::Outbox<bridge::PresentationMessage>) -> Surface {
    Surface::new(
        config,
        Arc::new(rendering::BlockRasterizer),
        clipboard::default_sink(),
        outbox,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SurfaceConfig::default();
        assert_eq!(config.watchdog_ms, 30_000);
        assert_eq!(config.label_reset_ms, 2_000);
        assert_eq!(config.export_padding_px, 32);
        assert!(config.capture_scale >= 1);
    }
}
