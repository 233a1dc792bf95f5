//! Local clipboard image sink

use crate::{Error, Result};

/// Decoded RGBA8 pixels, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub bytes: Vec<u8>,
}

impl RgbaImage {
    /// Decode PNG bytes into RGBA pixels
    pub fn from_png(png: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(png, image::ImageFormat::Png)?;
        let rgba = img.to_rgba8();
        Ok(Self {
            width: rgba.width() as usize,
            height: rgba.height() as usize,
            bytes: rgba.into_raw(),
        })
    }
}

/// Where copied images go
pub trait ClipboardSink: Send + Sync {
    fn write_image(&self, image: &RgbaImage) -> Result<()>;
}

/// The desktop clipboard, through `arboard`
#[cfg(feature = "clipboard")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(feature = "clipboard")]
impl ClipboardSink for SystemClipboard {
    fn write_image(&self, image: &RgbaImage) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| Error::ClipboardUnavailable(e.to_string()))?;
        clipboard
            .set_image(arboard::ImageData {
                width: image.width,
                height: image.height,
                bytes: std::borrow::Cow::Borrowed(&image.bytes),
            })
            .map_err(|e| Error::ClipboardUnavailable(e.to_string()))?;
        log::debug!("wrote {}x{} image to clipboard", image.width, image.height);
        Ok(())
    }
}

/// Sink for environments without a clipboard; every write fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipboard;

impl ClipboardSink for NoClipboard {
    fn write_image(&self, _image: &RgbaImage) -> Result<()> {
        Err(Error::ClipboardUnavailable(
            "clipboard support is not available in this build".into(),
        ))
    }
}

/// The best sink this build supports
pub fn default_sink() -> std::sync::Arc<dyn ClipboardSink> {
    #[cfg(feature = "clipboard")]
    {
        std::sync::Arc::new(SystemClipboard)
    }
    #[cfg(not(feature = "clipboard"))]
    {
        std::sync::Arc::new(NoClipboard)
    }
}
