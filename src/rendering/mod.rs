//! Built-in block rasterizer
//!
//! Not an HTML renderer. It draws the capture region as a silhouette:
//! background, snippet panel and one colored block per visible character.
//! Output is deterministic, which keeps the capture pipeline testable
//! without a browser.

pub mod layout;
pub mod paint;
pub mod raster;

use crate::capture::{CaptureRequest, Rasterizer};
use crate::{Error, Result};
use async_trait::async_trait;

/// A rasterized capture
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

/// Synchronous entry point: layout, paint, rasterize
pub fn render(request: &CaptureRequest) -> Result<Screenshot> {
    let layout = layout::layout_region(&request.region, request.exclude);
    let (width, height) = layout.size();
    let commands = paint::build_display_list(&layout, &request.background);
    log::debug!(
        "rendering {}x{} region, {} paint commands, scale {}",
        width,
        height,
        commands.len(),
        request.scale
    );
    raster::rasterize(&commands, width, height, request.scale)
}

/// [`Rasterizer`] over [`render`]. The synchronous work runs on the
/// blocking pool so the capture watchdog keeps ticking meanwhile.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockRasterizer;

#[async_trait]
impl Rasterizer for BlockRasterizer {
    async fn rasterize(&self, request: &CaptureRequest) -> Result<Vec<u8>> {
        let request = request.clone();
        tokio::task::spawn_blocking(move || render(&request).map(|shot| shot.png_data))
            .await
            .map_err(|e| Error::RasterizationFailure(format!("render task failed: {}", e)))?
    }
}
