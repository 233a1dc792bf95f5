//! RGBA rasterization of paint commands and PNG encoding

use crate::rendering::paint::{PaintCommand, Rgba};
use crate::rendering::Screenshot;
use crate::{Error, Result};
use std::io::Cursor;

/// Largest edge the rasterizer will allocate, in device pixels
pub const MAX_DIMENSION: u32 = 16_384;

/// A straight-alpha RGBA8 pixel buffer
#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::RasterizationFailure(format!(
                "unsupported image size {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        (
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    /// Source-over blend of one pixel
    fn blend(&mut self, x: u32, y: u32, src: Rgba) {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let sa = src.3 as f32 / 255.0;
        if sa >= 1.0 {
            self.pixels[i..i + 4].copy_from_slice(&[src.0, src.1, src.2, src.3]);
            return;
        }
        let da = self.pixels[i + 3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return;
        }
        let mix = |s: u8, d: u8| {
            ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a).round() as u8
        };
        self.pixels[i] = mix(src.0, self.pixels[i]);
        self.pixels[i + 1] = mix(src.1, self.pixels[i + 1]);
        self.pixels[i + 2] = mix(src.2, self.pixels[i + 2]);
        self.pixels[i + 3] = (out_a * 255.0).round() as u8;
    }

    /// Clip a rect to the canvas: (x0, y0, x1, y1), exclusive end
    fn clip(&self, x: i32, y: i32, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = x.max(0) as i64;
        let y0 = y.max(0) as i64;
        let x1 = (x as i64 + width as i64).min(self.width as i64);
        let y1 = (y as i64 + height as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn fill(&mut self, x: i32, y: i32, width: u32, height: u32, shade: impl Fn(f32, f32) -> Rgba) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, width, height) else {
            return;
        };
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        for py in y0..y1 {
            for px in x0..x1 {
                // normalized position inside the rect, pixel centers
                let u = (px as i64 - x as i64) as f32 + 0.5;
                let v = (py as i64 - y as i64) as f32 + 0.5;
                self.blend(px, py, shade(u / w, v / h));
            }
        }
    }

    /// Paint one command, coordinates multiplied by `scale`
    pub fn paint(&mut self, cmd: &PaintCommand, scale: u32) {
        let s = scale.max(1);
        let si = s as i32;
        match *cmd {
            PaintCommand::SolidRect {
                x,
                y,
                width,
                height,
                rgba,
            } => self.fill(x * si, y * si, width * s, height * s, |_, _| rgba),
            PaintCommand::LinearGradient {
                x,
                y,
                width,
                height,
                from,
                to,
                direction: (dx, dy),
            } => {
                // project onto the direction; both ends of the rect map to 0 and 1
                let span = dx.abs() + dy.abs();
                self.fill(x * si, y * si, width * s, height * s, |u, v| {
                    let along = (u - 0.5) * dx + (v - 0.5) * dy;
                    let t = if span > 0.0 { along / span + 0.5 } else { 0.0 };
                    lerp(from, to, t)
                })
            }
            PaintCommand::RadialGradient {
                x,
                y,
                width,
                height,
                from,
                to,
            } => {
                let aspect = width as f32 / height.max(1) as f32;
                let reach = (aspect * aspect * 0.25 + 0.25).sqrt();
                self.fill(x * si, y * si, width * s, height * s, |u, v| {
                    let du = (u - 0.5) * aspect;
                    let dv = v - 0.5;
                    lerp(from, to, (du * du + dv * dv).sqrt() / reach)
                })
            }
        }
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| Error::RasterizationFailure("pixel buffer size mismatch".into()))?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

fn lerp(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2), mix(a.3, b.3))
}

/// Rasterize a display list of a `width` x `height` CSS-pixel region
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32, scale: u32) -> Result<Screenshot> {
    let scale = scale.max(1);
    let mut canvas = Canvas::new(width.saturating_mul(scale), height.saturating_mul(scale))?;
    for cmd in commands {
        canvas.paint(cmd, scale);
    }
    Ok(Screenshot {
        width: canvas.width,
        height: canvas.height,
        png_data: canvas.to_png()?,
    })
}
