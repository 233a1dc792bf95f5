//! Paint commands and color parsing for the block rasterizer

use crate::rendering::layout::{RegionLayout, TextGrid, CELL_HEIGHT, CELL_WIDTH, FOOTER_GAP};
use crate::settings::Background;

pub type Rgba = (u8, u8, u8, u8);

/// Fallback for panels and text without a usable color
pub const DEFAULT_PANEL: Rgba = (0x2e, 0x34, 0x40, 255);
pub const DEFAULT_TEXT: Rgba = (0xd8, 0xde, 0xe9, 255);

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: Rgba,
    },
    /// Two-stop gradient along a unit direction
    LinearGradient {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        from: Rgba,
        to: Rgba,
        direction: (f32, f32),
    },
    /// Two-stop circular gradient from the rect center to its farthest corner
    RadialGradient {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        from: Rgba,
        to: Rgba,
    },
}

/// Parse a CSS color. Supports hex forms, `rgb()`/`rgba()` and a few names.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = v
        .strip_prefix("rgba(")
        .or_else(|| v.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| s.parse::<f32>().ok().map(|n| n.clamp(0.0, 255.0) as u8);
        let alpha = match parts.get(3) {
            Some(a) => (a.parse::<f32>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
            None => 255,
        };
        return Some((channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha));
    }
    match v.as_str() {
        "white" => Some((255, 255, 255, 255)),
        "black" => Some((0, 0, 0, 255)),
        "transparent" => Some((0, 0, 0, 0)),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some((nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        4 => Some((nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some((byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some((byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// Unit vector for a linear-gradient direction (`to right`, `45deg`, ...).
/// Unknown values fall back to top-to-bottom.
pub fn gradient_direction(direction: &str) -> (f32, f32) {
    let d = direction.trim().to_ascii_lowercase();
    if let Some(deg) = d.strip_suffix("deg").and_then(|n| n.trim().parse::<f32>().ok()) {
        let rad = deg.to_radians();
        return (rad.sin(), -rad.cos());
    }
    let mut dx = 0.0f32;
    let mut dy = 0.0f32;
    for word in d.split_whitespace() {
        match word {
            "right" => dx = 1.0,
            "left" => dx = -1.0,
            "bottom" => dy = 1.0,
            "top" => dy = -1.0,
            _ => {}
        }
    }
    if dx == 0.0 && dy == 0.0 {
        return (0.0, 1.0);
    }
    let len = (dx * dx + dy * dy).sqrt();
    (dx / len, dy / len)
}

fn background_command(background: &Background, width: u32, height: u32) -> PaintCommand {
    let color = |c: &str| parse_color(c).unwrap_or(DEFAULT_PANEL);
    match background {
        Background::Solid(c) => PaintCommand::SolidRect {
            x: 0,
            y: 0,
            width,
            height,
            rgba: color(c),
        },
        Background::Linear { direction, from, to } => PaintCommand::LinearGradient {
            x: 0,
            y: 0,
            width,
            height,
            from: color(from),
            to: color(to),
            direction: gradient_direction(direction),
        },
        Background::Radial { from, to } => PaintCommand::RadialGradient {
            x: 0,
            y: 0,
            width,
            height,
            from: color(from),
            to: color(to),
        },
    }
}

fn glyph_commands(grid: &TextGrid, origin_x: i32, origin_y: i32, out: &mut Vec<PaintCommand>) {
    for glyph in &grid.glyphs {
        out.push(PaintCommand::SolidRect {
            x: origin_x + (glyph.col * CELL_WIDTH) as i32 + 1,
            y: origin_y + (glyph.row * CELL_HEIGHT) as i32 + 5,
            width: CELL_WIDTH - 2,
            height: CELL_HEIGHT - 10,
            rgba: glyph.color,
        });
    }
}

/// Display list for a laid-out region, in CSS pixels
pub fn build_display_list(layout: &RegionLayout, background: &Background) -> Vec<PaintCommand> {
    let (width, height) = layout.size();
    let mut cmds = vec![background_command(background, width, height)];

    let pad = layout.container_padding as i32;
    let (panel_w, panel_h) = layout.panel_size();
    cmds.push(PaintCommand::SolidRect {
        x: pad,
        y: pad,
        width: panel_w,
        height: panel_h,
        rgba: layout.panel_color,
    });

    let inner = pad + layout.snippet_padding as i32;
    glyph_commands(&layout.snippet, inner, inner, &mut cmds);

    if let Some(footer) = &layout.footer {
        let y = pad + (panel_h + FOOTER_GAP) as i32;
        glyph_commands(footer, pad, y, &mut cmds);
    }
    cmds
}
