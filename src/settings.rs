//! Presentation settings pushed from the host to the surface

use serde::{Deserialize, Serialize};

/// Default panel background used when nothing has been persisted yet
pub const DEFAULT_BG_COLOR: &str = "#2e3440";

/// Whether the export background is a flat color or a two-stop gradient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum BackgroundKind {
    #[default]
    Solid,
    Gradient,
}

/// The two configured gradient stops, in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientStops(pub String, pub String);

impl Default for GradientStops {
    fn default() -> Self {
        Self("#4c1d95".to_string(), "#0ea5e9".to_string())
    }
}

/// Flat record of everything that changes how a snippet is presented
///
/// Owned by the host. The surface keeps a copy and only mutates it for
/// immediate visual feedback; authoritative writes go back through the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresentationSettings {
    /// CSS `box-shadow` applied to the snippet node
    pub shadow: String,
    /// Solid background color of the export
    pub background_color: String,
    pub background_kind: BackgroundKind,
    pub gradient_stops: GradientStops,
    /// `"circle"` for a radial gradient, otherwise a linear direction keyword
    pub gradient_direction: String,
    pub line_numbers_enabled: bool,
    pub attribution_enabled: bool,
    pub attribution_text: String,
    pub ligatures_enabled: bool,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            shadow: "rgba(0, 0, 0, 0.55) 0px 20px 68px".to_string(),
            background_color: DEFAULT_BG_COLOR.to_string(),
            background_kind: BackgroundKind::Solid,
            gradient_stops: GradientStops::default(),
            gradient_direction: "to bottom right".to_string(),
            line_numbers_enabled: false,
            attribution_enabled: false,
            attribution_text: String::new(),
            ligatures_enabled: true,
        }
    }
}

impl PresentationSettings {
    /// Resolve the export background into a CSS value
    pub fn resolved_background(&self) -> Background {
        match self.background_kind {
            BackgroundKind::Solid => Background::Solid(self.background_color.clone()),
            BackgroundKind::Gradient if self.gradient_direction == "circle" => Background::Radial {
                from: self.gradient_stops.0.clone(),
                to: self.gradient_stops.1.clone(),
            },
            BackgroundKind::Gradient => Background::Linear {
                direction: self.gradient_direction.clone(),
                from: self.gradient_stops.0.clone(),
                to: self.gradient_stops.1.clone(),
            },
        }
    }
}

/// A resolved export background
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    Solid(String),
    Linear {
        direction: String,
        from: String,
        to: String,
    },
    Radial {
        from: String,
        to: String,
    },
}

impl Background {
    /// CSS value suitable for the `background` property
    pub fn to_css(&self) -> String {
        match self {
            Background::Solid(color) => color.clone(),
            Background::Linear { direction, from, to } => {
                format!("linear-gradient({}, {}, {})", direction, from, to)
            }
            Background::Radial { from, to } => format!("radial-gradient(circle, {}, {})", from, to),
        }
    }
}
