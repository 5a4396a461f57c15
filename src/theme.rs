// Built-in color themes and CSS gradient geometry

use serde::Serialize;

use crate::error::AppError;

// ============================================================================
// Theme Registry
// ============================================================================

/// A named color set applied uniformly to every card in a batch.
///
/// Only `background` and `text` affect rendering; the swatch colors are
/// carried for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorTheme {
    pub id: &'static str,
    pub name: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub text: &'static str,
}

pub static COLOR_THEMES: [ColorTheme; 6] = [
    ColorTheme {
        id: "athletic-blue",
        name: "Athletic Blue",
        primary: "#3B82F6",
        secondary: "#1E40AF",
        accent: "#DBEAFE",
        background: "linear-gradient(135deg, #3B82F6, #1E40AF)",
        text: "#FFFFFF",
    },
    ColorTheme {
        id: "energy-orange",
        name: "Energy Orange",
        primary: "#EA580C",
        secondary: "#DC2626",
        accent: "#FED7AA",
        background: "linear-gradient(135deg, #EA580C, #DC2626)",
        text: "#FFFFFF",
    },
    ColorTheme {
        id: "victory-green",
        name: "Victory Green",
        primary: "#059669",
        secondary: "#047857",
        accent: "#A7F3D0",
        background: "linear-gradient(135deg, #059669, #047857)",
        text: "#FFFFFF",
    },
    ColorTheme {
        id: "champion-purple",
        name: "Champion Purple",
        primary: "#7C3AED",
        secondary: "#5B21B6",
        accent: "#DDD6FE",
        background: "linear-gradient(135deg, #7C3AED, #5B21B6)",
        text: "#FFFFFF",
    },
    ColorTheme {
        id: "fire-red",
        name: "Fire Red",
        primary: "#DC2626",
        secondary: "#991B1B",
        accent: "#FECACA",
        background: "linear-gradient(135deg, #DC2626, #991B1B)",
        text: "#FFFFFF",
    },
    ColorTheme {
        id: "thunder-yellow",
        name: "Thunder Yellow",
        primary: "#D97706",
        secondary: "#B45309",
        accent: "#FDE68A",
        background: "linear-gradient(135deg, #D97706, #B45309)",
        text: "#FFFFFF",
    },
];

/// The theme selected when nothing else is chosen.
pub fn default_theme() -> &'static ColorTheme {
    &COLOR_THEMES[0]
}

pub fn find_theme(id: &str) -> Result<&'static ColorTheme, AppError> {
    COLOR_THEMES.iter().find(|t| t.id == id).ok_or_else(|| {
        let available = COLOR_THEMES
            .iter()
            .map(|t| t.id)
            .collect::<Vec<_>>()
            .join(", ");
        AppError::ThemeError(id.to_string(), available)
    })
}

// ============================================================================
// Gradient Geometry
// ============================================================================

/// A parsed `linear-gradient(<angle>deg, <color>, <color>, ...)` value.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub angle_deg: f32,
    pub stops: Vec<String>,
}

/// Endpoints of a gradient line in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl LinearGradient {
    /// Parses the subset of CSS used by the registry: an optional degree
    /// angle followed by unpositioned color stops.
    pub fn parse(css: &str) -> Option<Self> {
        let inner = css
            .trim()
            .strip_prefix("linear-gradient(")?
            .strip_suffix(')')?;

        let mut parts = inner.split(',').map(str::trim).peekable();
        // CSS default direction is "to bottom"
        let mut angle_deg = 180.0;
        if let Some(first) = parts.peek() {
            if let Some(deg) = first.strip_suffix("deg") {
                angle_deg = deg.trim().parse().ok()?;
                parts.next();
            }
        }

        let stops: Vec<String> = parts
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if stops.len() < 2 {
            return None;
        }

        Some(Self { angle_deg, stops })
    }

    /// Computes the gradient line for a `width` x `height` box the way CSS
    /// does: through the center, long enough that the corners perpendicular
    /// to the angle land exactly on the first and last stops.
    pub fn line_for(&self, width: f32, height: f32) -> GradientLine {
        let rad = self.angle_deg.to_radians();
        let (dx, dy) = (rad.sin(), -rad.cos());
        let half = (width * dx.abs() + height * dy.abs()) / 2.0;
        let (cx, cy) = (width / 2.0, height / 2.0);

        GradientLine {
            x1: cx - dx * half,
            y1: cy - dy * half,
            x2: cx + dx * half,
            y2: cy + dy * half,
        }
    }

    /// Stop offsets, evenly spaced from 0 to 1.
    pub fn offsets(&self) -> impl Iterator<Item = (f32, &str)> + '_ {
        let last = (self.stops.len() - 1) as f32;
        self.stops
            .iter()
            .enumerate()
            .map(move |(i, color)| (i as f32 / last, color.as_str()))
    }
}
