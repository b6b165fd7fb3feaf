//! Named color palette and hex normalization.
//!
//! Rules and frames carry color names (`red`, `light_blue`); the canvas wants
//! `#rrggbb` for frame fills and connector strokes. Fills and strokes have
//! separate tables: sticky-note fills are pale, so a stroke in the same tone
//! would vanish on a white board. Names not in a table resolve to the
//! fallback, and values that are already hex pass through in canonical
//! lowercase form.

use std::collections::HashMap;

pub const DEFAULT_FALLBACK_HEX: &str = "#808080";

/// Sticky-note color names understood by the canvas, with their fill hex.
const STICKY_COLORS: &[(&str, &str)] = &[
    ("gray", "#f5f6f8"),
    ("light_yellow", "#fff9b1"),
    ("yellow", "#f5d128"),
    ("orange", "#ff9d48"),
    ("light_green", "#d5f692"),
    ("green", "#c9df56"),
    ("dark_green", "#93d275"),
    ("cyan", "#67c6c0"),
    ("light_pink", "#ffcee0"),
    ("pink", "#ea94bb"),
    ("violet", "#c6a2d2"),
    ("red", "#f0939d"),
    ("light_blue", "#a6ccf5"),
    ("blue", "#6cd8fa"),
    ("dark_blue", "#9ea9ff"),
    ("black", "#1a1a1a"),
];

/// Connector strokes: a darker tone of each sticky-note color.
const STROKE_COLORS: &[(&str, &str)] = &[
    ("gray", "#6b6f76"),
    ("light_yellow", "#c9b800"),
    ("yellow", "#b8960c"),
    ("orange", "#d9661f"),
    ("light_green", "#7fa83a"),
    ("green", "#6b8e23"),
    ("dark_green", "#3f7a3a"),
    ("cyan", "#1f8a84"),
    ("light_pink", "#d96b95"),
    ("pink", "#b8477d"),
    ("violet", "#7e4a96"),
    ("red", "#c0392b"),
    ("light_blue", "#3f7fc4"),
    ("blue", "#1a8fb8"),
    ("dark_blue", "#3d4bbf"),
    ("black", "#1a1a1a"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: HashMap<String, String>,
    strokes: HashMap<String, String>,
    fallback: String,
}

impl Palette {
    /// An empty palette: every name resolves to `fallback`.
    #[must_use]
    pub fn empty(fallback: &str) -> Self {
        Self {
            colors: HashMap::new(),
            strokes: HashMap::new(),
            fallback: normalize_hex_color(fallback, DEFAULT_FALLBACK_HEX),
        }
    }

    /// Add or replace a named fill color. Invalid hex values fall back.
    #[must_use]
    pub fn with_color(mut self, name: &str, hex: &str) -> Self {
        let normalized = normalize_hex_color(hex, &self.fallback);
        self.colors.insert(name.to_ascii_lowercase(), normalized);
        self
    }

    /// Add or replace a named stroke color. Invalid hex values fall back.
    #[must_use]
    pub fn with_stroke(mut self, name: &str, hex: &str) -> Self {
        let normalized = normalize_hex_color(hex, &self.fallback);
        self.strokes.insert(name.to_ascii_lowercase(), normalized);
        self
    }

    /// Resolve a color name (or hex literal) to its fill `#rrggbb`.
    #[must_use]
    pub fn hex(&self, name: &str) -> String {
        self.resolve(&self.colors, name)
    }

    /// Resolve a color name (or hex literal) to its connector stroke.
    ///
    /// Names without a stroke entry use their fill, then the fallback.
    #[must_use]
    pub fn stroke_hex(&self, name: &str) -> String {
        let key = name.trim().to_ascii_lowercase();
        if self.strokes.contains_key(&key) || parse_hex_rgb(name).is_some() {
            return self.resolve(&self.strokes, name);
        }
        self.hex(name)
    }

    /// True for hex literals and names with a fill entry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        parse_hex_rgb(name).is_some() || self.colors.contains_key(&name.trim().to_ascii_lowercase())
    }

    fn resolve(&self, table: &HashMap<String, String>, name: &str) -> String {
        if parse_hex_rgb(name).is_some() {
            return normalize_hex_color(name, &self.fallback);
        }
        table
            .get(&name.trim().to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

impl Default for Palette {
    fn default() -> Self {
        let palette = STICKY_COLORS
            .iter()
            .fold(Self::empty(DEFAULT_FALLBACK_HEX), |palette, (name, hex)| palette.with_color(name, hex));
        STROKE_COLORS
            .iter()
            .fold(palette, |palette, (name, hex)| palette.with_stroke(name, hex))
    }
}

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
#[must_use]
pub fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = hex_byte(&hex[0..1].repeat(2))?;
            let g = hex_byte(&hex[1..2].repeat(2))?;
            let b = hex_byte(&hex[2..3].repeat(2))?;
            Some((r, g, b))
        }
        6 => {
            let r = hex_byte(&hex[0..2])?;
            let g = hex_byte(&hex[2..4])?;
            let b = hex_byte(&hex[4..6])?;
            Some((r, g, b))
        }
        _ => None,
    }
}

fn hex_byte(digits: &str) -> Option<u8> {
    u8::from_str_radix(digits, 16).ok()
}

/// Normalize a color to canonical lowercase `#rrggbb`.
#[must_use]
pub fn normalize_hex_color(value: &str, fallback: &str) -> String {
    let fallback_rgb = parse_hex_rgb(fallback).unwrap_or((128, 128, 128));
    let (r, g, b) = parse_hex_rgb(value).unwrap_or(fallback_rgb);
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
#[path = "palette_test.rs"]
mod tests;
