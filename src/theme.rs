//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Colours for everything the scene draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Outline of committed blocks and of letter pieces.
    pub block: Color,
    /// Outline of the falling bomb.
    pub bomb: Color,
    pub particle: Color,
    /// Playfield border.
    pub border: Color,
    /// Sidebar and menu text.
    pub text: Color,
    /// Game-over button fill.
    pub button: Color,
    /// Background per intensity level (0..=2).
    pub background: [Color; 3],
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// White outlines on teal, darkening to deep blue as the score climbs.
    pub fn classic() -> Self {
        Self {
            block: Color::Rgb(0xFF, 0xFF, 0xFF),
            bomb: Color::Rgb(0xFF, 0x00, 0x00),
            particle: Color::Rgb(0xFF, 0xFF, 0x00),
            border: Color::Rgb(0xFF, 0xFF, 0xFF),
            text: Color::Rgb(0xFF, 0xFF, 0xFF),
            button: Color::Rgb(0x00, 0x00, 0xFF),
            background: [
                Color::Rgb(0x00, 0x33, 0x33),
                Color::Rgb(0x00, 0x00, 0x66),
                Color::Rgb(0x00, 0x00, 0x99),
            ],
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Keys missing from the file keep their classic colour; no path means the classic theme.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let Some(path) = path else {
            return Ok(Self::classic());
        };
        let s = std::fs::read_to_string(path)?;
        Self::from_map(&parse_theme_file(&s))
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let base = Self::classic();
        let get = |key: &str, fallback: Color| -> Result<Color, ThemeError> {
            map.get(key).map_or(Ok(fallback), |v| parse_hex(v))
        };
        Ok(Self {
            block: get("block", base.block)?,
            bomb: get("bomb", base.bomb)?,
            particle: get("particle", base.particle)?,
            border: get("border", base.border)?,
            text: get("text", base.text)?,
            button: get("button", base.button)?,
            background: [
                get("background_0", base.background[0])?,
                get("background_1", base.background[1])?,
                get("background_2", base.background[2])?,
            ],
        })
    }

    /// Background for an intensity level; levels past the last tier use the last tier.
    #[inline]
    pub fn background_for(&self, intensity: u8) -> Color {
        self.background[usize::from(intensity).min(self.background.len() - 1)]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    if !hex.is_ascii() {
        return Err(invalid());
    }
    match hex.len() {
        6 => Ok(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => Ok(Color::Rgb(
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        )),
        _ => Err(invalid()),
    }
}
