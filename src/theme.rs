use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());

/// YIQ brightness above which dark text is used on top of a fill.
const LIGHT_FILL_THRESHOLD: f32 = 150.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    /// Text drawn on light fills.
    pub text_color: String,
    /// Text drawn on dark fills.
    pub light_text_color: String,
    /// Wide underlay stroke behind every edge.
    pub edge_outline_color: String,
    pub default_edge_color: String,
    pub node_stroke_width: f32,
    pub background: String,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            text_color: "#1e1e1e".to_string(),
            light_text_color: "#f5f5f5".to_string(),
            edge_outline_color: "#1e1e1e".to_string(),
            default_edge_color: "black".to_string(),
            node_stroke_width: 2.0,
            background: "#2b2b2b".to_string(),
        }
    }

    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 14.0,
            text_color: "#1C2430".to_string(),
            light_text_color: "#FFFFFF".to_string(),
            edge_outline_color: "#7A8AA6".to_string(),
            default_edge_color: "#333333".to_string(),
            node_stroke_width: 2.0,
            background: "#FFFFFF".to_string(),
        }
    }

    /// Text color that stays readable on top of `fill`.
    ///
    /// Non-hex colors (named colors, `hsl(...)`) are treated as dark fills.
    pub fn fore_color(&self, fill: &str) -> &str {
        match hex_brightness(fill) {
            Some(brightness) if brightness >= LIGHT_FILL_THRESHOLD => &self.text_color,
            _ => &self.light_text_color,
        }
    }
}

fn hex_brightness(color: &str) -> Option<f32> {
    let caps = HEX_COLOR_RE.captures(color.trim())?;
    let digits = caps.get(1)?.as_str();
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };
    let channel = |idx: usize| u8::from_str_radix(&expanded[idx..idx + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    Some((r as f32 * 299.0 + g as f32 * 587.0 + b as f32 * 114.0) / 1000.0)
}
