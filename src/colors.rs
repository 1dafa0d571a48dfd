//! Color Themes - Palettes for Color-Variant Attributes
//!
//! A theme pairs a primary and an accent color. Either is a single hex color
//! or a gradient of hex stops. Attributes tagged with a color sign are tinted
//! with the matching theme color at render time.

use image::{Rgba, RgbaImage};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::attribute::ColorRole;
use crate::config::ConfigError;
use crate::parse::parse_float;
use crate::settings::Section;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "color", rename_all = "UPPERCASE")]
pub enum ColorSettings {
    Basic(String),
    Gradient(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorTheme {
    pub name: String,
    pub weight: f64,
    pub primary: ColorSettings,
    pub accent: ColorSettings,
}

impl ColorTheme {
    pub fn color_for(&self, role: ColorRole) -> &ColorSettings {
        match role {
            ColorRole::Primary => &self.primary,
            ColorRole::Accent => &self.accent,
        }
    }
}

/// Parse every theme in a `colors` section
pub fn resolve_themes(
    colors: &Section,
    default_weight: f64,
) -> Result<BTreeMap<String, ColorTheme>, ConfigError> {
    let mut themes = BTreeMap::new();

    for (name, value) in colors {
        let values = match value {
            Value::Object(map) => map,
            _ => return Err(ConfigError::InvalidSection(name.clone())),
        };

        let weight = match values.get("weight") {
            Some(v) => parse_float("weight", v)?,
            None => default_weight,
        };

        let primary = match values.get("primary") {
            None | Some(Value::Null) => return Err(ConfigError::MissingPrimaryColor(name.clone())),
            Some(v) => parse_color_settings(v)?,
        };
        let accent = match values.get("accent") {
            None | Some(Value::Null) => primary.clone(),
            Some(v) => parse_color_settings(v)?,
        };

        themes.insert(
            name.clone(),
            ColorTheme {
                name: name.clone(),
                weight,
                primary,
                accent,
            },
        );
    }

    Ok(themes)
}

/// Parse `{type, color}`, or a bare color value as shorthand for BASIC
pub fn parse_color_settings(value: &Value) -> Result<ColorSettings, ConfigError> {
    let (kind, color) = match value {
        Value::Object(map) => {
            let kind = match map.get("type") {
                None | Some(Value::Null) => "BASIC".to_string(),
                Some(Value::String(s)) => s.to_ascii_uppercase(),
                Some(other) => return Err(ConfigError::InvalidColor(other.to_string())),
            };
            let color = map.get("color").ok_or_else(|| ConfigError::InvalidValue {
                field: "color".into(),
                value: value.to_string(),
                reason: "missing color".into(),
            })?;
            (kind, color)
        }
        other => ("BASIC".to_string(), other),
    };

    if kind == "GRADIENT" {
        let stops: Vec<String> = match color {
            Value::String(s) => s
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split(',')
                .map(|stop| normalize_hex(stop.trim()))
                .collect(),
            Value::Array(items) => items.iter().map(scalar_color).collect::<Result<_, _>>()?,
            other => return Err(ConfigError::InvalidColor(other.to_string())),
        };
        for stop in &stops {
            parse_rgba(stop)?;
        }
        Ok(ColorSettings::Gradient(stops))
    } else {
        let hex = scalar_color(color)?;
        parse_rgba(&hex)?;
        Ok(ColorSettings::Basic(hex))
    }
}

fn scalar_color(value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(normalize_hex(s.trim())),
        Value::Number(n) => Ok(normalize_hex(&n.to_string())),
        other => Err(ConfigError::InvalidColor(other.to_string())),
    }
}

/// Strip `#` and left-pad with zeros to six digits
pub fn normalize_hex(raw: &str) -> String {
    format!("{:0>6}", raw.trim_start_matches('#'))
}

/// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`
pub fn parse_rgba(raw: &str) -> Result<Rgba<u8>, ConfigError> {
    let hex = raw.trim().trim_start_matches('#');
    let invalid = || ConfigError::InvalidColor(raw.to_string());

    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, alpha]))
}

/// Multiply an image's color channels by a theme color, keeping alpha.
/// Gradients run top to bottom across the stops.
pub fn tint(image: &mut RgbaImage, color: &ColorSettings) -> Result<(), ConfigError> {
    let stops: Vec<Rgba<u8>> = match color {
        ColorSettings::Basic(hex) => vec![parse_rgba(hex)?],
        ColorSettings::Gradient(hexes) => hexes.iter().map(|h| parse_rgba(h)).collect::<Result<_, _>>()?,
    };
    if stops.is_empty() {
        return Ok(());
    }

    let height = image.height();
    for (_, y, pixel) in image.enumerate_pixels_mut() {
        let t = if height > 1 { y as f32 / (height - 1) as f32 } else { 0.0 };
        let tone = sample_stops(&stops, t);
        for c in 0..3 {
            pixel.0[c] = ((pixel.0[c] as f32 * tone[c]) / 255.0).round() as u8;
        }
    }
    Ok(())
}

fn sample_stops(stops: &[Rgba<u8>], t: f32) -> [f32; 3] {
    if stops.len() == 1 {
        let s = stops[0].0;
        return [s[0] as f32, s[1] as f32, s[2] as f32];
    }
    let scaled = t.clamp(0.0, 1.0) * (stops.len() - 1) as f32;
    let index = (scaled.floor() as usize).min(stops.len() - 2);
    let local = scaled - index as f32;
    let (a, b) = (stops[index].0, stops[index + 1].0);
    let mix = |c: usize| a[c] as f32 + (b[c] as f32 - a[c] as f32) * local;
    [mix(0), mix(1), mix(2)]
}
