//! Global Configuration - Explicit, Load-Once Settings
//!
//! Built once at startup and passed by reference to every component that
//! needs it. Documents are JSON or TOML, picked by file extension.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::parse::Point;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported configuration format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Invalid value for `{field}`: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Section `{0}` must be a mapping")]
    InvalidSection(String),

    #[error("Could not find primary color for {0}")]
    MissingPrimaryColor(String),

    #[error("Invalid color `{0}`")]
    InvalidColor(String),

    #[error("Slot nesting deeper than {0} levels under feature `{1}`")]
    SlotDepthExceeded(usize, String),
}

/// How positions and anchor points in the attribute document are measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionMode {
    /// Absolute pixels on the canvas
    #[default]
    Pixels,
    /// Positions are fractions of the canvas edge, anchors fractions of the layer image
    Relative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    pub size: u32,
    #[serde(default = "default_scale")]
    pub assets_scale: f64,
    #[serde(default)]
    pub position_mode: PositionMode,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default)]
    pub shadow_position: Point,
    #[serde(default = "default_true")]
    pub shadow: bool,
    #[serde(default)]
    pub primary_color_sign: Option<String>,
    #[serde(default)]
    pub accent_color_sign: Option<String>,
    #[serde(default)]
    pub write_manifest: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_scale() -> f64 { 1.0 }
fn default_true() -> bool { true }
fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_assets_dir() -> PathBuf { PathBuf::from("assets") }
fn default_background() -> String { "#00000000".to_string() }

impl GlobalConfig {
    /// Minimal configuration for a square canvas, everything else defaulted
    pub fn with_size(size: u32) -> Self {
        Self {
            size,
            assets_scale: default_scale(),
            position_mode: PositionMode::default(),
            output_dir: default_output_dir(),
            assets_dir: default_assets_dir(),
            background_color: default_background(),
            shadow_position: Point::ORIGIN,
            shadow: true,
            primary_color_sign: None,
            accent_color_sign: None,
            write_manifest: false,
            seed: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = load_document(path)?;
        config.check()?;
        Ok(config)
    }

    /// Reject values that would make rendering meaningless
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "size".into(),
                value: "0".into(),
                reason: "canvas size must be positive".into(),
            });
        }
        if !(self.assets_scale.is_finite() && self.assets_scale > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "assets-scale".into(),
                value: self.assets_scale.to_string(),
                reason: "scale must be a positive number".into(),
            });
        }
        crate::colors::parse_rgba(&self.background_color)?;
        Ok(())
    }
}

/// Read a JSON or TOML document into any deserializable type
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("toml") => Ok(toml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_config_with_tuple_string() {
        let config: GlobalConfig = toml::from_str(
            r#"
            size = 512
            assets-scale = 0.5
            output-dir = "out"
            shadow-position = "(10, 20)"
            primary-color-sign = "@p"
            "#,
        )
        .unwrap();
        assert_eq!(config.size, 512);
        assert_eq!(config.assets_scale, 0.5);
        assert_eq!(config.position_mode, PositionMode::Pixels);
        assert_eq!(config.shadow_position, Point::new(10.0, 20.0));
        assert_eq!(config.primary_color_sign.as_deref(), Some("@p"));
        config.check().unwrap();
    }

    #[test]
    fn test_position_mode_relative() {
        let config: GlobalConfig =
            serde_json::from_str(r#"{"size": 64, "position-mode": "RELATIVE"}"#).unwrap();
        assert_eq!(config.position_mode, PositionMode::Relative);
    }

    #[test]
    fn test_malformed_shadow_position_is_fatal() {
        let result: Result<GlobalConfig, _> =
            serde_json::from_str(r#"{"size": 64, "shadow-position": "(1, two)"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_rejects_bad_background() {
        let mut config = GlobalConfig::with_size(32);
        config.background_color = "not-a-color".into();
        assert!(config.check().is_err());
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "size = 1").unwrap();
        let err = GlobalConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
