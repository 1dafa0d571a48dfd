//! Attributes - Concrete Variants of a Feature

use serde::{Deserialize, Serialize};

use crate::config::GlobalConfig;

/// Which theme color a color-variant attribute is painted with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRole {
    Primary,
    Accent,
}

/// Markers that tag an attribute name as a color variant, e.g. `hat@p`
#[derive(Debug, Clone, Default)]
pub struct ColorSigns {
    pub primary: Option<String>,
    pub accent: Option<String>,
}

impl ColorSigns {
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            primary: config.primary_color_sign.clone().filter(|s| !s.is_empty()),
            accent: config.accent_color_sign.clone().filter(|s| !s.is_empty()),
        }
    }

    /// Earliest sign occurrence in `name`, as (byte offset, role)
    fn locate(&self, name: &str) -> Option<(usize, ColorRole)> {
        let primary = self
            .primary
            .as_deref()
            .and_then(|sign| name.find(sign))
            .map(|at| (at, ColorRole::Primary));
        let accent = self
            .accent
            .as_deref()
            .and_then(|sign| name.find(sign))
            .map(|at| (at, ColorRole::Accent));
        match (primary, accent) {
            (Some(p), Some(a)) => Some(if a.0 < p.0 { a } else { p }),
            (p, a) => p.or(a),
        }
    }
}

/// One chosen trait: a feature plus the variant name found in the asset store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Attribute {
    pub feature: String,
    pub name: String,
    #[serde(skip)]
    base_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorRole>,
}

impl Attribute {
    /// An attribute with no color tagging
    pub fn new(feature: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            feature: feature.into(),
            base_len: name.len(),
            name,
            color: None,
        }
    }

    /// An attribute whose name may carry a color-variant suffix
    pub fn tagged(feature: impl Into<String>, name: impl Into<String>, signs: &ColorSigns) -> Self {
        let name = name.into();
        let (base_len, color) = match signs.locate(&name) {
            Some((at, role)) => (at, Some(role)),
            None => (name.len(), None),
        };
        Self {
            feature: feature.into(),
            name,
            base_len,
            color,
        }
    }

    /// Name used for settings lookup, with any color suffix removed
    pub fn name_without_color(&self) -> &str {
        &self.name[..self.base_len]
    }

    /// Relative asset key: `{feature}/{name}`
    pub fn asset_key(&self) -> String {
        format!("{}/{}", self.feature, self.name)
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.feature, self.name)
    }
}
