//! Settings Cascade - Effective Settings per Attribute
//!
//! Effective settings are produced by folding override sections over a base
//! value, from least to most specific:
//!
//! 1. global defaults (hard defaults, then the document's `default` section)
//! 2. `attribute-settings.<feature>.default`
//! 3. `attribute-settings.<feature>.<name>`
//! 4. the slot's own `attributes.default`, then `attributes.<name>`
//!
//! Each step is a pure reducer: it takes a settings value and a section and
//! returns a new value. Fields absent from a section are inherited.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::attribute::Attribute;
use crate::config::ConfigError;
use crate::parse::{parse_bool, parse_float, parse_point, Point};

/// A raw configuration mapping
pub type Section = Map<String, Value>;

pub const DEFAULT_KEY: &str = "default";

/// Look up a nested mapping; a missing or `null` entry is treated as absent
pub fn subsection<'a>(section: &'a Section, key: &str) -> Result<Option<&'a Section>, ConfigError> {
    match section.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ConfigError::InvalidSection(key.to_string())),
    }
}

/// A declared sampling point for one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub feature: String,
    pub position: Point,
    pub attributes_section: Section,
}

impl Slot {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            position: Point::ORIGIN,
            attributes_section: Section::new(),
        }
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }
}

/// Parse a `feature -> { position, attributes }` mapping, keeping declaration order
pub fn parse_slots(section: &Section) -> Result<Vec<Slot>, ConfigError> {
    section
        .iter()
        .map(|(feature, value)| {
            let values = match value {
                Value::Null => None,
                Value::Object(map) => Some(map),
                _ => return Err(ConfigError::InvalidSection(feature.clone())),
            };
            let position = match values.and_then(|v| v.get("position")) {
                None | Some(Value::Null) => Point::ORIGIN,
                Some(raw) => parse_point("position", raw)?,
            };
            let attributes_section = match values {
                Some(v) => subsection(v, "attributes")?.cloned().unwrap_or_default(),
                None => Section::new(),
            };
            Ok(Slot {
                feature: feature.clone(),
                position,
                attributes_section,
            })
        })
        .collect()
}

/// Global defaults every cascade starts from. Never carries slots.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseSettings {
    pub weight: f64,
    pub position: Point,
    pub anchor_point: Point,
    pub behind: bool,
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            weight: 1.0,
            position: Point::ORIGIN,
            anchor_point: Point::ORIGIN,
            behind: false,
        }
    }
}

impl BaseSettings {
    /// Hard defaults overridden by a document-level `default` section
    pub fn from_section(section: &Section) -> Result<Self, ConfigError> {
        let probe = AttributeSettings::from_base(Attribute::new("", ""), &Self::default());
        let mut without_slots = section.clone();
        without_slots.remove("slots");
        let resolved = probe.with_overrides(&without_slots)?;
        Ok(Self {
            weight: resolved.weight,
            position: resolved.position,
            anchor_point: resolved.anchor_point,
            behind: resolved.behind,
        })
    }
}

/// Fully resolved settings for one attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeSettings {
    pub attribute: Attribute,
    pub weight: f64,
    pub position: Point,
    pub anchor_point: Point,
    pub behind: bool,
    pub slots: Vec<Slot>,
}

impl AttributeSettings {
    pub fn from_base(attribute: Attribute, base: &BaseSettings) -> Self {
        Self {
            attribute,
            weight: base.weight,
            position: base.position,
            anchor_point: base.anchor_point,
            behind: base.behind,
            slots: Vec::new(),
        }
    }

    /// Apply one override section. A present `slots` key replaces the slot list.
    pub fn with_overrides(self, values: &Section) -> Result<Self, ConfigError> {
        let weight = match values.get("weight") {
            Some(v) => parse_float("weight", v)?,
            None => self.weight,
        };
        let position = match values.get("position") {
            Some(v) => parse_point("position", v)?,
            None => self.position,
        };
        let anchor_point = match values.get("anchor_point") {
            Some(v) => parse_point("anchor_point", v)?,
            None => self.anchor_point,
        };
        let behind = match values.get("behind") {
            Some(v) => parse_bool("behind", v)?,
            None => self.behind,
        };
        let slots = if values.contains_key("slots") {
            match subsection(values, "slots")? {
                Some(section) => parse_slots(section)?,
                None => Vec::new(),
            }
        } else {
            self.slots
        };

        Ok(Self {
            attribute: self.attribute,
            weight,
            position,
            anchor_point,
            behind,
            slots,
        })
    }

    /// Apply a section's `default` entry, then its entry for this attribute
    fn with_layer(self, section: Option<&Section>) -> Result<Self, ConfigError> {
        let Some(section) = section else {
            return Ok(self);
        };
        let settings = match subsection(section, DEFAULT_KEY)? {
            Some(defaults) => self.with_overrides(defaults)?,
            None => self,
        };
        let name = settings.attribute.name_without_color().to_string();
        match subsection(section, &name)? {
            Some(specific) => settings.with_overrides(specific),
            None => Ok(settings),
        }
    }
}

/// Computes effective settings from the document's cascade
#[derive(Debug, Clone, Copy)]
pub struct SettingsResolver<'a> {
    base: &'a BaseSettings,
    attribute_settings: &'a Section,
}

impl<'a> SettingsResolver<'a> {
    pub fn new(base: &'a BaseSettings, attribute_settings: &'a Section) -> Self {
        Self {
            base,
            attribute_settings,
        }
    }

    /// Resolve `attribute` as chosen within a slot carrying `attributes_section`
    pub fn resolve(
        &self,
        attribute: &Attribute,
        attributes_section: &Section,
    ) -> Result<AttributeSettings, ConfigError> {
        let feature_section = subsection(self.attribute_settings, &attribute.feature)?;
        AttributeSettings::from_base(attribute.clone(), self.base)
            .with_layer(feature_section)?
            .with_layer(Some(attributes_section))
    }
}
