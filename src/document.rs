//! Attribute Document - Slots, Defaults, Per-Feature Settings and Themes
//!
//! Document-level sections are parsed on load so malformed base slots, global
//! defaults or color themes fail before anything is generated. Per-attribute
//! sections stay raw and are folded by the settings cascade on demand.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::colors::{resolve_themes, ColorTheme};
use crate::config::{load_document, ConfigError};
use crate::settings::{parse_slots, subsection, BaseSettings, Section, SettingsResolver, Slot};

#[derive(Debug, Clone)]
pub struct AttributeDocument {
    base_slots: Vec<Slot>,
    base: BaseSettings,
    attribute_settings: Section,
    themes: BTreeMap<String, ColorTheme>,
}

impl AttributeDocument {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let value: Value = load_document(path)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let root = match value {
            Value::Object(map) => map,
            Value::Null => Section::new(),
            _ => return Err(ConfigError::InvalidSection("<root>".into())),
        };

        let base_slots = match subsection(&root, "base-slots")? {
            Some(section) => parse_slots(section)?,
            None => vec![],
        };
        let base = match subsection(&root, "default")? {
            Some(section) => BaseSettings::from_section(section)?,
            None => BaseSettings::default(),
        };
        let attribute_settings = subsection(&root, "attribute-settings")?
            .cloned()
            .unwrap_or_default();
        let themes = match subsection(&root, "colors")? {
            Some(section) => resolve_themes(section, base.weight)?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            base_slots,
            base,
            attribute_settings,
            themes,
        })
    }

    pub fn base_slots(&self) -> &[Slot] {
        &self.base_slots
    }

    pub fn base_settings(&self) -> &BaseSettings {
        &self.base
    }

    pub fn themes(&self) -> &BTreeMap<String, ColorTheme> {
        &self.themes
    }

    pub fn resolver(&self) -> SettingsResolver<'_> {
        SettingsResolver::new(&self.base, &self.attribute_settings)
    }
}
