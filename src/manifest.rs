//! Artifact Manifests - Property Lists and Fingerprints
//!
//! The fingerprint is a SHA-256 over the canonical JSON of the theme and
//! property list, so identical picks always hash identically regardless of
//! when or in which run they were generated.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::parse::Point;
use crate::tree::Layer;

/// One chosen trait as listed in an artifact's manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub feature: String,
    pub name: String,
    pub position: Point,
}

impl From<&Layer> for Property {
    fn from(layer: &Layer) -> Self {
        Self {
            feature: layer.attribute.feature.clone(),
            name: layer.attribute.name.clone(),
            position: layer.position,
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.feature, self.name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactManifest {
    pub name: String,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub theme: Option<String>,
    pub properties: Vec<Property>,
    pub fingerprint: String,
}

impl ArtifactManifest {
    pub fn new(
        name: &str,
        run_id: Uuid,
        theme: Option<String>,
        properties: Vec<Property>,
    ) -> Result<Self, serde_json::Error> {
        let fingerprint = fingerprint(theme.as_deref(), &properties)?;
        Ok(Self {
            name: name.to_string(),
            run_id,
            created_at: Utc::now(),
            theme,
            properties,
            fingerprint,
        })
    }

    /// `[feature: name, ...]` in render order
    pub fn property_list(&self) -> String {
        let items: Vec<String> = self.properties.iter().map(ToString::to_string).collect();
        format!("[{}]", items.join(", "))
    }
}

/// Hex SHA-256 of the canonical theme + property JSON
pub fn fingerprint(theme: Option<&str>, properties: &[Property]) -> Result<String, serde_json::Error> {
    let value = serde_json::json!({
        "theme": theme,
        "properties": properties,
    });
    let canonical = serde_json::to_string(&sorted(value))?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Recursively sort object keys; insertion order would otherwise leak into the hash
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
