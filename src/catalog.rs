//! Asset Store - Candidate Discovery and Image Loading
//!
//! Layout on disk: `{assets-dir}/{feature}/{attribute}.png` plus
//! `{assets-dir}/shadow.png`. Sub-directories of a feature directory also
//! count as attribute names.

use image::RgbaImage;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const SHADOW_KEY: &str = "shadow";

/// Enumerates the attribute names available for a feature
pub trait AttributeCatalog {
    /// Sorted, de-duplicated names. Unknown features yield an empty list.
    fn attribute_names(&self, feature: &str) -> Vec<String>;
}

/// Loads layer images by relative key (`{feature}/{name}` or `shadow`)
pub trait AssetSource {
    /// `None` when the asset is missing or unreadable
    fn load(&self, key: &str) -> Option<RgbaImage>;
}

/// Filesystem-backed store rooted at `assets-dir`
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.png"))
    }
}

impl AttributeCatalog for DirectoryStore {
    fn attribute_names(&self, feature: &str) -> Vec<String> {
        let dir = self.root.join(feature);
        if !dir.is_dir() {
            return vec![];
        }
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Could not list feature directory");
                return vec![];
            }
        };

        let mut names = BTreeSet::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_png = path.extension().is_some_and(|e| e == "png");
            if path.is_dir() || is_png {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.insert(stem.to_string());
                }
            }
        }
        names.into_iter().collect()
    }
}

impl AssetSource for DirectoryStore {
    fn load(&self, key: &str) -> Option<RgbaImage> {
        let path = self.path_for(key);
        if !path.is_file() {
            warn!(path = %path.display(), "Could not find asset");
            return None;
        }
        match image::open(&path) {
            Ok(img) => {
                debug!(path = %path.display(), "Loaded asset");
                Some(img.to_rgba8())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not decode asset");
                None
            }
        }
    }
}

/// In-memory store, handy for fixtures and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    features: HashMap<String, BTreeSet<String>>,
    images: HashMap<String, RgbaImage>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate name without an image
    pub fn add_name(&mut self, feature: &str, name: &str) -> &mut Self {
        self.features
            .entry(feature.to_string())
            .or_default()
            .insert(name.to_string());
        self
    }

    /// Register a candidate with its layer image
    pub fn add(&mut self, feature: &str, name: &str, image: RgbaImage) -> &mut Self {
        self.add_name(feature, name);
        self.images.insert(format!("{feature}/{name}"), image);
        self
    }

    pub fn set_shadow(&mut self, image: RgbaImage) -> &mut Self {
        self.images.insert(SHADOW_KEY.to_string(), image);
        self
    }
}

impl AttributeCatalog for MemoryStore {
    fn attribute_names(&self, feature: &str) -> Vec<String> {
        self.features
            .get(feature)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl AssetSource for MemoryStore {
    fn load(&self, key: &str) -> Option<RgbaImage> {
        let image = self.images.get(key).cloned();
        if image.is_none() {
            warn!(key = %key, "Could not find asset");
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_directory_enumeration() {
        let dir = tempfile::tempdir().unwrap();
        let hats = dir.path().join("hat");
        fs::create_dir_all(hats.join("crown")).unwrap();
        RgbaImage::new(2, 2).save(hats.join("cap.png")).unwrap();
        RgbaImage::new(2, 2).save(hats.join("beanie@p.png")).unwrap();
        fs::write(hats.join("notes.txt"), "ignored").unwrap();

        let store = DirectoryStore::new(dir.path());
        assert_eq!(store.attribute_names("hat"), vec!["beanie@p", "cap", "crown"]);
        assert!(store.attribute_names("missing").is_empty());
    }

    #[test]
    fn test_directory_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("body")).unwrap();
        RgbaImage::from_pixel(3, 1, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("body/red.png"))
            .unwrap();

        let store = DirectoryStore::new(dir.path());
        let image = store.load("body/red").unwrap();
        assert_eq!(image.dimensions(), (3, 1));
        assert_eq!(image.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
        assert!(store.load("body/blue").is_none());
        assert!(store.load(SHADOW_KEY).is_none());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.add("body", "red", RgbaImage::new(1, 1)).add_name("body", "blue");
        assert_eq!(store.attribute_names("body"), vec!["blue", "red"]);
        assert!(store.load("body/red").is_some());
        assert!(store.load("body/blue").is_none());
    }
}
