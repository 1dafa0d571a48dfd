//! Generation Pipeline - Single Entry Point
//!
//! sample tree -> render canvas -> persist. Configuration errors abort;
//! a failure to persist one artifact is recorded and the batch moves on.

use image::RgbaImage;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::attribute::ColorSigns;
use crate::catalog::{AssetSource, AttributeCatalog};
use crate::colors::ColorTheme;
use crate::config::{ConfigError, GlobalConfig};
use crate::document::AttributeDocument;
use crate::manifest::{ArtifactManifest, Property};
use crate::render::CompositionEngine;
use crate::sampler::{choose_weighted, SlotSampler};
use crate::tree::{CompositionTree, Layer};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Chosen layers for one artifact, before rendering
#[derive(Debug, Clone)]
pub struct Nft {
    pub name: String,
    pub theme: Option<ColorTheme>,
    pub layers: Vec<Layer>,
}

impl Nft {
    pub fn properties(&self) -> Vec<Property> {
        self.layers.iter().map(Property::from).collect()
    }
}

/// A rendered artifact and its manifest
#[derive(Debug, Clone)]
pub struct Artifact {
    pub manifest: ArtifactManifest,
    pub canvas: RgbaImage,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub saved: Vec<ArtifactManifest>,
    pub failed: Vec<(String, String)>,
}

/// Asset stores usable by the pipeline: candidate discovery plus image loading
pub trait AssetStore: AttributeCatalog + AssetSource {}

impl<T: AttributeCatalog + AssetSource> AssetStore for T {}

pub struct GenerationPipeline<S: AssetStore> {
    config: GlobalConfig,
    document: AttributeDocument,
    store: S,
    signs: ColorSigns,
    run_id: Uuid,
}

impl<S: AssetStore> GenerationPipeline<S> {
    pub fn new(config: GlobalConfig, document: AttributeDocument, store: S) -> Result<Self, PipelineError> {
        config.check()?;
        let signs = ColorSigns::from_config(&config);
        Ok(Self {
            config,
            document,
            store,
            signs,
            run_id: Uuid::new_v4(),
        })
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Sample a theme and a full attribute tree
    pub fn generate<R: Rng + ?Sized>(&self, name: &str, rng: &mut R) -> Result<Nft, PipelineError> {
        let themes: Vec<&ColorTheme> = self.document.themes().values().collect();
        let theme = choose_weighted(&themes, |t| t.weight, rng).map(|t| (*t).clone());

        let sampler = SlotSampler::new(&self.store, self.document.resolver(), &self.signs);
        let tree = CompositionTree::build(&sampler, self.document.base_slots(), rng)?;

        Ok(Nft {
            name: name.to_string(),
            theme,
            layers: tree.layers(),
        })
    }

    pub fn render(&self, nft: &Nft) -> Result<RgbaImage, PipelineError> {
        let engine = CompositionEngine::new(&self.config, &self.store)?;
        Ok(engine.render(&nft.layers, nft.theme.as_ref())?)
    }

    /// Generate and render one artifact
    pub fn create<R: Rng + ?Sized>(&self, name: &str, rng: &mut R) -> Result<Artifact, PipelineError> {
        let nft = self.generate(name, rng)?;
        let canvas = self.render(&nft)?;
        let manifest = ArtifactManifest::new(
            &nft.name,
            self.run_id,
            nft.theme.as_ref().map(|t| t.name.clone()),
            nft.properties(),
        )?;
        Ok(Artifact { manifest, canvas })
    }

    /// Write `{output-dir}/{name}.png`, plus `{name}.json` when manifests are enabled
    pub fn save(&self, artifact: &Artifact) -> Result<PathBuf, PipelineError> {
        let out = &self.config.output_dir;
        fs::create_dir_all(out).map_err(|source| PipelineError::Write {
            path: out.clone(),
            source,
        })?;

        let image_path = out.join(format!("{}.png", artifact.manifest.name));
        artifact
            .canvas
            .save(&image_path)
            .map_err(|source| PipelineError::Encode {
                path: image_path.clone(),
                source,
            })?;

        if self.config.write_manifest {
            let manifest_path = out.join(format!("{}.json", artifact.manifest.name));
            write_manifest(&manifest_path, &artifact.manifest)?;
        }

        Ok(image_path)
    }

    /// Generate `count` artifacts named `0..count`, one after another.
    ///
    /// `on_saved` runs after each artifact is persisted.
    pub fn generate_batch<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
        mut on_saved: impl FnMut(&ArtifactManifest),
    ) -> Result<BatchReport, PipelineError> {
        let mut report = BatchReport::default();

        for index in 0..count {
            let name = index.to_string();
            let artifact = self.create(&name, rng)?;

            match self.save(&artifact) {
                Ok(path) => {
                    info!(name = %name, path = %path.display(), "Saved artifact");
                    on_saved(&artifact.manifest);
                    report.saved.push(artifact.manifest);
                }
                Err(e) => {
                    error!(name = %name, error = %e, "Could not save artifact, make sure the file is not open in another program");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        Ok(report)
    }
}

fn write_manifest(path: &Path, manifest: &ArtifactManifest) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(path, json).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })
}
