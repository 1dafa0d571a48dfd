//! NftGen Core - Layered Collectible Image Generator
//!
//! # Flow
//! 1. The asset store lists candidate attributes per feature
//! 2. The settings cascade resolves weight, placement and nested slots
//! 3. Slots are sampled by weight into a composition tree
//! 4. The tree is flattened in z-order and composited onto a canvas

pub mod attribute;
pub mod catalog;
pub mod colors;
pub mod command;
pub mod config;
pub mod document;
pub mod manifest;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod sampler;
pub mod settings;
pub mod tree;

pub use attribute::{Attribute, ColorRole, ColorSigns};
pub use catalog::{AssetSource, AttributeCatalog, DirectoryStore, MemoryStore};
pub use colors::{ColorSettings, ColorTheme};
pub use command::{Command, CommandError};
pub use config::{ConfigError, GlobalConfig, PositionMode};
pub use document::AttributeDocument;
pub use manifest::{ArtifactManifest, Property};
pub use parse::Point;
pub use pipeline::{Artifact, BatchReport, GenerationPipeline, Nft, PipelineError};
pub use render::CompositionEngine;
pub use sampler::SlotSampler;
pub use settings::{AttributeSettings, SettingsResolver, Slot};
pub use tree::{CompositionTree, Layer};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
