//! Composition Engine - Layers onto a Canvas
//!
//! Missing assets never abort a render: the layer is skipped with a warning.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::catalog::{AssetSource, SHADOW_KEY};
use crate::colors::{self, ColorTheme};
use crate::config::{ConfigError, GlobalConfig, PositionMode};
use crate::parse::Point;
use crate::tree::Layer;

pub struct CompositionEngine<'a> {
    config: &'a GlobalConfig,
    assets: &'a dyn AssetSource,
    background: Rgba<u8>,
}

impl<'a> CompositionEngine<'a> {
    pub fn new(config: &'a GlobalConfig, assets: &'a dyn AssetSource) -> Result<Self, ConfigError> {
        Ok(Self {
            config,
            assets,
            background: colors::parse_rgba(&config.background_color)?,
        })
    }

    /// Blank canvas of the configured size and background color
    pub fn canvas(&self) -> RgbaImage {
        RgbaImage::from_pixel(self.config.size, self.config.size, self.background)
    }

    /// Render layers bottom to top, shadow first when enabled
    pub fn render(&self, layers: &[Layer], theme: Option<&ColorTheme>) -> Result<RgbaImage, ConfigError> {
        let mut canvas = self.canvas();

        if self.config.shadow {
            if let Some(shadow) = self.load_scaled(SHADOW_KEY) {
                let (x, y) = self.placement(self.config.shadow_position, Point::ORIGIN, &shadow);
                imageops::overlay(&mut canvas, &shadow, x, y);
            }
        }

        for layer in layers {
            let key = layer.attribute.asset_key();
            let Some(mut image) = self.load_scaled(&key) else {
                warn!(attribute = %layer.attribute, "Skipping layer without asset");
                continue;
            };
            if let (Some(role), Some(theme)) = (layer.attribute.color, theme) {
                colors::tint(&mut image, theme.color_for(role))?;
            }
            let (x, y) = self.placement(layer.position, layer.anchor_point, &image);
            debug!(attribute = %layer.attribute, x, y, "Compositing layer");
            imageops::overlay(&mut canvas, &image, x, y);
        }

        Ok(canvas)
    }

    /// Top-left pixel for an image placed at `position` aligned on `anchor`
    pub fn placement(&self, position: Point, anchor: Point, image: &RgbaImage) -> (i64, i64) {
        let (x, y) = match self.config.position_mode {
            PositionMode::Pixels => {
                let scale = self.config.assets_scale;
                (position.x - anchor.x * scale, position.y - anchor.y * scale)
            }
            PositionMode::Relative => {
                let size = self.config.size as f64;
                (
                    position.x * size - anchor.x * image.width() as f64,
                    position.y * size - anchor.y * image.height() as f64,
                )
            }
        };
        (x.round() as i64, y.round() as i64)
    }

    fn load_scaled(&self, key: &str) -> Option<RgbaImage> {
        let image = self.assets.load(key)?;
        let scale = self.config.assets_scale;
        if scale == 1.0 {
            return Some(image);
        }
        let width = ((image.width() as f64 * scale).round() as u32).max(1);
        let height = ((image.height() as f64 * scale).round() as u32).max(1);
        Some(imageops::resize(&image, width, height, FilterType::Lanczos3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, ColorRole, ColorSigns};
    use crate::catalog::MemoryStore;
    use crate::colors::ColorSettings;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn layer(feature: &str, name: &str, x: f64, y: f64) -> Layer {
        Layer {
            attribute: Attribute::new(feature, name),
            position: Point::new(x, y),
            anchor_point: Point::ORIGIN,
            depth: 0,
        }
    }

    fn config() -> GlobalConfig {
        let mut config = GlobalConfig::with_size(8);
        config.background_color = "#000000".into();
        config
    }

    #[test]
    fn test_layers_render_in_order_at_positions() {
        let mut store = MemoryStore::new();
        store
            .add("body", "red", RgbaImage::from_pixel(2, 2, RED))
            .add("hat", "white", RgbaImage::from_pixel(1, 1, WHITE));
        let config = config();
        let engine = CompositionEngine::new(&config, &store).unwrap();

        let canvas = engine
            .render(&[layer("body", "red", 3.0, 3.0), layer("hat", "white", 4.0, 4.0)], None)
            .unwrap();
        assert_eq!(canvas.dimensions(), (8, 8));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(3, 3), &RED);
        assert_eq!(canvas.get_pixel(4, 4), &WHITE);
    }

    #[test]
    fn test_missing_asset_is_skipped() {
        let mut store = MemoryStore::new();
        store.add("body", "red", RgbaImage::from_pixel(1, 1, RED));
        let config = config();
        let engine = CompositionEngine::new(&config, &store).unwrap();
        let canvas = engine
            .render(&[layer("hat", "ghost", 0.0, 0.0), layer("body", "red", 1.0, 1.0)], None)
            .unwrap();
        assert_eq!(canvas.get_pixel(1, 1), &RED);
    }

    #[test]
    fn test_shadow_goes_first() {
        let mut store = MemoryStore::new();
        store
            .set_shadow(RgbaImage::from_pixel(2, 2, WHITE))
            .add("body", "red", RgbaImage::from_pixel(1, 1, RED));
        let mut config = config();
        config.shadow_position = Point::new(5.0, 5.0);
        let engine = CompositionEngine::new(&config, &store).unwrap();
        let canvas = engine.render(&[layer("body", "red", 5.0, 5.0)], None).unwrap();
        assert_eq!(canvas.get_pixel(5, 5), &RED);
        assert_eq!(canvas.get_pixel(6, 6), &WHITE);

        config.shadow = false;
        let engine = CompositionEngine::new(&config, &store).unwrap();
        let canvas = engine.render(&[], None).unwrap();
        assert_eq!(canvas.get_pixel(6, 6), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_anchor_and_relative_placement() {
        let store = MemoryStore::new();
        let mut config = config();
        config.assets_scale = 2.0;
        let image = RgbaImage::new(4, 2);

        let engine = CompositionEngine::new(&config, &store).unwrap();
        assert_eq!(engine.placement(Point::new(10.0, 10.0), Point::new(1.0, 2.0), &image), (8, 6));

        config.position_mode = PositionMode::Relative;
        let engine = CompositionEngine::new(&config, &store).unwrap();
        assert_eq!(engine.placement(Point::new(0.5, 0.5), Point::new(0.5, 1.0), &image), (2, 2));
    }

    #[test]
    fn test_color_variant_is_tinted() {
        let signs = ColorSigns {
            primary: Some("@p".into()),
            accent: None,
        };
        let mut store = MemoryStore::new();
        store.add("hat", "cap@p", RgbaImage::from_pixel(1, 1, WHITE));
        let config = config();
        let engine = CompositionEngine::new(&config, &store).unwrap();
        let theme = ColorTheme {
            name: "ruby".into(),
            weight: 1.0,
            primary: ColorSettings::Basic("ff0000".into()),
            accent: ColorSettings::Basic("00ff00".into()),
        };
        let hat = Layer {
            attribute: Attribute::tagged("hat", "cap@p", &signs),
            position: Point::ORIGIN,
            anchor_point: Point::ORIGIN,
            depth: 0,
        };
        assert_eq!(hat.attribute.color, Some(ColorRole::Primary));
        let canvas = engine.render(&[hat], Some(&theme)).unwrap();
        assert_eq!(canvas.get_pixel(0, 0), &RED);
    }
}
