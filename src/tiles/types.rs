use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;

use crate::core::config::TileCacheConfig;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::TileCoord;
use crate::Result;

/// Decoded tile pixels, shared between the pipeline and the canvas
pub type TileImage = Arc<RgbaImage>;

/// What a tile visual currently shows
#[derive(Debug, Clone)]
pub enum TileContent {
    /// Placeholder shown while the tile is resolved
    Loading(TileImage),
    Loaded(TileImage),
    /// Placeholder shown after the tile could not be resolved
    Failed(TileImage),
}

impl TileContent {
    pub fn image(&self) -> &TileImage {
        match self {
            TileContent::Loading(image) | TileContent::Loaded(image) | TileContent::Failed(image) => {
                image
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, TileContent::Loaded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TileContent::Failed(_))
    }
}

/// Images shown in place of tiles that are loading or failed
#[derive(Debug, Clone)]
pub struct TilePlaceholders {
    pub loading: TileImage,
    pub failed: TileImage,
}

impl TilePlaceholders {
    pub fn from_config(config: &TileCacheConfig) -> Result<Self> {
        Ok(Self {
            loading: placeholder(config.loading_image.as_deref(), config.loading_color)?,
            failed: placeholder(config.failed_image.as_deref(), config.failed_color)?,
        })
    }

    pub fn loading(&self) -> TileContent {
        TileContent::Loading(Arc::clone(&self.loading))
    }

    pub fn failed(&self) -> TileContent {
        TileContent::Failed(Arc::clone(&self.failed))
    }
}

impl Default for TilePlaceholders {
    fn default() -> Self {
        let config = TileCacheConfig::default();
        Self {
            loading: solid(config.loading_color),
            failed: solid(config.failed_color),
        }
    }
}

fn placeholder(path: Option<&Path>, color: [u8; 4]) -> Result<TileImage> {
    match path {
        Some(path) => Ok(Arc::new(image::open(path)?.to_rgba8())),
        None => Ok(solid(color)),
    }
}

fn solid(color: [u8; 4]) -> TileImage {
    Arc::new(RgbaImage::from_pixel(
        TILE_SIZE as u32,
        TILE_SIZE as u32,
        Rgba(color),
    ))
}

/// Completion message for one resolve request, keyed by the display column
#[derive(Debug, Clone)]
pub struct TileReady {
    pub display_x: i64,
    pub y: i64,
    pub zoom: u8,
    pub content: TileContent,
}

impl TileReady {
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.display_x, self.y, self.zoom)
    }
}
