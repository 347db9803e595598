//! In-memory tile canvas
//!
//! Keeps tile visuals as plain images and can flatten the visible ones into a
//! single frame. Used by the driver binary and by tests in place of a real
//! scene graph.

use fxhash::FxHashMap;
use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::overlay::OverlayFrame;
use crate::core::constants::TILE_SIZE;
use crate::core::geo::{MercatorPosition, TileCoord};
use crate::core::viewport::ViewportSize;
use crate::tiles::types::{TileContent, TileImage};
use crate::traits::TileCanvas;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessTileId(u64);

#[derive(Debug, Clone)]
pub struct HeadlessTile {
    pub coord: TileCoord,
    pub image: TileImage,
    pub offset: MercatorPosition,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct HeadlessCanvas {
    tiles: FxHashMap<u64, HeadlessTile>,
    next_id: u64,
    created: u64,
    destroyed: u64,
}

impl HeadlessCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile(&self, id: HeadlessTileId) -> Option<&HeadlessTile> {
        self.tiles.get(&id.0)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn visible_tiles(&self) -> impl Iterator<Item = &HeadlessTile> {
        self.tiles.values().filter(|tile| tile.visible)
    }

    /// (created, destroyed) since the canvas was built
    pub fn churn(&self) -> (u64, u64) {
        (self.created, self.destroyed)
    }

    /// Draws every visible tile, magnified by `tile_scale`, into a frame the
    /// size of the viewport with the camera at its centre.
    pub fn compose(&self, viewport: ViewportSize, tile_scale: i64) -> RgbaImage {
        let tile_scale = tile_scale.max(1);
        let mut frame = RgbaImage::new(viewport.width as u32, viewport.height as u32);
        let (cx, cy) = viewport.half();
        let side = (TILE_SIZE * tile_scale) as u32;

        let mut tiles: Vec<&HeadlessTile> = self.visible_tiles().collect();
        tiles.sort_by_key(|tile| (tile.coord.y, tile.coord.x));
        for tile in tiles {
            let x = cx as i64 + tile.offset.x * tile_scale;
            let y = cy as i64 + tile.offset.y * tile_scale;
            let outside = x >= frame.width() as i64
                || y >= frame.height() as i64
                || x + side as i64 <= 0
                || y + side as i64 <= 0;
            if outside {
                continue;
            }
            if tile_scale == 1 {
                imageops::overlay(&mut frame, &*tile.image, x, y);
            } else {
                let scaled = imageops::resize(&*tile.image, side, side, FilterType::Nearest);
                imageops::overlay(&mut frame, &scaled, x, y);
            }
        }
        frame
    }
}

/// Stretches an overlay raster over a frame composed for the same viewport.
pub fn blend_overlay(frame: &mut RgbaImage, overlay: &OverlayFrame) {
    if overlay.image.width() == 0 || overlay.image.height() == 0 {
        return;
    }
    let width = overlay.image.width() * overlay.noise_scale as u32;
    let height = overlay.image.height() * overlay.noise_scale as u32;
    let scaled = imageops::resize(&overlay.image, width, height, FilterType::Nearest);
    let x = (frame.width() as i64 - width as i64) / 2;
    let y = (frame.height() as i64 - height as i64) / 2;
    imageops::overlay(frame, &scaled, x, y);
}

impl TileCanvas for HeadlessCanvas {
    type Handle = HeadlessTileId;

    fn create_tile(&mut self, coord: TileCoord, content: &TileContent) -> HeadlessTileId {
        let id = self.next_id;
        self.next_id += 1;
        self.created += 1;
        self.tiles.insert(
            id,
            HeadlessTile {
                coord,
                image: content.image().clone(),
                offset: MercatorPosition::default(),
                visible: false,
            },
        );
        HeadlessTileId(id)
    }

    fn bind_tile(&mut self, handle: &mut HeadlessTileId, content: &TileContent) {
        if let Some(tile) = self.tiles.get_mut(&handle.0) {
            tile.image = content.image().clone();
        }
    }

    fn place_tile(&mut self, handle: &mut HeadlessTileId, offset: MercatorPosition, visible: bool) {
        if let Some(tile) = self.tiles.get_mut(&handle.0) {
            tile.offset = offset;
            tile.visible = visible;
        }
    }

    fn destroy_tile(&mut self, handle: HeadlessTileId) {
        if self.tiles.remove(&handle.0).is_some() {
            self.destroyed += 1;
        }
    }
}
