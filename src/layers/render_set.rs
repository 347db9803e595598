//! Tile visuals around the camera
//!
//! Every tile that has entered the visible window keeps a slot until it is
//! evicted. Slots of other zoom levels stay alive but hidden, so zooming back
//! shows them immediately.

use fxhash::FxHashMap;
use std::sync::Arc;

use crate::core::config::RenderConfig;
use crate::core::geo::{MercatorPosition, TileCoord};
use crate::core::viewport::ViewportSize;
use crate::tiles::types::{TileContent, TilePlaceholders, TileReady};
use crate::traits::{TileCanvas, TileResolver};

/// One instantiated tile visual and the pixels bound to it
#[derive(Debug)]
pub struct RenderSlot<H> {
    pub handle: H,
    pub content: TileContent,
}

pub struct RenderSet<C: TileCanvas> {
    canvas: C,
    resolver: Arc<dyn TileResolver>,
    placeholders: TilePlaceholders,
    /// Keyed by display coordinate (unwrapped column)
    slots: FxHashMap<TileCoord, RenderSlot<C::Handle>>,
    radius_x: i64,
    radius_y: i64,
    clean_factor: i64,
    max_rendered: usize,
    tile_scale: i64,
    reference: TileCoord,
    position: MercatorPosition,
    zoom: u8,
}

impl<C: TileCanvas> RenderSet<C> {
    pub fn new(
        canvas: C,
        resolver: Arc<dyn TileResolver>,
        placeholders: TilePlaceholders,
        config: &RenderConfig,
    ) -> Self {
        Self {
            canvas,
            resolver,
            placeholders,
            slots: FxHashMap::default(),
            radius_x: 0,
            radius_y: 0,
            clean_factor: config.clean_factor.max(1),
            max_rendered: config.max_rendered.max(1),
            tile_scale: config.tile_scale.max(1),
            reference: TileCoord::new(0, 0, 0),
            position: MercatorPosition::default(),
            zoom: 0,
        }
    }

    /// Recomputes the retention radius for a new viewport size.
    pub fn update_size(&mut self, size: ViewportSize) {
        let (radius_x, radius_y) = size.retention_radius(self.tile_scale);
        self.set_retention_radius(radius_x, radius_y);
    }

    pub fn set_retention_radius(&mut self, radius_x: i64, radius_y: i64) {
        self.radius_x = radius_x.max(0);
        self.radius_y = radius_y.max(0);
    }

    pub fn retention_radius(&self) -> (i64, i64) {
        (self.radius_x, self.radius_y)
    }

    /// Moves the camera: creates and resolves slots for newly visible tiles,
    /// evicts if over capacity, then repositions every retained slot.
    pub fn move_to(&mut self, position: MercatorPosition, zoom: u8) {
        self.position = position;
        self.zoom = zoom;
        self.reference = position.tile(zoom);

        let mut created = 0;
        for dx in -self.radius_x..=self.radius_x {
            for dy in -self.radius_y..=self.radius_y {
                let coord = TileCoord::new(self.reference.x + dx, self.reference.y + dy, zoom);
                if !coord.has_valid_row() || self.slots.contains_key(&coord) {
                    continue;
                }
                let content = self.placeholders.loading();
                let handle = self.canvas.create_tile(coord, &content);
                self.slots.insert(coord, RenderSlot { handle, content });
                self.resolver.resolve(coord.x, coord.y, coord.z);
                created += 1;
            }
        }
        if created > 0 {
            log::debug!("created {} tile slots around {}", created, self.reference);
        }

        if self.slots.len() > self.max_rendered {
            self.cleanup();
        }
        self.update_visibility();
    }

    /// Whether a slot lies outside the retention radius scaled by the clean factor,
    /// or belongs to another zoom level.
    pub fn is_evictable(&self, coord: &TileCoord) -> bool {
        coord.z != self.zoom
            || (coord.x - self.reference.x).abs() > self.radius_x * self.clean_factor
            || (coord.y - self.reference.y).abs() > self.radius_y * self.clean_factor
    }

    /// Destroys evicted slots and returns how many were removed. The disk cache is untouched.
    pub fn cleanup(&mut self) -> usize {
        let evicted: Vec<TileCoord> = self
            .slots
            .keys()
            .filter(|coord| self.is_evictable(coord))
            .copied()
            .collect();

        for coord in &evicted {
            if let Some(slot) = self.slots.remove(coord) {
                self.canvas.destroy_tile(slot.handle);
            }
        }
        log::info!(
            "evicted {} tile slots, {} remain",
            evicted.len(),
            self.slots.len()
        );
        evicted.len()
    }

    fn update_visibility(&mut self) {
        for (coord, slot) in self.slots.iter_mut() {
            let visible = coord.z == self.zoom;
            let offset = coord.position() - self.position;
            self.canvas.place_tile(&mut slot.handle, offset, visible);
        }
    }

    /// Binds a resolved tile to its slot. Results for evicted slots are dropped.
    pub fn on_tile_ready(&mut self, ready: TileReady) -> bool {
        let coord = ready.coord();
        match self.slots.get_mut(&coord) {
            Some(slot) => {
                self.canvas.bind_tile(&mut slot.handle, &ready.content);
                slot.content = ready.content;
                true
            }
            None => {
                log::trace!("dropping tile {} for an evicted slot", coord);
                false
            }
        }
    }

    /// Destroys every slot. Tiles are resolved again on the next move.
    pub fn clear(&mut self) {
        for (_, slot) in self.slots.drain() {
            self.canvas.destroy_tile(slot.handle);
        }
    }

    pub fn render_count(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.slots.contains_key(coord)
    }

    pub fn content(&self, coord: &TileCoord) -> Option<&TileContent> {
        self.slots.get(coord).map(|slot| &slot.content)
    }

    pub fn reference_tile(&self) -> TileCoord {
        self.reference
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }
}
