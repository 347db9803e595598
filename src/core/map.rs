//! Primary-thread map controller
//!
//! [`Map`] owns the camera, the rendered tile set, the tile cache and the
//! overlay. Collaborators feed it commands (zoom, pan, resize, clear, reseed)
//! and call [`Map::update`] once per frame; every refresh yields a
//! [`MapFrame`] with the overlay image and the status readout.

use crossbeam_channel::Receiver;
use instant::Instant;
use rand::Rng;
use std::sync::Arc;

use super::config::MapConfig;
use super::geo::{LatLng, MercatorPosition};
use super::mercator::MercatorMap;
use super::stats::MapStats;
use super::viewport::{Debouncer, ViewportSize};
use crate::layers::overlay::{OverlayField, OverlayFrame};
use crate::layers::render_set::RenderSet;
use crate::runtime::WorkerPool;
use crate::tiles::cache::TileCache;
use crate::tiles::loader::{HttpTileFetcher, TileFetch};
use crate::tiles::source::UrlTemplateSource;
use crate::tiles::types::TileReady;
use crate::traits::TileCanvas;
use crate::Result;

/// Output of one map refresh
#[derive(Debug, Clone)]
pub struct MapFrame {
    /// `None` when the overlay is disabled or its power window is empty
    pub overlay: Option<OverlayFrame>,
    pub stats: MapStats,
}

pub struct Map<C: TileCanvas> {
    config: MapConfig,
    camera: MercatorMap,
    render_set: RenderSet<C>,
    tiles: Arc<TileCache>,
    ready_rx: Receiver<TileReady>,
    overlay: OverlayField,
    viewport: ViewportSize,
    noise_scale: i64,
    resize: Debouncer,
    pending_size: Option<ViewportSize>,
    pending_zoom: i32,
    needs_refresh: bool,
}

impl<C: TileCanvas> Map<C> {
    /// Builds a map from `config`. Tiles are fetched through `fetcher`, and
    /// pipeline work runs on `pool`.
    pub fn new(
        config: MapConfig,
        canvas: C,
        fetcher: Arc<dyn TileFetch>,
        pool: WorkerPool,
    ) -> Result<Self> {
        let config = config.sanitized();
        let source = Arc::new(UrlTemplateSource::new(config.tiles.url_template.clone())?);
        let (tiles, ready_rx) = TileCache::new(&config.tiles, source, fetcher, pool)?;
        let tiles = Arc::new(tiles);

        let mut render_set = RenderSet::new(
            canvas,
            tiles.clone(),
            tiles.placeholders().clone(),
            &config.render,
        );
        let viewport = ViewportSize::default();
        render_set.update_size(viewport);

        let camera = MercatorMap::new(config.start.lat_lng(), config.start.zoom);
        log::info!(
            "map starts at {:.4}, {:.4} (zoom {})",
            config.start.latitude,
            config.start.longitude,
            camera.zoom()
        );

        Ok(Self {
            overlay: OverlayField::new(&config.overlay),
            noise_scale: viewport.noise_scale(config.overlay.target_size),
            resize: Debouncer::new(config.resize_debounce()),
            config,
            camera,
            render_set,
            tiles,
            ready_rx,
            viewport,
            pending_size: None,
            pending_zoom: 0,
            needs_refresh: true,
        })
    }

    /// Builds a map that downloads tiles over HTTP.
    pub fn with_http(config: MapConfig, canvas: C, pool: WorkerPool) -> Result<Self> {
        Self::new(config, canvas, Arc::new(HttpTileFetcher::new()), pool)
    }

    /// Queues a zoom change; deltas accumulate until the next update.
    pub fn request_zoom(&mut self, delta: i32) {
        self.pending_zoom = self.pending_zoom.saturating_add(delta);
    }

    /// Moves the camera by a screen-space offset. Fractions of a Mercator
    /// pixel are truncated toward zero.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let scale = self.config.render.tile_scale as f64;
        let offset = MercatorPosition::new((dx / scale).trunc() as i64, (dy / scale).trunc() as i64);
        if offset != MercatorPosition::default() {
            self.camera.move_by(offset);
            self.needs_refresh = true;
        }
    }

    pub fn jump_to(&mut self, lat_lng: LatLng, zoom: u8) {
        self.camera.jump_to(lat_lng, zoom);
        self.pending_zoom = 0;
        self.needs_refresh = true;
    }

    /// Records a viewport resize. It takes effect once resizing has settled
    /// for the configured debounce delay.
    pub fn resized(&mut self, size: ViewportSize, now: Instant) {
        self.pending_size = Some(size);
        self.resize.trigger(now);
    }

    /// Applies a viewport size immediately.
    pub fn set_viewport_size(&mut self, size: ViewportSize) {
        self.resize.cancel();
        self.pending_size = None;
        self.apply_size(size);
    }

    fn apply_size(&mut self, size: ViewportSize) {
        self.viewport = size;
        self.render_set.update_size(size);
        self.noise_scale = size.noise_scale(self.config.overlay.target_size);
        log::debug!(
            "viewport {}x{}, retention radius {:?}, noise scale {}",
            size.width,
            size.height,
            self.render_set.retention_radius(),
            self.noise_scale
        );
        self.needs_refresh = true;
    }

    /// Drops every tile visual; tiles are resolved again on the next refresh.
    /// The disk cache is kept.
    pub fn clear(&mut self) {
        self.render_set.clear();
        self.needs_refresh = true;
    }

    /// Deletes every cached tile file.
    pub fn clear_disk_cache(&self) -> Result<usize> {
        self.tiles.clear_disk()
    }

    pub fn reseed<R: Rng>(&mut self, rng: &mut R) {
        self.overlay.reseed(rng);
        self.needs_refresh = true;
    }

    /// Binds every tile delivered since the last call. Never blocks.
    pub fn process_ready(&mut self) -> usize {
        let mut bound = 0;
        for ready in self.ready_rx.try_iter() {
            if self.render_set.on_tile_ready(ready) {
                bound += 1;
            }
        }
        bound
    }

    /// Per-frame entry point: binds finished tiles, applies settled resizes
    /// and pending zoom, and refreshes the map if anything changed.
    pub fn update(&mut self, now: Instant) -> Option<MapFrame> {
        self.process_ready();

        if self.resize.poll(now) {
            if let Some(size) = self.pending_size.take() {
                self.apply_size(size);
            }
        }

        if self.pending_zoom != 0 {
            let delta = std::mem::take(&mut self.pending_zoom);
            if self.camera.zoom_by(delta) > 0 {
                self.needs_refresh = true;
            }
        }

        if !self.needs_refresh {
            return None;
        }
        self.needs_refresh = false;
        Some(self.make_map())
    }

    /// Moves the render set to the camera and rebuilds the overlay and statistics.
    pub fn make_map(&mut self) -> MapFrame {
        let position = self.camera.position();
        let zoom = self.camera.zoom();
        self.render_set.move_to(position, zoom);

        let overlay = if self.config.overlay.enabled {
            self.overlay.render(
                position,
                zoom,
                self.viewport,
                self.noise_scale,
                self.config.render.tile_scale,
            )
        } else {
            None
        };

        let density_here = if self.config.overlay.enabled {
            self.overlay.sample_density(position, zoom)
        } else {
            None
        };

        let stats = MapStats {
            zoom,
            position,
            tile: position.tile(zoom),
            in_tile: position.offset_in_tile(),
            lat_lng: self.camera.lat_lng(),
            density_here,
            coverage: overlay.as_ref().map(|frame| frame.stats),
            rendered_tiles: self.render_set.render_count(),
        };
        MapFrame { overlay, stats }
    }

    pub fn camera(&self) -> &MercatorMap {
        &self.camera
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn noise_scale(&self) -> i64 {
        self.noise_scale
    }

    pub fn render_set(&self) -> &RenderSet<C> {
        &self.render_set
    }

    pub fn tiles(&self) -> &TileCache {
        &self.tiles
    }

    pub fn canvas(&self) -> &C {
        self.render_set.canvas()
    }
}
