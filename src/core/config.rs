//! Configuration for the map engine
//!
//! Every section deserialises from JSON with defaults for missing fields, so a
//! config file only needs to name the values it changes. Configuration is
//! immutable once a [`Map`](crate::core::map::Map) is built from it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::constants::{
    CLEAN_DISTANCE_FACTOR, DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_ZOOM, MAX_ZOOM,
    OSM_URL_TEMPLATE, RENDERED_TILES_MAX, RESIZE_DEBOUNCE, TARGET_SIZE, TILE_CACHE_TTL,
    TILE_SCALE,
};
use super::geo::LatLng;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub tiles: TileCacheConfig,
    pub render: RenderConfig,
    pub overlay: OverlayConfig,
    pub start: StartConfig,
    pub resize_debounce_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tiles: TileCacheConfig::default(),
            render: RenderConfig::default(),
            overlay: OverlayConfig::default(),
            start: StartConfig::default(),
            resize_debounce_ms: RESIZE_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl MapConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Replaces out-of-range values with the closest usable ones.
    /// Bad values are never fatal; they are logged and corrected.
    pub fn sanitized(mut self) -> Self {
        if self.start.zoom > MAX_ZOOM {
            log::warn!("start zoom {} above {}, clamping", self.start.zoom, MAX_ZOOM);
            self.start.zoom = MAX_ZOOM;
        }
        if self.render.tile_scale < 1 {
            log::warn!("tile scale {} is not positive, using 1", self.render.tile_scale);
            self.render.tile_scale = 1;
        }
        if self.render.clean_factor < 1 {
            log::warn!("clean factor {} is not positive, using 1", self.render.clean_factor);
            self.render.clean_factor = 1;
        }
        self.render.max_rendered = self.render.max_rendered.max(1);
        self.tiles.max_blocking_tasks = self.tiles.max_blocking_tasks.max(1);
        self.tiles.completion_capacity = self.tiles.completion_capacity.max(1);
        self.overlay.opacity = self.overlay.opacity.clamp(0.0, 1.0);
        self
    }
}

/// Tile fetch pipeline and disk cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileCacheConfig {
    /// Directory holding one file per cached tile; created if absent
    pub cache_dir: PathBuf,
    /// Cached tiles older than this are downloaded again
    pub ttl_secs: u64,
    /// Tile origin, with `{z}`, `{x}` and `{y}` placeholders
    pub url_template: String,
    /// Concurrent disk reads/decodes/writes
    pub max_blocking_tasks: usize,
    /// Capacity of the channel delivering finished tiles
    pub completion_capacity: usize,
    /// Re-downloads allowed after finding a corrupted cache file
    pub max_corruption_retries: u32,
    /// Share one in-flight fetch between identical tile requests
    pub coalesce_requests: bool,
    pub loading_color: [u8; 4],
    pub failed_color: [u8; 4],
    pub loading_image: Option<PathBuf>,
    pub failed_image: Option<PathBuf>,
}

impl Default for TileCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("tile_cache"),
            ttl_secs: TILE_CACHE_TTL.as_secs(),
            url_template: OSM_URL_TEMPLATE.to_string(),
            max_blocking_tasks: 8,
            completion_capacity: 256,
            max_corruption_retries: 1,
            coalesce_requests: true,
            loading_color: [200, 200, 200, 255],
            failed_color: [160, 40, 40, 255],
            loading_image: None,
            failed_image: None,
        }
    }
}

impl TileCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn for_testing(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            url_template: "http://tiles.test/{z}/{x}/{y}.png".to_string(),
            max_blocking_tasks: 2,
            completion_capacity: 16,
            ..Default::default()
        }
    }
}

/// Rendered tile set tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub tile_scale: i64,
    pub clean_factor: i64,
    pub max_rendered: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tile_scale: TILE_SCALE,
            clean_factor: CLEAN_DISTANCE_FACTOR,
            max_rendered: RENDERED_TILES_MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    /// Degrees
    pub latitude: f64,
    /// Degrees
    pub longitude: f64,
    pub zoom: u8,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl StartConfig {
    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// How a Mercator position is turned into noise coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseProjection {
    /// Quantised 2D coordinates proportional to the Mercator position
    #[default]
    Mercator,
    /// 3D coordinates on a sphere at the position's latitude/longitude
    Sphere,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseLayerConfig {
    pub seed: u32,
    pub frequency: f64,
    pub octaves: usize,
    pub projection: NoiseProjection,
    /// Raw noise at or below this maps to density 0
    pub power_min: f32,
    /// Raw noise at or above this maps to density 1
    pub power_max: f32,
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            frequency: 0.01,
            octaves: 5,
            projection: NoiseProjection::Mercator,
            power_min: 0.0,
            power_max: 1.0,
        }
    }
}

impl NoiseLayerConfig {
    /// A window with `power_min >= power_max` cannot be rescaled.
    pub fn has_valid_window(&self) -> bool {
        self.power_min < self.power_max
    }
}

/// Five-segment piecewise-linear offset: flat low, ramp, flat mid, ramp, flat high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandShape {
    pub low_value: f32,
    pub low_end: f32,
    pub mid_start: f32,
    pub mid_value: f32,
    pub mid_end: f32,
    pub high_start: f32,
    pub high_value: f32,
}

impl Default for BandShape {
    fn default() -> Self {
        Self {
            low_value: 0.0,
            low_end: 0.2,
            mid_start: 0.4,
            mid_value: 0.0,
            mid_end: 0.6,
            high_start: 0.8,
            high_value: 0.0,
        }
    }
}

/// Auxiliary noise field whose density is shaped into an offset
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BandedNoiseConfig {
    pub noise: NoiseLayerConfig,
    pub shape: BandShape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub target_size: f64,
    pub opacity: f32,
    pub primary: NoiseLayerConfig,
    pub temperature: Option<BandedNoiseConfig>,
    pub polarity: Option<BandedNoiseConfig>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_size: TARGET_SIZE,
            opacity: 0.5,
            primary: NoiseLayerConfig {
                power_min: 0.25,
                power_max: 0.75,
                ..Default::default()
            },
            temperature: None,
            polarity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapConfig::default();
        assert_eq!(config.tiles.ttl(), TILE_CACHE_TTL);
        assert_eq!(config.render.max_rendered, 1000);
        assert_eq!(config.render.clean_factor, 2);
        assert_eq!(config.start.zoom, DEFAULT_ZOOM);
        assert!(config.tiles.coalesce_requests);
        assert!(config.overlay.primary.has_valid_window());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MapConfig::from_json_str(
            r#"{
                "tiles": { "cache_dir": "/tmp/tiles", "ttl_secs": 60 },
                "overlay": {
                    "primary": { "seed": 42, "power_min": 0.1, "power_max": 0.9 },
                    "temperature": { "shape": { "low_value": -0.5 } }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.tiles.cache_dir, PathBuf::from("/tmp/tiles"));
        assert_eq!(config.tiles.ttl(), Duration::from_secs(60));
        assert_eq!(config.tiles.url_template, OSM_URL_TEMPLATE);
        assert_eq!(config.overlay.primary.seed, 42);
        assert_eq!(config.overlay.primary.octaves, 5);

        let temperature = config.overlay.temperature.unwrap();
        assert_eq!(temperature.shape.low_value, -0.5);
        assert_eq!(temperature.shape.high_start, 0.8);
        assert!(config.overlay.polarity.is_none());
    }

    #[test]
    fn test_sanitize_clamps_bad_values() {
        let config = MapConfig::from_json_str(
            r#"{ "start": { "zoom": 40 }, "render": { "tile_scale": 0, "clean_factor": -3 } }"#,
        )
        .unwrap();
        assert_eq!(config.start.zoom, MAX_ZOOM);
        assert_eq!(config.render.tile_scale, 1);
        assert_eq!(config.render.clean_factor, 1);
    }

    #[test]
    fn test_projection_names() {
        let config: NoiseLayerConfig = serde_json::from_str(r#"{ "projection": "sphere" }"#).unwrap();
        assert_eq!(config.projection, NoiseProjection::Sphere);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(MapConfig::from_json_str("{ not json").is_err());
    }
}
