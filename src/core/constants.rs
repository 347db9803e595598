//! Core constants of the map engine.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

use std::time::Duration;

/// Square tile size in pixels.
pub const TILE_SIZE: i64 = 256;

/// Highest supported zoom level (inclusive).
pub const MAX_ZOOM: u8 = 19;

/// Zoom level the map starts at when nothing else is configured.
pub const DEFAULT_ZOOM: u8 = 17;

/// Default starting latitude, in degrees.
pub const DEFAULT_LATITUDE: f64 = 43.70;

/// Default starting longitude, in degrees.
pub const DEFAULT_LONGITUDE: f64 = 7.26;

/// Age after which a cached tile is downloaded again.
pub const TILE_CACHE_TTL: Duration = Duration::from_secs(86_400 * 7);

/// Rendered tile count above which far-away tiles are evicted.
pub const RENDERED_TILES_MAX: usize = 1000;

/// Multiple of the retention radius beyond which tiles are evicted.
pub const CLEAN_DISTANCE_FACTOR: i64 = 2;

/// On-screen magnification applied to raster tiles.
pub const TILE_SCALE: i64 = 2;

/// Approximate overlay raster size (per half viewport axis) the noise scale aims for.
pub const TARGET_SIZE: f64 = 256.0;

pub const EARTH_CIRCUMFERENCE_KM: f64 = 40075.0;

/// Sent with every tile request; public tile servers reject anonymous clients.
pub const USER_AGENT: &str = "geomine/0.1 (+https://github.com/geomine/geomine)";

/// Default raster tile origin.
pub const OSM_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Extension of cached tile files. PNG keeps the cache lossless.
pub const TILE_FILE_EXTENSION: &str = "png";

/// Delay between the last resize notification and the map being rebuilt.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);
