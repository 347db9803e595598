use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Sub};

use super::constants::{MAX_ZOOM, TILE_SIZE};

/// Returns the exclusive maximum Mercator position along either axis.
pub fn max_position(zoom: u8) -> i64 {
    TILE_SIZE << zoom.min(MAX_ZOOM)
}

/// Returns the number of tiles along either axis.
pub fn max_tile_index(zoom: u8) -> i64 {
    1 << zoom.min(MAX_ZOOM)
}

/// Modulo whose result is always in `[0, r)`, also for negative `a`.
pub fn positive_mod(a: i64, r: i64) -> i64 {
    a.rem_euclid(r)
}

/// Represents a geographical coordinate with latitude and longitude, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn from_radians(lat: f64, lng: f64) -> Self {
        Self::new(lat.to_degrees(), lng.to_degrees())
    }

    pub fn lat_radians(&self) -> f64 {
        self.lat.to_radians()
    }

    pub fn lng_radians(&self) -> f64 {
        self.lng.to_radians()
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat > -90.0 && self.lat < 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Absolute pixel position in the zoom-scaled Mercator world image.
/// (0, 0) is the upper-left corner of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MercatorPosition {
    pub x: i64,
    pub y: i64,
}

impl MercatorPosition {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Projects a latitude/longitude given in radians.
    pub fn from_radians(lat: f64, lng: f64, zoom: u8) -> Self {
        let span = max_position(zoom) as f64;
        Self {
            x: ((1.0 + lng / PI) * span / 2.0).round() as i64,
            y: ((1.0 - lat.tan().asinh() / PI) * span / 2.0).round() as i64,
        }
    }

    pub fn from_lat_lng(lat_lng: &LatLng, zoom: u8) -> Self {
        Self::from_radians(lat_lng.lat_radians(), lat_lng.lng_radians(), zoom)
    }

    /// Longitude of this position, in radians.
    pub fn longitude(&self, zoom: u8) -> f64 {
        PI * (2.0 * self.x as f64 / max_position(zoom) as f64 - 1.0)
    }

    /// Latitude of this position, in radians.
    pub fn latitude(&self, zoom: u8) -> f64 {
        (PI * (1.0 - 2.0 * self.y as f64 / max_position(zoom) as f64))
            .sinh()
            .atan()
    }

    pub fn to_lat_lng(&self, zoom: u8) -> LatLng {
        LatLng::from_radians(self.latitude(zoom), self.longitude(zoom))
    }

    /// Bounds the position to the map: loops around the x axis and clamps the y axis.
    pub fn align(&self, zoom: u8) -> Self {
        let max = max_position(zoom);
        Self {
            x: positive_mod(self.x, max),
            y: self.y.clamp(0, max - 1),
        }
    }

    /// Tile containing this position. No wrapping is applied.
    pub fn tile(&self, zoom: u8) -> TileCoord {
        TileCoord::new(self.x.div_euclid(TILE_SIZE), self.y.div_euclid(TILE_SIZE), zoom)
    }

    /// Position inside the containing tile.
    pub fn offset_in_tile(&self) -> MercatorPosition {
        Self::new(self.x.rem_euclid(TILE_SIZE), self.y.rem_euclid(TILE_SIZE))
    }

    pub fn scale(&self, numerator: i64, denominator: i64) -> Self {
        Self::new(self.x * numerator / denominator, self.y * numerator / denominator)
    }
}

impl Add for MercatorPosition {
    type Output = MercatorPosition;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for MercatorPosition {
    type Output = MercatorPosition;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for MercatorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Identifies one raster tile.
///
/// `x` may be a display column outside `[0, tile count)` when the view straddles
/// the antimeridian; [`TileCoord::wrapped`] gives the real column used for disk
/// and network addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i64,
    pub y: i64,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Same tile with its column wrapped into `[0, tile count)`.
    pub fn wrapped(&self) -> Self {
        Self::new(positive_mod(self.x, max_tile_index(self.z)), self.y, self.z)
    }

    /// Whether the row exists at this zoom level. Rows never wrap.
    pub fn has_valid_row(&self) -> bool {
        self.y >= 0 && self.y < max_tile_index(self.z)
    }

    /// Mercator position of the upper-left corner of the tile
    pub fn position(&self) -> MercatorPosition {
        MercatorPosition::new(self.x * TILE_SIZE, self.y * TILE_SIZE)
    }

    /// Cache identifier, `z{zoom}x{x}y{y}`, always built from the wrapped column.
    pub fn cache_key(&self) -> String {
        let real = self.wrapped();
        format!("z{}x{}y{}", real.z, real.x, real.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [(f64, f64); 6] = [
        (43.70, 7.26),
        (40.7128, -74.0060),
        (-33.8688, 151.2093),
        (0.0, 0.0),
        (78.2232, 15.6267),
        (-54.8019, -68.3030),
    ];

    #[test]
    fn test_derived_constants() {
        assert_eq!(max_position(0), 256);
        assert_eq!(max_position(5), 256 * 32);
        assert_eq!(max_tile_index(0), 1);
        assert_eq!(max_tile_index(19), 1 << 19);
    }

    #[test]
    fn test_positive_mod() {
        assert_eq!(positive_mod(-3, 5), 2);
        assert_eq!(positive_mod(-5, 5), 0);
        assert_eq!(positive_mod(7, 5), 2);
    }

    #[test]
    fn test_projection_round_trip_within_one_pixel() {
        for zoom in [0u8, 3, 10, 17, 19] {
            let pixel = 2.0 * PI / max_position(zoom) as f64;
            for (lat, lng) in SAMPLES {
                let lat_lng = LatLng::new(lat, lng);
                let pos = MercatorPosition::from_lat_lng(&lat_lng, zoom);

                let lng_back = pos.longitude(zoom);
                assert!((lng_back - lat_lng.lng_radians()).abs() <= pixel);

                // Latitude is non-linear in y; compare in pixel space.
                let back = MercatorPosition::from_radians(pos.latitude(zoom), lng_back, zoom);
                assert!((back.y - pos.y).abs() <= 1, "zoom {zoom} lat {lat}");
                assert!((back.x - pos.x).abs() <= 1, "zoom {zoom} lng {lng}");
            }
        }
    }

    #[test]
    fn test_equator_and_greenwich_map_to_center() {
        let pos = MercatorPosition::from_radians(0.0, 0.0, 4);
        assert_eq!(pos, MercatorPosition::new(2048, 2048));
    }

    #[test]
    fn test_align_wraps_x() {
        for zoom in [0u8, 5, 19] {
            let span = max_position(zoom);
            assert_eq!(MercatorPosition::new(span + 5, 10).align(zoom).x, 5);
            assert_eq!(MercatorPosition::new(-5, 10).align(zoom).x, span - 5);
            assert_eq!(MercatorPosition::new(span, 10).align(zoom).x, 0);
        }
    }

    #[test]
    fn test_align_clamps_y() {
        for zoom in [0u8, 5, 19] {
            let span = max_position(zoom);
            assert_eq!(MercatorPosition::new(3, -10).align(zoom).y, 0);
            assert_eq!(MercatorPosition::new(3, span + 10).align(zoom).y, span - 1);
        }
    }

    #[test]
    fn test_tile_of_position() {
        let pos = MercatorPosition::new(2 * 256 + 17, 5 * 256 + 255);
        assert_eq!(pos.tile(5), TileCoord::new(2, 5, 5));
        assert_eq!(pos.offset_in_tile(), MercatorPosition::new(17, 255));
        assert_eq!(TileCoord::new(2, 5, 5).position(), MercatorPosition::new(512, 1280));
    }

    #[test]
    fn test_tile_wrapping_and_cache_key() {
        let display = TileCoord::new(-1, 3, 2);
        assert_eq!(display.wrapped(), TileCoord::new(3, 3, 2));
        assert_eq!(display.cache_key(), "z2x3y3");
        assert_eq!(TileCoord::new(10, 20, 5).cache_key(), "z5x10y20");
        assert_eq!(TileCoord::new(36, 20, 5).cache_key(), "z5x4y20");
    }

    #[test]
    fn test_row_bounds() {
        assert!(TileCoord::new(-7, 0, 2).has_valid_row());
        assert!(!TileCoord::new(0, -1, 2).has_valid_row());
        assert!(!TileCoord::new(0, 4, 2).has_valid_row());
    }
}
