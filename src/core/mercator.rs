//! Camera state over the Mercator world image.

use super::constants::{DEFAULT_ZOOM, MAX_ZOOM};
use super::geo::{max_position, LatLng, MercatorPosition};

/// Current position and zoom level of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MercatorMap {
    zoom: u8,
    position: MercatorPosition,
}

impl MercatorMap {
    /// Creates a map looking at `lat_lng`. The zoom is clamped to `[0, MAX_ZOOM]`.
    pub fn new(lat_lng: LatLng, zoom: u8) -> Self {
        let zoom = zoom.min(MAX_ZOOM);
        Self {
            zoom,
            position: MercatorPosition::from_lat_lng(&lat_lng, zoom).align(zoom),
        }
    }

    pub fn position(&self) -> MercatorPosition {
        self.position
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn lat_lng(&self) -> LatLng {
        self.position.to_lat_lng(self.zoom)
    }

    /// Zooms in by up to `levels`, stopping silently at `MAX_ZOOM`.
    /// Returns the number of levels actually applied.
    pub fn zoom_in(&mut self, levels: u32) -> u32 {
        let mut applied = 0;
        while applied < levels && self.zoom < MAX_ZOOM {
            self.position = self.position.scale(2, 1);
            self.zoom += 1;
            applied += 1;
        }
        applied
    }

    /// Zooms out by up to `levels`, stopping silently at zoom 0.
    /// Each level halves the position with integer division.
    pub fn zoom_out(&mut self, levels: u32) -> u32 {
        let mut applied = 0;
        while applied < levels && self.zoom > 0 {
            self.position = self.position.scale(1, 2);
            self.zoom -= 1;
            applied += 1;
        }
        applied
    }

    /// Applies a signed zoom request: positive zooms in, negative zooms out.
    pub fn zoom_by(&mut self, delta: i32) -> u32 {
        if delta >= 0 {
            self.zoom_in(delta.unsigned_abs())
        } else {
            self.zoom_out(delta.unsigned_abs())
        }
    }

    /// Moves by a relative offset, then re-aligns.
    pub fn move_by(&mut self, offset: MercatorPosition) {
        self.position = (self.position + offset).align(self.zoom);
    }

    /// Jumps to an absolute position at the current zoom.
    pub fn move_to(&mut self, position: MercatorPosition) {
        self.position = position.align(self.zoom);
    }

    /// Jumps to a location and zoom level.
    pub fn jump_to(&mut self, lat_lng: LatLng, zoom: u8) {
        *self = Self::new(lat_lng, zoom);
    }

    /// Exclusive maximum position at the current zoom.
    pub fn max_position(&self) -> i64 {
        max_position(self.zoom)
    }
}

impl Default for MercatorMap {
    fn default() -> Self {
        let max = max_position(DEFAULT_ZOOM);
        Self {
            zoom: DEFAULT_ZOOM,
            position: MercatorPosition::new(max / 2, max / 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_centered() {
        let map = MercatorMap::default();
        assert_eq!(map.zoom(), DEFAULT_ZOOM);
        assert_eq!(map.position().x, map.max_position() / 2);
    }

    #[test]
    fn test_zoom_in_doubles_position() {
        let mut map = MercatorMap::new(LatLng::new(10.0, 20.0), 5);
        let before = map.position();
        assert_eq!(map.zoom_in(1), 1);
        assert_eq!(map.zoom(), 6);
        assert_eq!(map.position(), MercatorPosition::new(before.x * 2, before.y * 2));
    }

    #[test]
    fn test_zoom_out_halves_iteratively() {
        let mut map = MercatorMap::new(LatLng::default(), 3);
        map.move_to(MercatorPosition::new(7, 7));
        map.zoom_out(2);
        // 7 -> 3 -> 1, not 7 / 4 rounded any other way
        assert_eq!(map.position(), MercatorPosition::new(1, 1));
        assert_eq!(map.zoom(), 1);
    }

    #[test]
    fn test_zoom_round_trip_within_tolerance() {
        for levels in 1..=4u32 {
            let mut map = MercatorMap::new(LatLng::new(43.70, 7.26), 10);
            let start = map.position();
            map.zoom_in(levels);
            map.zoom_out(levels);
            assert_eq!(map.position(), start);

            map.zoom_out(levels);
            map.zoom_in(levels);
            let tolerance = 1i64 << levels;
            assert!((map.position().x - start.x).abs() <= tolerance);
            assert!((map.position().y - start.y).abs() <= tolerance);
            assert_eq!(map.zoom(), 10);
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut map = MercatorMap::new(LatLng::default(), 18);
        assert_eq!(map.zoom_in(1_000), 1);
        assert_eq!(map.zoom(), MAX_ZOOM);
        assert_eq!(map.zoom_by(-1_000), 19);
        assert_eq!(map.zoom(), 0);
        assert_eq!(map.zoom_out(1), 0);
        assert_eq!(map.zoom(), 0);

        let clamped = MercatorMap::new(LatLng::default(), 200);
        assert_eq!(clamped.zoom(), MAX_ZOOM);
    }

    #[test]
    fn test_move_wraps_and_clamps() {
        let mut map = MercatorMap::new(LatLng::default(), 0);
        map.move_to(MercatorPosition::new(0, 0));
        map.move_by(MercatorPosition::new(-5, -20));
        assert_eq!(map.position(), MercatorPosition::new(251, 0));
    }
}
