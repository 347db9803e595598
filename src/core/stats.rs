use std::fmt;

use super::geo::{LatLng, MercatorPosition, TileCoord};
use crate::layers::overlay::OverlayStats;

/// Status readout recomputed after every map refresh
#[derive(Debug, Clone, PartialEq)]
pub struct MapStats {
    pub zoom: u8,
    pub position: MercatorPosition,
    pub tile: TileCoord,
    /// Position inside `tile`
    pub in_tile: MercatorPosition,
    pub lat_lng: LatLng,
    /// Density at the camera, `None` when the overlay is disabled or invalid
    pub density_here: Option<f32>,
    pub coverage: Option<OverlayStats>,
    pub rendered_tiles: usize,
}

impl fmt::Display for MapStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Zoom: {}", self.zoom)?;
        writeln!(f, "Position: {}", self.position)?;
        writeln!(
            f,
            "Tile: {} @ ({}, {})",
            self.tile, self.in_tile.x, self.in_tile.y
        )?;
        writeln!(f, "Lat: {:.6} Lon: {:.6}", self.lat_lng.lat, self.lat_lng.lng)?;
        match self.density_here {
            Some(density) => writeln!(f, "Noise here: {:.1}%", density * 100.0)?,
            None => writeln!(f, "Noise here: -")?,
        }
        if let Some(coverage) = &self.coverage {
            writeln!(
                f,
                "Coverage: {:.1}% (max {:.1}%), average {:.1}%",
                coverage.coverage_min * 100.0,
                coverage.coverage_max * 100.0,
                coverage.average * 100.0
            )?;
        }
        write!(f, "Rendered tiles: {}", self.rendered_tiles)
    }
}
