//! Seams between the map engine and its collaborators
//!
//! The engine never draws anything itself. It talks to a scene graph through
//! [`TileCanvas`], asks for tile pixels through [`TileResolver`] and samples
//! procedural noise through [`NoiseSource`].

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::core::geo::{MercatorPosition, TileCoord};
use crate::tiles::types::TileContent;

/// Scene graph that owns on-screen tile visuals.
pub trait TileCanvas {
    /// Opaque handle to one visual
    type Handle;

    /// Create a visual for `coord` showing `content`. New visuals start hidden.
    fn create_tile(&mut self, coord: TileCoord, content: &TileContent) -> Self::Handle;

    /// Replace the pixels shown by an existing visual.
    fn bind_tile(&mut self, handle: &mut Self::Handle, content: &TileContent);

    /// Move a visual to `offset` (Mercator pixels relative to the camera) and show or hide it.
    fn place_tile(&mut self, handle: &mut Self::Handle, offset: MercatorPosition, visible: bool);

    fn destroy_tile(&mut self, handle: Self::Handle);
}

/// Starts resolving a tile; the result arrives later on the completion channel.
pub trait TileResolver: Send + Sync {
    fn resolve(&self, display_x: i64, y: i64, zoom: u8);
}

/// Deterministic noise primitive, roughly in `[-1, 1]`.
pub trait NoiseSource: Send + Sync {
    fn sample2(&self, x: f64, y: f64) -> f64;

    fn sample3(&self, x: f64, y: f64, z: f64) -> f64;

    fn reseed(&mut self, seed: u32);
}

impl NoiseSource for Fbm<Perlin> {
    fn sample2(&self, x: f64, y: f64) -> f64 {
        self.get([x, y])
    }

    fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        self.get([x, y, z])
    }

    fn reseed(&mut self, seed: u32) {
        let frequency = self.frequency;
        let octaves = self.octaves;
        *self = Fbm::<Perlin>::new(seed)
            .set_frequency(frequency)
            .set_octaves(octaves);
    }
}
