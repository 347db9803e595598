//! Procedural resource-density overlay
//!
//! A primary noise field, rescaled through a power window, gives the density
//! at a Mercator position. Optional temperature and polarity fields add an
//! offset shaped by a [`BandShape`]. The field is sampled per overlay pixel
//! over the visible window; nothing is cached.

use image::{Rgba, RgbaImage};
use noise::{Fbm, MultiFractal, Perlin};
use rand::Rng;

use crate::core::config::{BandShape, BandedNoiseConfig, NoiseLayerConfig, NoiseProjection, OverlayConfig};
use crate::core::constants::{DEFAULT_LATITUDE, EARTH_CIRCUMFERENCE_KM};
use crate::core::geo::{max_position, MercatorPosition};
use crate::core::viewport::ViewportSize;
use crate::traits::NoiseSource;

/// Radius of the sphere sampled by [`NoiseProjection::Sphere`]
pub const SPHERE_RADIUS: f64 = 10_000.0;

/// Quantisation steps per projected unit
const QUANTIZATION: f64 = 8.0;

/// One noise field with its power window
pub struct NoiseLayer {
    source: Box<dyn NoiseSource>,
    config: NoiseLayerConfig,
}

impl NoiseLayer {
    pub fn new(config: &NoiseLayerConfig) -> Self {
        let fbm = Fbm::<Perlin>::new(config.seed)
            .set_frequency(config.frequency)
            .set_octaves(config.octaves);
        Self::with_source(config, Box::new(fbm))
    }

    pub fn with_source(config: &NoiseLayerConfig, source: Box<dyn NoiseSource>) -> Self {
        Self {
            source,
            config: config.clone(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.config.has_valid_window()
    }

    pub fn config(&self) -> &NoiseLayerConfig {
        &self.config
    }

    /// Noise at `position`, roughly in `[-1, 1]`
    pub fn raw(&self, position: MercatorPosition, zoom: u8) -> f32 {
        let value = match self.config.projection {
            NoiseProjection::Mercator => {
                let span = max_position(zoom);
                self.source
                    .sample2(quantize(position.x, span), quantize(position.y, span))
            }
            NoiseProjection::Sphere => {
                let lat = position.latitude(zoom);
                let lng = position.longitude(zoom);
                self.source.sample3(
                    SPHERE_RADIUS * lat.cos() * lng.sin(),
                    SPHERE_RADIUS * lat.cos() * lng.cos(),
                    SPHERE_RADIUS * lat.sin(),
                )
            }
        };
        value as f32
    }

    /// Raw noise rescaled from the power window into `[0, 1]`.
    /// Returns `None` without sampling when the window is empty.
    pub fn density(&self, position: MercatorPosition, zoom: u8) -> Option<f32> {
        if !self.is_valid() {
            return None;
        }
        let min = self.config.power_min;
        let max = self.config.power_max;
        let raw = self.raw(position, zoom);
        Some(((raw - min) / (max - min)).clamp(0.0, 1.0))
    }

    pub fn reseed(&mut self, seed: u32) {
        self.config.seed = seed;
        self.source.reseed(seed);
    }
}

/// Fixed-precision projected coordinate: distance from the map centre in tens
/// of metres at the default latitude, floored to 1/8 steps.
pub fn quantize(value: i64, span: i64) -> f64 {
    let scale = EARTH_CIRCUMFERENCE_KM * 100.0 * DEFAULT_LATITUDE.to_radians().cos();
    (scale * (value as f64 / span as f64 - 0.5) * QUANTIZATION).floor() / QUANTIZATION
}

/// Five-segment piecewise-linear shaping of a density into an offset
pub fn band_offset(shape: &BandShape, value: f32) -> f32 {
    if value <= shape.low_end {
        shape.low_value
    } else if value < shape.mid_start {
        let t = (value - shape.low_end) / (shape.mid_start - shape.low_end);
        lerp(shape.low_value, shape.mid_value, t)
    } else if value <= shape.mid_end {
        shape.mid_value
    } else if value < shape.high_start {
        let t = (value - shape.mid_end) / (shape.high_start - shape.mid_end);
        lerp(shape.mid_value, shape.high_value, t)
    } else {
        shape.high_value
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Auxiliary field contributing a shaped offset
pub struct BandedLayer {
    pub layer: NoiseLayer,
    pub shape: BandShape,
}

impl BandedLayer {
    pub fn new(config: &BandedNoiseConfig) -> Self {
        Self {
            layer: NoiseLayer::new(&config.noise),
            shape: config.shape,
        }
    }

    pub fn offset(&self, position: MercatorPosition, zoom: u8) -> f32 {
        self.layer
            .density(position, zoom)
            .map_or(0.0, |density| band_offset(&self.shape, density))
    }
}

/// Coverage figures of one overlay raster, as fractions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayStats {
    /// Share of the raster with any density
    pub coverage_min: f64,
    /// Share of the raster at full density
    pub coverage_max: f64,
    /// Mean density over covered pixels
    pub average: f64,
}

#[derive(Debug, Clone)]
pub struct OverlayFrame {
    pub image: RgbaImage,
    pub stats: OverlayStats,
    /// Screen pixels per overlay pixel
    pub noise_scale: i64,
}

pub struct OverlayField {
    primary: NoiseLayer,
    temperature: Option<BandedLayer>,
    polarity: Option<BandedLayer>,
    opacity: f32,
}

impl OverlayField {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            primary: NoiseLayer::new(&config.primary),
            temperature: config.temperature.as_ref().map(BandedLayer::new),
            polarity: config.polarity.as_ref().map(BandedLayer::new),
            opacity: config.opacity.clamp(0.0, 1.0),
        }
    }

    pub fn with_layers(
        primary: NoiseLayer,
        temperature: Option<BandedLayer>,
        polarity: Option<BandedLayer>,
        opacity: f32,
    ) -> Self {
        Self {
            primary,
            temperature,
            polarity,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.primary.is_valid()
    }

    /// Density in `[0, 1]` at `position`, or `None` if the primary window is empty.
    pub fn sample_density(&self, position: MercatorPosition, zoom: u8) -> Option<f32> {
        let base = self.primary.density(position, zoom)?;
        let offset: f32 = [&self.temperature, &self.polarity]
            .into_iter()
            .flatten()
            .map(|banded| banded.offset(position, zoom))
            .sum();
        Some((base + offset).clamp(0.0, 1.0))
    }

    /// Rasterises the field around `center`. Each overlay pixel covers
    /// `noise_scale` screen pixels; screen pixels map to Mercator pixels
    /// through `tile_scale`.
    pub fn render(
        &self,
        center: MercatorPosition,
        zoom: u8,
        viewport: ViewportSize,
        noise_scale: i64,
        tile_scale: i64,
    ) -> Option<OverlayFrame> {
        if !self.is_valid() {
            log::debug!("overlay power window is empty, skipping overlay");
            return None;
        }
        let noise_scale = noise_scale.max(1);
        let tile_scale = tile_scale.max(1);
        let (cx, cy) = viewport.half();
        let max_x = (cx / noise_scale as f64).ceil() as i64;
        let max_y = (cy / noise_scale as f64).ceil() as i64;
        let span = max_position(zoom);

        let mut image = RgbaImage::new((2 * max_x) as u32, (2 * max_y) as u32);
        let mut covered = 0u64;
        let mut saturated = 0u64;
        let mut sum = 0.0f64;

        for y in -max_y..max_y {
            for x in -max_x..max_x {
                let raw = center + MercatorPosition::new(x, y).scale(noise_scale, tile_scale);
                if raw.y < 0 || raw.y >= span {
                    continue;
                }
                let Some(density) = self.sample_density(raw.align(zoom), zoom) else {
                    continue;
                };
                if density > 0.0 {
                    covered += 1;
                    sum += density as f64;
                    image.put_pixel(
                        (x + max_x) as u32,
                        (y + max_y) as u32,
                        density_color(density, self.opacity),
                    );
                }
                if density >= 1.0 {
                    saturated += 1;
                }
            }
        }

        let area = (4 * max_x * max_y).max(1) as f64;
        let stats = OverlayStats {
            coverage_min: covered as f64 / area,
            coverage_max: saturated as f64 / area,
            average: if covered > 0 { sum / covered as f64 } else { 0.0 },
        };
        Some(OverlayFrame {
            image,
            stats,
            noise_scale,
        })
    }

    /// Draws a new seed for every field from `rng`.
    pub fn reseed<R: Rng>(&mut self, rng: &mut R) {
        self.primary.reseed(rng.gen());
        for banded in [&mut self.temperature, &mut self.polarity].into_iter().flatten() {
            banded.layer.reseed(rng.gen());
        }
        log::info!("overlay reseeded, primary seed {}", self.primary.config().seed);
    }
}

/// Blue for low densities through green to red for full density
pub fn density_color(density: f32, opacity: f32) -> Rgba<u8> {
    let hue = (1.0 - density.clamp(0.0, 1.0)) * 2.0 / 3.0;
    let [r, g, b] = hsv_to_rgb(hue, 1.0, 1.0);
    Rgba([r, g, b, (opacity.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// `h`, `s` and `v` in `[0, 1]`
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = (h.rem_euclid(1.0)) * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    ]
}
