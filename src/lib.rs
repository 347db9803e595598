//! # geomine
//!
//! A Mercator raster tile map engine with a procedural resource-density overlay.
//!
//! The engine maps geographic and pixel coordinates to tiles across zoom
//! levels, resolves tiles through a disk cache backed by an HTTP tile origin,
//! keeps the set of on-screen tile visuals in sync with the camera, and
//! rasterises a noise-driven density overlay for the visible region.
//! Drawing is delegated to a [`TileCanvas`] supplied by the caller.

pub mod core;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod tiles;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::MapConfig,
    geo::{LatLng, MercatorPosition, TileCoord},
    map::{Map, MapFrame},
    mercator::MercatorMap,
    stats::MapStats,
    viewport::ViewportSize,
};

pub use crate::layers::{headless::HeadlessCanvas, overlay::OverlayField, render_set::RenderSet};

pub use crate::tiles::{
    cache::TileCache,
    disk::DiskCache,
    loader::{HttpTileFetcher, TileFetch},
    source::{TileSource, UrlTemplateSource},
    types::{TileContent, TileReady},
};

pub use crate::runtime::WorkerPool;
pub use crate::traits::{NoiseSource, TileCanvas, TileResolver};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Corrupted tile file {}", path.display())]
    CorruptTile { path: std::path::PathBuf },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Error type alias for convenience
pub type Error = MapError;
