//! Prelude module for common geomine types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use geomine::prelude::*;`

pub use crate::core::{
    config::{
        BandShape, BandedNoiseConfig, MapConfig, NoiseLayerConfig, NoiseProjection,
        OverlayConfig, RenderConfig, StartConfig, TileCacheConfig,
    },
    geo::{LatLng, MercatorPosition, TileCoord},
    map::{Map, MapFrame},
    mercator::MercatorMap,
    stats::MapStats,
    viewport::{Debouncer, ViewportSize},
};

pub use crate::layers::{
    headless::{blend_overlay, HeadlessCanvas},
    overlay::{OverlayField, OverlayFrame, OverlayStats},
    render_set::RenderSet,
};

pub use crate::tiles::{
    cache::TileCache,
    disk::{DiskCache, EntryState},
    loader::{HttpTileFetcher, TileFetch},
    source::{TileSource, UrlTemplateSource},
    types::{TileContent, TileImage, TilePlaceholders, TileReady},
};

pub use crate::runtime::WorkerPool;
pub use crate::traits::{NoiseSource, TileCanvas, TileResolver};

pub use crate::{Error as MapError, Result};

pub use instant::Instant;
pub use std::{sync::Arc, time::Duration};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
