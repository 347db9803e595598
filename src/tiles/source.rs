use crate::core::constants::OSM_URL_TEMPLATE;
use crate::core::geo::TileCoord;
use crate::{MapError, Result};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`. Display columns are wrapped first.
    fn url(&self, coord: TileCoord) -> String;
}

/// Tile origin described by a URL with `{z}`, `{x}` and `{y}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplateSource {
    template: String,
}

impl UrlTemplateSource {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(MapError::Config(format!(
                    "tile url template {template:?} lacks {placeholder}"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The public OpenStreetMap raster origin
    pub fn openstreetmap() -> Self {
        Self {
            template: OSM_URL_TEMPLATE.to_string(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl Default for UrlTemplateSource {
    fn default() -> Self {
        Self::openstreetmap()
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        let real = coord.wrapped();
        self.template
            .replace("{z}", &real.z.to_string())
            .replace("{x}", &real.x.to_string())
            .replace("{y}", &real.y.to_string())
    }
}
