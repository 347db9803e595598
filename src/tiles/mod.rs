pub mod cache;
pub mod disk;
pub mod loader;
pub mod source;
pub mod types;

// Re-exports for convenience
pub use cache::TileCache;
pub use disk::{DiskCache, EntryState};
pub use loader::{HttpTileFetcher, TileFetch};
pub use source::{TileSource, UrlTemplateSource};
pub use types::{TileContent, TileImage, TilePlaceholders, TileReady};
