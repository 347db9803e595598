//! On-disk tile cache
//!
//! One file per tile, named after the tile's cache key. The file modification
//! time is the only staleness signal.

use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use crate::core::constants::TILE_FILE_EXTENSION;
use crate::core::geo::TileCoord;
use crate::{MapError, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// State of one cache entry at the moment it was checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Fresh,
    Stale,
}

#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Opens the cache at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/z{zoom}x{x}y{y}.png`, always for the wrapped column
    pub fn path_for(&self, coord: TileCoord) -> PathBuf {
        self.root
            .join(format!("{}.{}", coord.cache_key(), TILE_FILE_EXTENSION))
    }

    pub fn entry_state(&self, coord: TileCoord, ttl: Duration) -> Result<EntryState> {
        let metadata = match fs::metadata(self.path_for(coord)) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(EntryState::Absent),
            Err(e) => return Err(e.into()),
        };
        // A modification time in the future counts as brand new.
        let age = SystemTime::now()
            .duration_since(metadata.modified()?)
            .unwrap_or(Duration::ZERO);
        Ok(if age <= ttl {
            EntryState::Fresh
        } else {
            EntryState::Stale
        })
    }

    /// Reads and decodes a cached tile. Undecodable files yield [`MapError::CorruptTile`].
    pub fn load(&self, coord: TileCoord) -> Result<DynamicImage> {
        let path = self.path_for(coord);
        let bytes = fs::read(&path)?;
        image::load_from_memory(&bytes).map_err(|e| {
            log::debug!("decode of {} failed: {}", path.display(), e);
            MapError::CorruptTile { path }
        })
    }

    /// Encodes `image` as PNG and replaces the tile's file.
    ///
    /// The file is written under a temporary name and renamed into place, so
    /// readers never observe a partially written tile.
    pub fn store(&self, coord: TileCoord, image: &DynamicImage) -> Result<PathBuf> {
        let path = self.path_for(coord);
        let temp = self.root.join(format!(
            "{}.{}.{}.tmp",
            coord.cache_key(),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        if let Err(e) = image.save_with_format(&temp, ImageFormat::Png) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(path)
    }

    /// Deletes the tile's file. A missing file is not an error.
    pub fn remove(&self, coord: TileCoord) -> Result<()> {
        match fs::remove_file(self.path_for(coord)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Paths of all cached tiles
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(TILE_FILE_EXTENSION)
            {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }

    /// Deletes every cached tile and returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.entries()?;
        let mut removed = 0;
        for path in entries {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        log::info!("cleared {} cached tiles from {}", removed, self.root.display());
        Ok(removed)
    }
}
