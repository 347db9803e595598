//! Tile resolution pipeline
//!
//! A request for `(display_x, y, zoom)` is resolved by a tokio task:
//!
//! 1. the entry for the wrapped tile is looked up on disk;
//! 2. absent entries are downloaded, stale ones deleted and downloaded again;
//! 3. the (possibly just written) file is read and decoded on a blocking worker;
//! 4. a corrupted file is deleted and the request restarts as a miss, up to
//!    `max_corruption_retries` times.
//!
//! Every outcome, including failures, is delivered as a [`TileReady`] on a
//! bounded channel drained by the thread that owns the render set. Failures
//! never propagate beyond the request: they become the failed placeholder.

use crossbeam_channel::{bounded, Receiver, Sender};
use fxhash::FxHashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::disk::{DiskCache, EntryState};
use super::loader::TileFetch;
use super::source::TileSource;
use super::types::{TileContent, TileImage, TilePlaceholders, TileReady};
use crate::core::config::TileCacheConfig;
use crate::core::geo::TileCoord;
use crate::runtime::WorkerPool;
use crate::traits::TileResolver;
use crate::{MapError, Result};

/// Display columns waiting on each in-flight real tile
type InFlight = Arc<Mutex<FxHashMap<TileCoord, Vec<i64>>>>;

pub struct TileCache {
    pipeline: Arc<Pipeline>,
    ready_tx: Sender<TileReady>,
    in_flight: Option<InFlight>,
}

struct Pipeline {
    disk: DiskCache,
    source: Arc<dyn TileSource>,
    fetcher: Arc<dyn TileFetch>,
    pool: WorkerPool,
    ttl: Duration,
    max_corruption_retries: u32,
    placeholders: TilePlaceholders,
}

impl TileCache {
    /// Builds the cache and the receiving end of its completion channel.
    pub fn new(
        config: &TileCacheConfig,
        source: Arc<dyn TileSource>,
        fetcher: Arc<dyn TileFetch>,
        pool: WorkerPool,
    ) -> Result<(Self, Receiver<TileReady>)> {
        let disk = DiskCache::open(&config.cache_dir)?;
        let placeholders = TilePlaceholders::from_config(config)?;
        let (ready_tx, ready_rx) = bounded(config.completion_capacity.max(1));

        let pipeline = Pipeline {
            disk,
            source,
            fetcher,
            pool,
            ttl: config.ttl(),
            max_corruption_retries: config.max_corruption_retries,
            placeholders,
        };
        let in_flight = config
            .coalesce_requests
            .then(|| Arc::new(Mutex::new(FxHashMap::default())));

        log::debug!(
            "tile cache at {} (ttl {:?}, coalescing {})",
            pipeline.disk.root().display(),
            pipeline.ttl,
            in_flight.is_some()
        );

        Ok((
            Self {
                pipeline: Arc::new(pipeline),
                ready_tx,
                in_flight,
            },
            ready_rx,
        ))
    }

    /// Starts resolving a tile. Returns immediately; the result arrives on the channel.
    pub fn request(&self, display_x: i64, y: i64, zoom: u8) {
        let real = TileCoord::new(display_x, y, zoom).wrapped();
        if !real.has_valid_row() {
            log::trace!("ignoring request for out of range tile {}", real);
            return;
        }

        if let Some(in_flight) = &self.in_flight {
            match lock(in_flight).entry(real) {
                Entry::Occupied(mut waiters) => {
                    log::trace!("tile {} already in flight, joining as column {}", real, display_x);
                    waiters.get_mut().push(display_x);
                    return;
                }
                Entry::Vacant(slot) => {
                    slot.insert(vec![display_x]);
                }
            }
        }

        let pipeline = Arc::clone(&self.pipeline);
        let ready_tx = self.ready_tx.clone();
        let in_flight = self.in_flight.clone();
        self.pipeline.pool.spawn(async move {
            let content = pipeline.run(real).await;
            let columns = match &in_flight {
                Some(in_flight) => lock(in_flight).remove(&real).unwrap_or_default(),
                None => vec![display_x],
            };
            pipeline.deliver(real, columns, content, ready_tx).await;
        });
    }

    /// Number of distinct tiles currently being resolved (0 without coalescing)
    pub fn in_flight(&self) -> usize {
        self.in_flight.as_ref().map_or(0, |table| lock(table).len())
    }

    pub fn disk(&self) -> &DiskCache {
        &self.pipeline.disk
    }

    pub fn placeholders(&self) -> &TilePlaceholders {
        &self.pipeline.placeholders
    }

    /// Deletes every tile file from the disk cache.
    pub fn clear_disk(&self) -> Result<usize> {
        self.pipeline.disk.clear()
    }
}

impl TileResolver for TileCache {
    fn resolve(&self, display_x: i64, y: i64, zoom: u8) {
        self.request(display_x, y, zoom);
    }
}

impl Pipeline {
    async fn run(&self, coord: TileCoord) -> TileContent {
        match self.resolve(coord).await {
            Ok(image) => TileContent::Loaded(image),
            Err(e) => {
                log::warn!("tile {} failed: {}", coord, e);
                self.placeholders.failed()
            }
        }
    }

    async fn resolve(&self, coord: TileCoord) -> Result<TileImage> {
        let mut corruption_retries = 0;
        loop {
            let disk = self.disk.clone();
            let ttl = self.ttl;
            let state = self
                .pool
                .run_blocking(move || disk.entry_state(coord, ttl))
                .await?;

            match state {
                EntryState::Fresh => {}
                EntryState::Absent => self.download(coord).await?,
                EntryState::Stale => {
                    log::info!("cached tile {} is older than {:?}, refreshing", coord, ttl);
                    self.remove(coord).await?;
                    self.download(coord).await?;
                }
            }

            let disk = self.disk.clone();
            let loaded = self
                .pool
                .run_blocking(move || disk.load(coord).map(|image| Arc::new(image.to_rgba8())))
                .await;

            match loaded {
                Ok(image) => return Ok(image),
                Err(MapError::CorruptTile { path }) => {
                    log::error!("cached tile {} is corrupted, deleting it", path.display());
                    self.remove(coord).await?;
                    if corruption_retries >= self.max_corruption_retries {
                        return Err(MapError::CorruptTile { path });
                    }
                    corruption_retries += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Downloads, decodes and persists a tile. Nothing is written if the body
    /// does not decode.
    async fn download(&self, coord: TileCoord) -> Result<()> {
        let url = self.source.url(coord);
        let bytes = self.fetcher.fetch(&url).await?;
        let disk = self.disk.clone();
        self.pool
            .run_blocking(move || {
                let image = image::load_from_memory(&bytes)?;
                disk.store(coord, &image)?;
                Ok(())
            })
            .await
    }

    async fn remove(&self, coord: TileCoord) -> Result<()> {
        let disk = self.disk.clone();
        self.pool.run_blocking(move || disk.remove(coord)).await
    }

    /// Sends one completion per waiting column. The channel is bounded, so
    /// sending may block and runs on a blocking thread outside the pool's permits.
    async fn deliver(
        &self,
        coord: TileCoord,
        columns: Vec<i64>,
        content: TileContent,
        ready_tx: Sender<TileReady>,
    ) {
        let sent = self.pool.handle().spawn_blocking(move || {
            for display_x in columns {
                let ready = TileReady {
                    display_x,
                    y: coord.y,
                    zoom: coord.z,
                    content: content.clone(),
                };
                if ready_tx.send(ready).is_err() {
                    log::debug!("tile {} finished after its receiver went away", coord);
                    break;
                }
            }
        });
        if let Err(e) = sent.await {
            log::warn!("delivering tile {} failed: {}", coord, e);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
