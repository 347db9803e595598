use anyhow::Context;
use geomine::prelude::*;
use std::path::PathBuf;

const VIEWPORT: ViewportSize = ViewportSize {
    width: 1280.0,
    height: 720.0,
};
const TILE_TIMEOUT: Duration = Duration::from_secs(30);
const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Headless map renderer: resolves the tiles around the configured start
/// location and writes the composed frame and the overlay as PNG files.
///
/// Usage: `geomine-app [config.json] [output dir]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => MapConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => MapConfig::default(),
    };
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| ".".to_string()));
    std::fs::create_dir_all(&out_dir)?;

    let tile_scale = config.render.tile_scale;
    let pool = WorkerPool::current(config.tiles.max_blocking_tasks)?;
    let mut map = Map::with_http(config, HeadlessCanvas::new(), pool)?;
    map.set_viewport_size(VIEWPORT);
    map.reseed(&mut rand::thread_rng());

    let frame = map
        .update(Instant::now())
        .context("map produced no initial frame")?;

    let expected = frame.stats.rendered_tiles;
    let deadline = Instant::now() + TILE_TIMEOUT;
    let mut bound = 0;
    while bound < expected && Instant::now() < deadline {
        bound += map.process_ready();
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    if bound < expected {
        log::warn!("only {} of {} tiles arrived before the timeout", bound, expected);
    }

    let mut composite = map.canvas().compose(map.viewport(), tile_scale);
    if let Some(overlay) = &frame.overlay {
        overlay.image.save(out_dir.join("overlay.png"))?;
        blend_overlay(&mut composite, overlay);
    }
    composite.save(out_dir.join("map.png"))?;

    println!("{}", frame.stats);
    println!("Wrote {}", out_dir.join("map.png").display());
    Ok(())
}
