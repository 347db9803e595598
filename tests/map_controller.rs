mod common;

use common::{FakeOrigin, ORIGIN_COLOR};
use geomine::core::config::{MapConfig, TileCacheConfig};
use geomine::core::constants::MAX_ZOOM;
use geomine::{HeadlessCanvas, LatLng, Map, MercatorPosition, ViewportSize, WorkerPool};
use instant::Instant;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

struct Fixture {
    map: Map<HeadlessCanvas>,
    origin: Arc<FakeOrigin>,
    _dir: TempDir,
    _runtime: Runtime,
}

fn fixture(tweak: impl FnOnce(&mut MapConfig)) -> Fixture {
    let runtime = Runtime::new().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut config = MapConfig {
        tiles: TileCacheConfig::for_testing(dir.path()),
        ..MapConfig::default()
    };
    config.start.zoom = 3;
    config.overlay.target_size = 64.0;
    tweak(&mut config);

    let origin = Arc::new(FakeOrigin::serving(ORIGIN_COLOR));
    let pool = WorkerPool::new(runtime.handle().clone(), 2);
    let mut map = Map::new(config, HeadlessCanvas::new(), origin.clone(), pool).unwrap();
    // radius ceil(512 / (2 * 256 * 2)) = 1 on both axes: a 3x3 window
    map.set_viewport_size(ViewportSize::new(512.0, 512.0));

    Fixture {
        map,
        origin,
        _dir: dir,
        _runtime: runtime,
    }
}

/// Pumps completions until `count` tiles have been bound.
fn wait_for_tiles(map: &mut Map<HeadlessCanvas>, count: usize) {
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    let mut bound = 0;
    while bound < count {
        assert!(std::time::Instant::now() < deadline, "only {bound} of {count} tiles arrived");
        bound += map.process_ready();
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_first_update_resolves_visible_window() {
    let mut fx = fixture(|_| {});
    let frame = fx.map.update(Instant::now()).expect("first update refreshes");
    assert_eq!(frame.stats.zoom, 3);
    assert_eq!(frame.stats.rendered_tiles, 9);

    wait_for_tiles(&mut fx.map, 9);
    assert_eq!(fx.origin.calls().len(), 9);
    assert_eq!(fx.map.canvas().visible_tiles().count(), 9);

    let composed = fx.map.canvas().compose(fx.map.viewport(), 2);
    assert_eq!(composed.get_pixel(256, 256).0, ORIGIN_COLOR);
}

#[test]
fn test_update_without_changes_does_nothing() {
    let mut fx = fixture(|_| {});
    assert!(fx.map.update(Instant::now()).is_some());
    assert!(fx.map.update(Instant::now()).is_none());
}

#[test]
fn test_degenerate_power_window_skips_overlay() {
    let mut fx = fixture(|config| {
        config.overlay.primary.power_min = 0.5;
        config.overlay.primary.power_max = 0.5;
    });
    let frame = fx.map.update(Instant::now()).unwrap();
    assert!(frame.overlay.is_none());
    assert!(frame.stats.density_here.is_none());
    assert!(frame.stats.coverage.is_none());
    assert_eq!(frame.stats.rendered_tiles, 9);
}

#[test]
fn test_overlay_matches_viewport() {
    let mut fx = fixture(|_| {});
    let frame = fx.map.update(Instant::now()).unwrap();
    let overlay = frame.overlay.expect("overlay enabled by default");

    // half viewport 256x256 -> noise scale ceil(256 / 64) = 4
    assert_eq!(fx.map.noise_scale(), 4);
    assert_eq!(overlay.noise_scale, 4);
    assert_eq!(overlay.image.dimensions(), (128, 128));
    let coverage = frame.stats.coverage.unwrap();
    assert!((0.0..=1.0).contains(&coverage.coverage_min));
    assert!(coverage.coverage_max <= coverage.coverage_min);
}

#[test]
fn test_disabled_overlay() {
    let mut fx = fixture(|config| config.overlay.enabled = false);
    let frame = fx.map.update(Instant::now()).unwrap();
    assert!(frame.overlay.is_none());
    assert!(frame.stats.density_here.is_none());
}

#[test]
fn test_zoom_requests_accumulate_and_clamp() {
    let mut fx = fixture(|_| {});
    fx.map.update(Instant::now());

    fx.map.request_zoom(2);
    fx.map.request_zoom(-1);
    let frame = fx.map.update(Instant::now()).unwrap();
    assert_eq!(frame.stats.zoom, 4);

    fx.map.request_zoom(1_000);
    assert_eq!(fx.map.update(Instant::now()).unwrap().stats.zoom, MAX_ZOOM);

    // already at the top: nothing to refresh
    fx.map.request_zoom(1);
    assert!(fx.map.update(Instant::now()).is_none());
    assert_eq!(fx.map.camera().zoom(), MAX_ZOOM);
}

#[test]
fn test_previous_zoom_tiles_are_hidden() {
    let mut fx = fixture(|_| {});
    fx.map.update(Instant::now());
    fx.map.request_zoom(1);
    let frame = fx.map.update(Instant::now()).unwrap();

    assert_eq!(frame.stats.rendered_tiles, 18);
    assert_eq!(fx.map.canvas().visible_tiles().count(), 9);
    assert!(fx.map.canvas().visible_tiles().all(|tile| tile.coord.z == 4));
}

#[test]
fn test_pan_uses_screen_pixels() {
    let mut fx = fixture(|_| {});
    fx.map.update(Instant::now());
    let start = fx.map.camera().position();

    fx.map.pan(20.0, -10.0);
    let frame = fx.map.update(Instant::now()).unwrap();
    assert_eq!(frame.stats.position, start + MercatorPosition::new(10, -5));

    // less than one Mercator pixel
    fx.map.pan(0.4, 0.0);
    assert!(fx.map.update(Instant::now()).is_none());
    fx.map.pan(1.9, -1.9);
    assert!(fx.map.update(Instant::now()).is_none());
}

#[test]
fn test_pan_truncates_toward_zero() {
    let mut fx = fixture(|_| {});
    fx.map.update(Instant::now());
    let start = fx.map.camera().position();

    fx.map.pan(3.0, -3.0);
    let frame = fx.map.update(Instant::now()).unwrap();
    assert_eq!(frame.stats.position, start + MercatorPosition::new(1, -1));
}

#[test]
fn test_resize_is_debounced() {
    let mut fx = fixture(|_| {});
    let start = Instant::now();
    fx.map.update(start);

    let debounce = fx.map.config().resize_debounce();
    fx.map.resized(ViewportSize::new(3000.0, 3000.0), start);
    fx.map
        .resized(ViewportSize::new(2048.0, 1024.0), start + debounce / 2);

    assert!(fx.map.update(start + debounce).is_none());
    assert_eq!(fx.map.viewport(), ViewportSize::new(512.0, 512.0));

    let frame = fx.map.update(start + debounce * 2).unwrap();
    assert_eq!(fx.map.viewport(), ViewportSize::new(2048.0, 1024.0));
    assert_eq!(fx.map.render_set().retention_radius(), (2, 1));
    // the old 3x3 window lies inside the new 5x3 one
    assert_eq!(frame.stats.rendered_tiles, 15);
}

#[test]
fn test_clear_reresolves_from_disk() {
    let mut fx = fixture(|_| {});
    fx.map.update(Instant::now());
    wait_for_tiles(&mut fx.map, 9);
    let (created, _) = fx.map.canvas().churn();

    fx.map.clear();
    assert_eq!(fx.map.render_set().render_count(), 0);
    assert!(fx.map.canvas().is_empty());

    let frame = fx.map.update(Instant::now()).unwrap();
    assert_eq!(frame.stats.rendered_tiles, 9);
    wait_for_tiles(&mut fx.map, 9);
    assert_eq!(fx.map.canvas().churn(), (created + 9, 9));
    assert_eq!(fx.origin.calls().len(), 9);
}

#[test]
fn test_reseed_is_driven_by_caller_rng() {
    let mut a = fixture(|_| {});
    let mut b = fixture(|_| {});
    a.map.reseed(&mut ChaCha8Rng::seed_from_u64(11));
    b.map.reseed(&mut ChaCha8Rng::seed_from_u64(11));

    let frame_a = a.map.update(Instant::now()).unwrap();
    let frame_b = b.map.update(Instant::now()).unwrap();
    assert_eq!(frame_a.stats.density_here, frame_b.stats.density_here);
    assert_eq!(
        frame_a.overlay.unwrap().image.as_raw(),
        frame_b.overlay.unwrap().image.as_raw()
    );
}

#[test]
fn test_jump_to() {
    let mut fx = fixture(|_| {});
    fx.map.update(Instant::now());
    fx.map.request_zoom(3);
    fx.map.jump_to(LatLng::new(0.0, 0.0), 2);

    let frame = fx.map.update(Instant::now()).unwrap();
    assert_eq!(frame.stats.zoom, 2);
    assert_eq!(frame.stats.position, MercatorPosition::new(512, 512));
    assert!(frame.stats.lat_lng.lat.abs() < 1e-9);
}

#[test]
fn test_clear_disk_cache() {
    let mut fx = fixture(|_| {});
    fx.map.update(Instant::now());
    wait_for_tiles(&mut fx.map, 9);
    assert_eq!(fx.map.clear_disk_cache().unwrap(), 9);
}
