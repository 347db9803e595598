//! Viewport geometry and the resize debounce timer.

use instant::Instant;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::TILE_SIZE;

/// Size of the on-screen viewport, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Half extents; the map is drawn around the viewport center.
    pub fn half(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Tiles needed on each side of the center tile to cover the viewport
    /// when tiles are drawn magnified by `tile_scale`.
    pub fn retention_radius(&self, tile_scale: i64) -> (i64, i64) {
        let span = (2 * TILE_SIZE * tile_scale.max(1)) as f64;
        (
            (self.width / span).ceil() as i64,
            (self.height / span).ceil() as i64,
        )
    }

    /// Screen pixels covered by one overlay raster pixel.
    pub fn noise_scale(&self, target_size: f64) -> i64 {
        let (cx, cy) = self.half();
        ((cx * cy).sqrt() / target_size.max(1.0)).ceil().max(1.0) as i64
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Fires once, `delay` after the last trigger.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Restarts the timer.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
