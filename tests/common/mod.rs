#![allow(dead_code)]

use async_trait::async_trait;
use geomine::tiles::TileFetch;
use geomine::{MapError, Result};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

pub const ORIGIN_COLOR: [u8; 4] = [30, 120, 60, 255];

pub enum Body {
    Png(Vec<u8>),
    Garbage,
    Unreachable,
}

/// Tile origin that records every URL it is asked for
pub struct FakeOrigin {
    pub calls: Mutex<Vec<String>>,
    body: Body,
    delay: Duration,
}

impl FakeOrigin {
    pub fn serving(color: [u8; 4]) -> Self {
        Self::with_body(Body::Png(png_bytes(color)))
    }

    pub fn with_body(body: Body) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TileFetch for FakeOrigin {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.body {
            Body::Png(bytes) => Ok(bytes.clone()),
            Body::Garbage => Ok(b"<html>not a tile</html>".to_vec()),
            Body::Unreachable => Err(MapError::HttpStatus {
                status: 503,
                url: url.to_string(),
            }),
        }
    }
}

pub fn tile_image(color: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(256, 256, Rgba(color)))
}

pub fn png_bytes(color: [u8; 4]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    tile_image(color)
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}
