//! Frame data structures for images handed to the vision providers

use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An immutable RGBA raster
///
/// Clones share the same pixel buffer, so a frame can be captured by an
/// in-flight analysis while the session moves on to another image.
#[derive(Clone)]
pub struct Frame {
    pixels: Arc<RgbaImage>,
    /// When the frame was acquired
    pub acquired_at: Instant,
}

impl Frame {
    /// Wrap an already decoded RGBA image
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
            acquired_at: Instant::now(),
        }
    }

    /// Build a frame from raw RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let pixels = RgbaImage::from_raw(width, height, data)
            .with_context(|| format!("RGBA buffer does not match {}x{}", width, height))?;
        Ok(Self::new(pixels))
    }

    /// Convert any decoded image into a frame
    pub fn from_image(image: DynamicImage) -> Self {
        Self::new(image.to_rgba8())
    }

    /// Fully transparent frame of the given size
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbaImage::new(width, height))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Time since the frame was acquired
    pub fn age(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Borrow the pixel buffer
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Whether both frames share the same pixel buffer
    pub fn same_as(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
