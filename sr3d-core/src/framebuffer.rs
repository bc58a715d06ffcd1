/// Color and depth buffers that triangles are rasterized into
use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};

/// An 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale the color channels by `intensity`, leaving alpha untouched.
    /// Channels truncate towards zero.
    pub fn scaled(self, intensity: f32) -> Self {
        let scale = |c: u8| (c as f32 * intensity).clamp(0.0, 255.0) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }

    /// Composite `self` over `dst` using `self.a` as coverage
    pub fn over(self, dst: Color) -> Self {
        if self.a == 255 {
            return self;
        }
        let alpha = self.a as f32 / 255.0;
        let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
        Self {
            r: mix(self.r, dst.r),
            g: mix(self.g, dst.g),
            b: mix(self.b, dst.b),
            a: dst.a.max(self.a),
        }
    }

    /// Perceived brightness in [0, 1] (Rec. 601 weights)
    pub fn luminance(&self) -> f32 {
        (0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32) / 255.0
    }
}

/// Color grid plus a parallel depth grid.
///
/// Pixel (0, 0) is the bottom-left corner while rasterizing; call
/// [`Framebuffer::flip_vertically`] before saving to get the usual top-left origin.
/// Depth values are "distance" keys: smaller is nearer, and the buffer starts at +inf.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    color: Vec<Color>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            color: vec![Color::BLACK; size],
            depth: vec![f32::INFINITY; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.color.fill(Color::BLACK);
        self.depth.fill(f32::INFINITY);
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        self.index(x, y).map(|idx| self.color[idx])
    }

    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        self.index(x, y).map(|idx| self.depth[idx])
    }

    /// Write a pixel, ignoring coordinates outside the buffer
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if let Some(idx) = self.index(x, y) {
            self.color[idx] = color;
        }
    }

    /// Composite `color` over the stored pixel. Opaque colors replace it.
    pub fn blend_pixel(&mut self, x: usize, y: usize, color: Color) {
        if let Some(idx) = self.index(x, y) {
            self.color[idx] = color.over(self.color[idx]);
        }
    }

    /// True when `z` is strictly nearer than the stored depth. Does not write.
    pub fn is_nearer(&self, x: usize, y: usize, z: f32) -> bool {
        self.index(x, y).map_or(false, |idx| z < self.depth[idx])
    }

    /// Compare-and-write: stores `z` and returns true when it is strictly nearer.
    /// Equal depths are rejected so the first fragment drawn at a depth wins.
    pub fn depth_test(&mut self, x: usize, y: usize, z: f32) -> bool {
        match self.index(x, y) {
            Some(idx) if z < self.depth[idx] => {
                self.depth[idx] = z;
                true
            }
            _ => false,
        }
    }

    /// Number of pixels that received a fragment
    pub fn covered_pixels(&self) -> usize {
        self.depth.iter().filter(|d| d.is_finite()).count()
    }

    /// Reverse the row order of both buffers
    pub fn flip_vertically(&mut self) {
        let width = self.width;
        for y in 0..self.height / 2 {
            let mirror = self.height - 1 - y;
            for x in 0..width {
                self.color.swap(y * width + x, mirror * width + x);
                self.depth.swap(y * width + x, mirror * width + x);
            }
        }
    }

    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let c = self.color[y as usize * self.width + x as usize];
            Rgba([c.r, c.g, c.b, c.a])
        })
    }

    /// Save the color buffer; the format follows the file extension
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let image = image::DynamicImage::ImageRgba8(self.to_image()).into_rgb8();
        image.save(path).map_err(|e| match e {
            image::ImageError::IoError(source) => Error::io(path, source),
            other => Error::Image(other),
        })?;
        log::info!("wrote {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}
