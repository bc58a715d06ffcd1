/// Diffuse texture maps
use std::path::Path;

use nalgebra::Vector2;

use crate::error::{Error, Result};
use crate::framebuffer::Color;

/// Byte order of the first three channels of each stored texel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    /// Blue first, as TGA stores its pixels
    Bgr,
}

/// A 4-byte-per-texel diffuse map sampled with nearest-neighbour lookup.
///
/// Rows are stored bottom-up so that `v = 0` addresses the bottom of the image,
/// matching OBJ texture coordinates.
#[derive(Debug, Clone)]
pub struct Texture {
    width: usize,
    height: usize,
    order: ChannelOrder,
    texels: Vec<[u8; 4]>,
}

impl Texture {
    /// Wrap raw texels. `texels` is row-major, bottom row first.
    pub fn from_raw(
        width: usize,
        height: usize,
        order: ChannelOrder,
        texels: Vec<[u8; 4]>,
    ) -> Self {
        assert_eq!(texels.len(), width * height, "texel count must match dimensions");
        Self {
            width,
            height,
            order,
            texels,
        }
    }

    /// A 1x1 texture of a single color
    pub fn solid(color: Color) -> Self {
        Self::from_raw(1, 1, ChannelOrder::Rgb, vec![[color.r, color.g, color.b, color.a]])
    }

    pub fn from_image(image: &image::DynamicImage) -> Self {
        let mut rgba = image.to_rgba8();
        image::imageops::flip_vertical_in_place(&mut rgba);
        let (width, height) = rgba.dimensions();
        let texels = rgba.pixels().map(|p| p.0).collect();
        Self::from_raw(width as usize, height as usize, ChannelOrder::Rgb, texels)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| match e {
            image::ImageError::IoError(source) => Error::io(path, source),
            other => Error::Image(other),
        })?;
        log::debug!("loaded texture {} ({}x{})", path.display(), image.width(), image.height());
        Ok(Self::from_image(&image))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    /// Sample at `uv`, returning channels in RGB order. Coordinates wrap.
    /// An empty texture samples as white, like a mesh without one.
    pub fn sample(&self, uv: &Vector2<f32>) -> Color {
        if self.texels.is_empty() {
            return Color::WHITE;
        }
        let wrap = |t: f32, size: usize| {
            let t = t - t.floor();
            ((t * size as f32) as usize).min(size - 1)
        };
        let x = wrap(uv.x, self.width);
        let y = wrap(uv.y, self.height);
        let [c0, c1, c2, a] = self.texels[y * self.width + x];
        match self.order {
            ChannelOrder::Rgb => Color::rgba(c0, c1, c2, a),
            ChannelOrder::Bgr => Color::rgba(c2, c1, c0, a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgr_texels_are_reordered() {
        let texture = Texture::from_raw(1, 1, ChannelOrder::Bgr, vec![[10, 20, 30, 255]]);
        assert_eq!(texture.sample(&Vector2::new(0.5, 0.5)), Color::rgb(30, 20, 10));

        let texture = Texture::from_raw(1, 1, ChannelOrder::Rgb, vec![[10, 20, 30, 255]]);
        assert_eq!(texture.sample(&Vector2::new(0.5, 0.5)), Color::rgb(10, 20, 30));
    }

    #[test]
    fn test_empty_texture_samples_white() {
        for (width, height) in [(0, 0), (0, 3), (3, 0)] {
            let texture = Texture::from_raw(width, height, ChannelOrder::Rgb, Vec::new());
            assert_eq!(texture.sample(&Vector2::new(0.5, 0.5)), Color::WHITE);
            assert_eq!(texture.sample(&Vector2::new(-2.0, 7.5)), Color::WHITE);
        }
    }

    #[test]
    fn test_sample_addresses_bottom_row_at_v_zero() {
        let texels = vec![[1, 0, 0, 255], [2, 0, 0, 255], [3, 0, 0, 255], [4, 0, 0, 255]];
        let texture = Texture::from_raw(2, 2, ChannelOrder::Rgb, texels);
        assert_eq!(texture.sample(&Vector2::new(0.1, 0.1)).r, 1);
        assert_eq!(texture.sample(&Vector2::new(0.9, 0.1)).r, 2);
        assert_eq!(texture.sample(&Vector2::new(0.1, 0.9)).r, 3);
        // u = 1.0 wraps to the first column
        assert_eq!(texture.sample(&Vector2::new(1.0, 0.9)).r, 3);
    }

    #[test]
    fn test_from_image_flips_rows() {
        let mut image = image::RgbaImage::new(1, 2);
        image.put_pixel(0, 0, image::Rgba([9, 9, 9, 255]));
        let texture = Texture::from_image(&image::DynamicImage::ImageRgba8(image));
        // Top row of the image is the top of uv space
        assert_eq!(texture.sample(&Vector2::new(0.0, 0.75)), Color::rgb(9, 9, 9));
        assert_eq!(texture.sample(&Vector2::new(0.0, 0.25)), Color::rgba(0, 0, 0, 0));
    }
}
