//! Images.

use crate::color::Color;
use cgmath::Vector2;
use std::sync::Arc;

/// An immutable RGBA8 image (non-premultiplied, row-major, no padding).
///
/// Cloning is cheap; the pixels are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl Image {
    /// Creates an image from raw pixels. Returns `None` if the buffer size does not match.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Image> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Image {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// Creates an image filled with one color.
    pub fn filled(width: u32, height: u32, color: Color) -> Image {
        let [a, r, g, b] = color.to_argb8();
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            pixels.extend_from_slice(&[r, g, b, a]);
        }
        Image {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vector2<f64> {
        Vector2::new(f64::from(self.width), f64::from(self.height))
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the RGBA components of a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Nearest-neighbor scaling.
    pub fn scaled_nearest(&self, width: u32, height: u32) -> Image {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            let sy = if height == 0 {
                0
            } else {
                (u64::from(y) * u64::from(self.height) / u64::from(height)) as u32
            };
            for x in 0..width {
                let sx = (u64::from(x) * u64::from(self.width) / u64::from(width)) as u32;
                pixels.extend_from_slice(&self.pixel(sx, sy).unwrap_or([0; 4]));
            }
        }
        Image {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_buffer_size() {
        assert!(Image::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(Image::from_rgba(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn scales_nearest() {
        let mut pixels = vec![0; 8];
        pixels[4..8].copy_from_slice(&[255, 0, 0, 255]);
        let image = Image::from_rgba(2, 1, pixels).unwrap();
        let scaled = image.scaled_nearest(4, 2);
        assert_eq!(scaled.pixel(3, 1), Some([255, 0, 0, 255]));
        assert_eq!(scaled.pixel(1, 0), Some([0, 0, 0, 0]));
        assert_eq!(Image::filled(1, 1, Color::BLUE).pixel(0, 0), Some([0, 0, 255, 255]));
    }
}
