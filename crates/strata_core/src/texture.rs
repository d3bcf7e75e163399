//! Texture storage for material color lookups.
//!
//! Textures keep their pixels in the encoding they were authored in
//! (usually sRGB). Filtering happens in that native space; the shading code
//! converts the filtered result to linear before use.

use image::RgbaImage;
use strata_math::Vec3;
use thiserror::Error;

/// Errors that can occur while building a texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Texture has zero size ({width}x{height})")]
    Empty { width: u32, height: u32 },

    #[error("Expected {expected} pixels for texture, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A texture with pixel data in its native encoding.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data in RGBA format (native encoding, 0-1 range)
    /// Stored as [R, G, B, A] per pixel, row-major order
    pixels: Vec<[f32; 4]>,
}

impl Texture {
    /// Create a new texture from pixel data, validating its dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> TextureResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(TextureError::PixelCountMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z, 1.0]],
        }
    }

    /// Wrap an already decoded 8-bit image. Values are kept in the image's
    /// own encoding.
    pub fn from_rgba8(img: &RgbaImage) -> TextureResult<Self> {
        let (width, height) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self::new(width, height, pixels)
    }

    /// Fetch the pixel at integer coordinates, wrapping out-of-range values.
    pub fn get_pixel(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.pixels[y * self.width as usize + x]
    }

    /// Bilinearly filtered color at pixel-space coordinates.
    ///
    /// Coordinates wrap, so `x == width` samples the first column again.
    pub fn sample_filtered(&self, x: f32, y: f32) -> Vec3 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let p00 = self.get_pixel(x0, y0);
        let p10 = self.get_pixel(x0 + 1, y0);
        let p01 = self.get_pixel(x0, y0 + 1);
        let p11 = self.get_pixel(x0 + 1, y0 + 1);

        let lerp = |a: [f32; 4], b: [f32; 4], t: f32| {
            Vec3::new(
                a[0] * (1.0 - t) + b[0] * t,
                a[1] * (1.0 - t) + b[1] * t,
                a[2] * (1.0 - t) + b[2] * t,
            )
        };

        let top = lerp(p00, p10, fx);
        let bottom = lerp(p01, p11, fx);
        top * (1.0 - fy) + bottom * fy
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}
