//! RGBA8 textures and clamped sampling

use super::types::{Color, SampleMode};

/// Immutable RGBA8 texture, row-major, 4 bytes per pixel
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pixels: Vec<u8>,
}

impl Texture {
    /// Texture filled with a single RGBA value
    pub fn new(width: usize, height: usize, fill: [u8; 4]) -> Self {
        assert!(width > 0 && height > 0, "texture must not be empty");
        Self {
            width,
            height,
            pixels: fill.repeat(width * height),
        }
    }

    /// Wrap an existing RGBA8 buffer
    pub fn from_rgba(width: usize, height: usize, pixels: Vec<u8>) -> Self {
        assert!(width > 0 && height > 0, "texture must not be empty");
        assert_eq!(
            pixels.len(),
            width * height * 4,
            "RGBA buffer length does not match {}x{}",
            width,
            height
        );
        Self { width, height, pixels }
    }

    /// Checkerboard of `cell_w` x `cell_h` pixel squares.
    ///
    /// The top-left cell uses `color2`.
    pub fn checkerboard(
        width: usize,
        height: usize,
        cell_w: usize,
        cell_h: usize,
        color1: [u8; 4],
        color2: [u8; 4],
    ) -> Self {
        let cell_w = cell_w.max(1);
        let cell_h = cell_h.max(1);
        let mut pixels = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                let odd = (x / cell_w + y / cell_h) & 1 == 1;
                pixels.extend_from_slice(if odd { &color1 } else { &color2 });
            }
        }
        Self::from_rgba(width, height, pixels)
    }

    /// RGBA bytes at (x, y). Panics outside the texture.
    pub fn get_pixel(&self, x: usize, y: usize) -> [u8; 4] {
        assert!(
            x < self.width && y < self.height,
            "texel ({}, {}) outside {}x{} texture",
            x,
            y,
            self.width,
            self.height
        );
        let i = (y * self.width + x) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }

    /// RGB of the texel at (x, y); alpha is not consulted
    fn texel(&self, x: usize, y: usize) -> Color {
        let [r, g, b, _] = self.get_pixel(x, y);
        Color::from_rgb8(r, g, b)
    }

    /// Nearest-texel sample. Coordinates are clamped to [0, 1].
    pub fn sample_nearest(&self, u: f32, v: f32) -> Color {
        let x = ((u.clamp(0.0, 1.0) * self.width as f32) as usize).min(self.width - 1);
        let y = ((v.clamp(0.0, 1.0) * self.height as f32) as usize).min(self.height - 1);
        self.texel(x, y)
    }

    /// Bilinear sample over the 4 neighbouring texels.
    ///
    /// Coordinates are clamped to [0, 1]; the last row/column is reused at
    /// the edge rather than wrapping.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> Color {
        let fx = u.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let fy = v.clamp(0.0, 1.0) * (self.height - 1) as f32;
        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let top = self.texel(x0, y0).lerp(self.texel(x1, y0), tx);
        let bottom = self.texel(x0, y1).lerp(self.texel(x1, y1), tx);
        top.lerp(bottom, ty)
    }

    pub fn sample(&self, mode: SampleMode, u: f32, v: f32) -> Color {
        match mode {
            SampleMode::Nearest => self.sample_nearest(u, v),
            SampleMode::Bilinear => self.sample_bilinear(u, v),
        }
    }
}
