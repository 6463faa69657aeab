//! Owned W×H RGBA pixel array.

use crate::color::{self, Color};
use crate::geom::{Point, Rect};
use crate::mask::Mask;
use serde::{Deserialize, Serialize};

/// Scaling filter for [`RasterBuffer::scaled`]. `Nearest` preserves hard pixel
/// edges and is the required mode for pixel-art fidelity; `Smooth` is a
/// bilinear filter offered for reference imagery (e.g. AI output).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    Nearest,
    Smooth,
}

/// A row-major RGBA8 image. Dimensions are fixed for the buffer's lifetime;
/// operations that change size return a new buffer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    /// `width * height * 4` bytes, rows top to bottom, `r g b a` per pixel.
    pixels: Vec<u8>,
}

impl std::fmt::Debug for RasterBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RasterBuffer {
    /// Fully transparent buffer. `width` and `height` must be nonzero.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        assert!(width > 0 && height > 0, "raster dimensions must be nonzero");
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        if color != Color::TRANSPARENT {
            for px in pixels.chunks_exact_mut(4) {
                px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap raw RGBA bytes. Returns `None` when the byte count does not match
    /// the dimensions.
    pub fn from_rgba_bytes(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    pub fn as_rgba_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_rgba_bytes(self) -> Vec<u8> {
        self.pixels
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let o = self.offset(x as u32, y as u32);
        Some(Color::rgba(
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ))
    }

    /// Replace the pixel (no blend). Out-of-bounds writes are dropped.
    pub fn set_pixel(&mut self, x: i32, y: i32, c: Color) {
        if !self.in_bounds(x, y) {
            return;
        }
        let o = self.offset(x as u32, y as u32);
        self.pixels[o..o + 4].copy_from_slice(&[c.r, c.g, c.b, c.a]);
    }

    /// Source-over blend onto the pixel. Out-of-bounds writes are dropped.
    pub fn blend_pixel(&mut self, x: i32, y: i32, c: Color) {
        if let Some(dst) = self.pixel(x, y) {
            self.set_pixel(x, y, color::source_over(dst, c));
        }
    }

    pub fn fill(&mut self, c: Color) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    /// Replace every pixel inside `rect` (clipped) with `c`.
    pub fn fill_rect(&mut self, rect: Rect, c: Color) {
        let Some(r) = rect.clipped(self.width, self.height) else {
            return;
        };
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                self.set_pixel(x, y, c);
            }
        }
    }

    /// Replace every pixel the mask covers with `c`. Mask dimensions must
    /// match the buffer.
    pub fn fill_masked(&mut self, mask: &Mask, c: Color) {
        debug_assert_eq!((mask.width(), mask.height()), (self.width, self.height));
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if mask.get(x, y) {
                    self.set_pixel(x, y, c);
                }
            }
        }
    }

    /// Source-over blit of `src` with its top-left at `(dx, dy)`.
    pub fn blit(&mut self, src: &RasterBuffer, dx: i32, dy: i32) {
        self.blit_with_opacity(src, dx, dy, 1.0);
    }

    /// Source-over blit with the source alpha scaled by `opacity`.
    pub fn blit_with_opacity(&mut self, src: &RasterBuffer, dx: i32, dy: i32, opacity: f32) {
        for sy in 0..src.height as i32 {
            for sx in 0..src.width as i32 {
                let Some(c) = src.pixel(sx, sy) else { continue };
                if c.is_transparent() {
                    continue;
                }
                let c = if opacity >= 1.0 { c } else { c.with_opacity(opacity) };
                self.blend_pixel(sx + dx, sy + dy, c);
            }
        }
    }

    /// Replace this buffer's pixels with `src`'s (no blend). Dimensions must
    /// match.
    pub fn paste_source(&mut self, src: &RasterBuffer) {
        debug_assert_eq!((src.width, src.height), (self.width, self.height));
        self.pixels.copy_from_slice(&src.pixels);
    }

    /// Copy of the clipped `rect` region as a new buffer. Returns `None` when
    /// the rect misses the canvas entirely.
    pub fn copy_region(&self, rect: Rect) -> Option<RasterBuffer> {
        let r = rect.clipped(self.width, self.height)?;
        let mut out = RasterBuffer::new(r.w, r.h);
        for y in 0..r.h as i32 {
            for x in 0..r.w as i32 {
                if let Some(c) = self.pixel(r.x + x, r.y + y) {
                    out.set_pixel(x, y, c);
                }
            }
        }
        Some(out)
    }

    /// Write `src` back with its top-left at `(dx, dy)`, replacing pixels
    /// (no blend). The restore half of [`copy_region`](Self::copy_region).
    pub fn write_region(&mut self, dx: i32, dy: i32, src: &RasterBuffer) {
        for y in 0..src.height as i32 {
            for x in 0..src.width as i32 {
                if let Some(c) = src.pixel(x, y) {
                    self.set_pixel(dx + x, dy + y, c);
                }
            }
        }
    }

    pub fn flip_horizontal(&mut self) {
        let w = self.width as usize;
        for row in self.pixels.chunks_exact_mut(w * 4) {
            for x in 0..w / 2 {
                let (a, b) = (x * 4, (w - 1 - x) * 4);
                for i in 0..4 {
                    row.swap(a + i, b + i);
                }
            }
        }
    }

    pub fn flip_vertical(&mut self) {
        let stride = self.width as usize * 4;
        let h = self.height as usize;
        for y in 0..h / 2 {
            let (top, rest) = self.pixels.split_at_mut((h - 1 - y) * stride);
            top[y * stride..y * stride + stride].swap_with_slice(&mut rest[..stride]);
        }
    }

    /// Resampled copy at `new_w` by `new_h`.
    pub fn scaled(&self, new_w: u32, new_h: u32, filter: Interpolation) -> RasterBuffer {
        assert!(new_w > 0 && new_h > 0, "raster dimensions must be nonzero");
        match filter {
            Interpolation::Nearest => self.scaled_nearest(new_w, new_h),
            Interpolation::Smooth => self.scaled_bilinear(new_w, new_h),
        }
    }

    fn scaled_nearest(&self, new_w: u32, new_h: u32) -> RasterBuffer {
        let mut out = RasterBuffer::new(new_w, new_h);
        for y in 0..new_h {
            let sy = (y as u64 * self.height as u64 / new_h as u64) as i32;
            for x in 0..new_w {
                let sx = (x as u64 * self.width as u64 / new_w as u64) as i32;
                if let Some(c) = self.pixel(sx, sy) {
                    out.set_pixel(x as i32, y as i32, c);
                }
            }
        }
        out
    }

    fn scaled_bilinear(&self, new_w: u32, new_h: u32) -> RasterBuffer {
        let mut out = RasterBuffer::new(new_w, new_h);
        let fx = self.width as f64 / new_w as f64;
        let fy = self.height as f64 / new_h as f64;
        for y in 0..new_h {
            let sy = ((y as f64 + 0.5) * fy - 0.5).max(0.0);
            let y0 = sy.floor() as i32;
            let y1 = (y0 + 1).min(self.height as i32 - 1);
            let ty = sy - y0 as f64;
            for x in 0..new_w {
                let sx = ((x as f64 + 0.5) * fx - 0.5).max(0.0);
                let x0 = sx.floor() as i32;
                let x1 = (x0 + 1).min(self.width as i32 - 1);
                let tx = sx - x0 as f64;
                let sample = |px: i32, py: i32| self.pixel(px, py).unwrap_or(Color::TRANSPARENT);
                let lerp = |a: u8, b: u8, t: f64| (a as f64 * (1.0 - t) + b as f64 * t);
                let mix = |c00: u8, c10: u8, c01: u8, c11: u8| {
                    let top = lerp(c00, c10, tx);
                    let bot = lerp(c01, c11, tx);
                    (top * (1.0 - ty) + bot * ty).round() as u8
                };
                let (c00, c10, c01, c11) =
                    (sample(x0, y0), sample(x1, y0), sample(x0, y1), sample(x1, y1));
                out.set_pixel(
                    x as i32,
                    y as i32,
                    Color::rgba(
                        mix(c00.r, c10.r, c01.r, c11.r),
                        mix(c00.g, c10.g, c01.g, c11.g),
                        mix(c00.b, c10.b, c01.b, c11.b),
                        mix(c00.a, c10.a, c01.a, c11.a),
                    ),
                );
            }
        }
        out
    }

    /// Integer upscale by `factor` with nearest-neighbor sampling (export
    /// "pixel size").
    pub fn upscaled(&self, factor: u32) -> RasterBuffer {
        assert!(factor > 0, "scale factor must be nonzero");
        self.scaled_nearest(self.width * factor, self.height * factor)
    }

    /// Iterate all pixels row-major.
    pub fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.pixels
            .chunks_exact(4)
            .map(|p| Color::rgba(p[0], p[1], p[2], p[3]))
    }
}
