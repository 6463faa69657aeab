//! Pixel storage primitives shared by the whole document core.
//!
//! Everything above this crate (rasterizer, selection, layers, compositor)
//! speaks in terms of the four types defined here:
//!
//! * [`Color`] — an 8-bit sRGB RGBA quadruple with straight (non-premultiplied)
//!   alpha and the scalar source-over reference blend.
//! * [`Point`] / [`Rect`] — integer document coordinates. Rects are pixel
//!   rects: `from_points` includes both corner pixels, mirroring how drawing
//!   tools treat a drag from one pixel to another.
//! * [`RasterBuffer`] — an owned W×H row-major pixel array. Dimensions are
//!   fixed at construction; every resize produces a new buffer.
//! * [`Mask`] — a 1-bit per pixel region used for selection clipping. The mask
//!   is the single source of truth for "inside the selection".
//!
//! Core invariants (must hold after every public call):
//! * `RasterBuffer` and `Mask` dimensions never change in place.
//! * All coordinate-taking methods clip: out-of-bounds reads return `None`,
//!   out-of-bounds writes are dropped. Callers never need their own guards.
//! * `Mask` bits beyond `width * height` stay zero so whole-byte algebra
//!   (`union`, `intersect`, `any`) needs no per-bit masking.

pub mod buffer;
pub mod color;
pub mod geom;
pub mod mask;

pub use buffer::{Interpolation, RasterBuffer};
pub use color::Color;
pub use geom::{Point, Rect};
pub use mask::Mask;
