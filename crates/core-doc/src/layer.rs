//! A single named raster layer.

use crate::DocError;
use core_raster::{Color, Mask, RasterBuffer};
use serde::{Deserialize, Serialize};

/// One layer of a frame: a raster buffer at document dimensions plus display
/// metadata. Names must be non-empty; uniqueness inside a frame is not
/// required.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    name: String,
    pub visible: bool,
    /// Compositing opacity in `[0,1]`; values outside are clamped at render
    /// time.
    pub opacity: f32,
    pub image: RasterBuffer,
}

impl Layer {
    /// Transparent layer of the given size.
    pub fn new(width: u32, height: u32, name: impl Into<String>) -> Result<Self, DocError> {
        Self::from_image(RasterBuffer::new(width, height), name)
    }

    /// Layer of the given size filled with `color`.
    pub fn filled(
        width: u32,
        height: u32,
        name: impl Into<String>,
        color: Color,
    ) -> Result<Self, DocError> {
        Self::from_image(RasterBuffer::filled(width, height, color), name)
    }

    /// Wrap an existing image.
    pub fn from_image(image: RasterBuffer, name: impl Into<String>) -> Result<Self, DocError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DocError::InvalidName);
        }
        Ok(Self {
            name,
            visible: true,
            opacity: 1.0,
            image,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), DocError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DocError::InvalidName);
        }
        self.name = name;
        Ok(())
    }

    /// Fill with transparent, either the whole image or just the pixels the
    /// selection mask covers.
    pub fn clear(&mut self, selection: Option<&Mask>) {
        match selection {
            Some(mask) if !mask.is_empty() => self.image.fill_masked(mask, Color::TRANSPARENT),
            _ => self.image.fill(Color::TRANSPARENT),
        }
    }

    /// Deep copy of image and metadata.
    pub fn duplicate(&self) -> Layer {
        self.clone()
    }

    /// Source-over copy of `other`'s image onto this layer at `(dx, dy)`.
    pub fn blit(&mut self, other: &Layer, dx: i32, dy: i32) {
        self.image.blit(&other.image, dx, dy);
    }

    /// Replace this layer's pixels with `other`'s (no blend). Sizes must
    /// match.
    pub fn paste_source(&mut self, other: &Layer) {
        self.image.paste_source(&other.image);
    }
}
