//! Minimal-region pixel snapshots for command undo.

use core_raster::{Rect, RasterBuffer};

/// A copy of one clipped region of a layer, with the offset needed to write
/// it back. Commands snapshot only their affected bounding region rather than
/// whole layers; dropping the command frees the pixels.
#[derive(Clone, Debug)]
pub struct RegionSnapshot {
    rect: Rect,
    pixels: RasterBuffer,
}

impl RegionSnapshot {
    /// Capture `rect` of `image`. The rect is clipped to the canvas; `None`
    /// when nothing of it lies on the canvas.
    pub fn capture(image: &RasterBuffer, rect: Rect) -> Option<Self> {
        let rect = rect.clipped(image.width(), image.height())?;
        let pixels = image.copy_region(rect)?;
        Some(Self { rect, pixels })
    }

    /// Capture the whole image.
    pub fn capture_full(image: &RasterBuffer) -> Self {
        Self {
            rect: image.bounds(),
            pixels: image.clone(),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Write the captured pixels back (replace, no blend).
    pub fn restore(&self, image: &mut RasterBuffer) {
        image.write_region(self.rect.x, self.rect.y, &self.pixels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_raster::Color;

    #[test]
    fn capture_restores_bitwise() {
        let mut img = RasterBuffer::new(8, 8);
        img.fill_rect(Rect::new(2, 2, 3, 3), Color::rgba(1, 2, 3, 200));
        let before = img.clone();
        let snap = RegionSnapshot::capture(&img, Rect::new(1, 1, 5, 5)).unwrap();
        img.fill(Color::BLACK);
        snap.restore(&mut img);
        for y in 1..6 {
            for x in 1..6 {
                assert_eq!(img.pixel(x, y), before.pixel(x, y));
            }
        }
    }

    #[test]
    fn capture_clips_and_rejects_offcanvas() {
        let img = RasterBuffer::new(4, 4);
        let snap = RegionSnapshot::capture(&img, Rect::new(-3, -3, 5, 5)).unwrap();
        assert_eq!(snap.rect(), Rect::new(0, 0, 2, 2));
        assert!(RegionSnapshot::capture(&img, Rect::new(9, 9, 2, 2)).is_none());
    }
}
