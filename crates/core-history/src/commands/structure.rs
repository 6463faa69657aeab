//! Structural layer commands: add, remove, duplicate, move, merge, paste.
//!
//! These commands retain the affected [`Layer`] objects across undo/redo so a
//! redo re-inserts the very same pixels at the original index instead of
//! rebuilding them.

use crate::{Applied, Command};
use core_doc::{DocError, Document, Layer};
use core_raster::{Interpolation, RasterBuffer};
use crate::snapshot::RegionSnapshot;

fn select_clamped(doc: &mut Document, frame: usize, index: usize) {
    if let Ok(f) = doc.frames.frame_mut(frame) {
        let i = index.min(f.layers.len() - 1);
        let _ = f.layers.select(i);
    }
}

/// Append a new layer (optionally carrying an image) on top of the stack.
pub struct AddLayer {
    frame: usize,
    name: String,
    image: Option<RasterBuffer>,
    prev_active: usize,
    index: Option<usize>,
    stored: Option<Layer>,
}

impl AddLayer {
    pub fn new(doc: &Document, name: impl Into<String>, image: Option<RasterBuffer>) -> Self {
        Self {
            frame: doc.frames.current_index(),
            name: name.into(),
            image,
            prev_active: doc.layers().active_index(),
            index: None,
            stored: None,
        }
    }
}

impl Command for AddLayer {
    fn label(&self) -> &'static str {
        "add layer"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        if let Some(layer) = self.stored.take() {
            let index = self.index.expect("stored implies executed before");
            doc.frames.frame_mut(self.frame)?.layers.insert(index, layer)?;
            return Ok(Applied::Changed);
        }
        if let Some(img) = &self.image
            && (img.width(), img.height()) != (doc.width(), doc.height())
        {
            return Err(DocError::DimensionMismatch {
                src_w: img.width(),
                src_h: img.height(),
                dst_w: doc.width(),
                dst_h: doc.height(),
            });
        }
        let stack = &mut doc.frames.frame_mut(self.frame)?.layers;
        let index = match self.image.take() {
            Some(img) => stack.add_with_image(self.name.clone(), img)?,
            None => stack.add(self.name.clone())?,
        };
        self.index = Some(index);
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let (Some(index), Ok(frame)) = (self.index, doc.frames.frame_mut(self.frame))
            && let Ok(layer) = frame.layers.remove(index)
        {
            self.stored = Some(layer);
            select_clamped(doc, self.frame, self.prev_active);
        }
    }
}

/// Remove the layer at an index; undo re-inserts the retained object.
pub struct RemoveLayer {
    frame: usize,
    index: usize,
    prev_active: usize,
    removed: Option<Layer>,
}

impl RemoveLayer {
    pub fn new(doc: &Document, index: usize) -> Self {
        Self {
            frame: doc.frames.current_index(),
            index,
            prev_active: doc.layers().active_index(),
            removed: None,
        }
    }
}

impl Command for RemoveLayer {
    fn label(&self) -> &'static str {
        "remove layer"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let layer = doc.frames.frame_mut(self.frame)?.layers.remove(self.index)?;
        self.removed = Some(layer);
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(layer) = self.removed.take()
            && let Ok(frame) = doc.frames.frame_mut(self.frame)
        {
            let _ = frame.layers.insert(self.index, layer);
            select_clamped(doc, self.frame, self.prev_active);
        }
    }
}

/// Clone a layer and insert the copy above it.
pub struct DuplicateLayer {
    frame: usize,
    index: usize,
    prev_active: usize,
    stored: Option<Layer>,
}

impl DuplicateLayer {
    pub fn new(doc: &Document, index: usize) -> Self {
        Self {
            frame: doc.frames.current_index(),
            index,
            prev_active: doc.layers().active_index(),
            stored: None,
        }
    }
}

impl Command for DuplicateLayer {
    fn label(&self) -> &'static str {
        "duplicate layer"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let stack = &mut doc.frames.frame_mut(self.frame)?.layers;
        match self.stored.take() {
            Some(copy) => stack.insert(self.index + 1, copy)?,
            None => {
                stack.duplicate(self.index)?;
            }
        }
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Ok(frame) = doc.frames.frame_mut(self.frame)
            && let Ok(copy) = frame.layers.remove(self.index + 1)
        {
            self.stored = Some(copy);
            select_clamped(doc, self.frame, self.prev_active);
        }
    }
}

/// Reorder a layer within the stack.
pub struct MoveLayer {
    frame: usize,
    from: usize,
    to: usize,
}

impl MoveLayer {
    pub fn new(doc: &Document, from: usize, to: usize) -> Self {
        Self {
            frame: doc.frames.current_index(),
            from,
            to,
        }
    }
}

impl Command for MoveLayer {
    fn label(&self) -> &'static str {
        "move layer"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        if self.from == self.to {
            return Ok(Applied::NoOp);
        }
        doc.frames
            .frame_mut(self.frame)?
            .layers
            .move_layer(self.from, self.to)?;
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Ok(frame) = doc.frames.frame_mut(self.frame) {
            let _ = frame.layers.move_layer(self.to, self.from);
        }
    }
}

/// Composite a layer over the one below it, then drop it. Undo restores the
/// lower layer's pixels and re-inserts the retained top layer.
pub struct MergeDown {
    frame: usize,
    index: usize,
    prev_active: usize,
    top: Option<Layer>,
    below_before: Option<RegionSnapshot>,
}

impl MergeDown {
    pub fn new(doc: &Document, index: usize) -> Self {
        Self {
            frame: doc.frames.current_index(),
            index,
            prev_active: doc.layers().active_index(),
            top: None,
            below_before: None,
        }
    }
}

impl Command for MergeDown {
    fn label(&self) -> &'static str {
        "merge down"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let stack = &mut doc.frames.frame_mut(self.frame)?.layers;
        if self.index == 0 || self.index >= stack.len() {
            return Err(DocError::InvalidIndex {
                index: self.index,
                len: stack.len(),
            });
        }
        if self.below_before.is_none() {
            self.below_before = Some(RegionSnapshot::capture_full(
                &stack.get(self.index - 1)?.image,
            ));
        }
        let top = stack.merge_down(self.index)?;
        self.top = Some(top);
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        let Ok(frame) = doc.frames.frame_mut(self.frame) else {
            return;
        };
        if let Some(snap) = &self.below_before
            && let Ok(below) = frame.layers.get_mut(self.index - 1)
        {
            snap.restore(&mut below.image);
        }
        if let Some(top) = self.top.take() {
            let _ = frame.layers.insert(self.index, top);
        }
        select_clamped(doc, self.frame, self.prev_active);
    }
}

/// Paste an incoming image as a new top layer, scaling it down
/// nearest-neighbor (aspect preserved) when it exceeds the canvas.
pub struct Paste {
    frame: usize,
    image: RasterBuffer,
    prev_active: usize,
    index: Option<usize>,
    stored: Option<Layer>,
}

impl Paste {
    pub fn new(doc: &Document, image: RasterBuffer) -> Self {
        Self {
            frame: doc.frames.current_index(),
            image,
            prev_active: doc.layers().active_index(),
            index: None,
            stored: None,
        }
    }

    /// Incoming image fitted to the canvas: oversized inputs are scaled down
    /// preserving aspect ratio, then placed at the top-left of a canvas-sized
    /// transparent buffer.
    fn fitted(&self, doc_w: u32, doc_h: u32) -> Result<RasterBuffer, DocError> {
        let (sw, sh) = (self.image.width(), self.image.height());
        let scaled;
        let src = if sw > doc_w || sh > doc_h {
            let fx = doc_w as f64 / sw as f64;
            let fy = doc_h as f64 / sh as f64;
            let f = fx.min(fy);
            let nw = (sw as f64 * f).floor() as u32;
            let nh = (sh as f64 * f).floor() as u32;
            if nw == 0 || nh == 0 {
                return Err(DocError::DimensionMismatch {
                    src_w: sw,
                    src_h: sh,
                    dst_w: doc_w,
                    dst_h: doc_h,
                });
            }
            scaled = self.image.scaled(nw, nh, Interpolation::Nearest);
            &scaled
        } else {
            &self.image
        };
        let mut out = RasterBuffer::new(doc_w, doc_h);
        out.write_region(0, 0, src);
        Ok(out)
    }
}

impl Command for Paste {
    fn label(&self) -> &'static str {
        "paste"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        if let Some(layer) = self.stored.take() {
            let index = self.index.expect("stored implies executed before");
            doc.frames.frame_mut(self.frame)?.layers.insert(index, layer)?;
            return Ok(Applied::Changed);
        }
        let fitted = self.fitted(doc.width(), doc.height())?;
        let stack = &mut doc.frames.frame_mut(self.frame)?.layers;
        let index = stack.add_with_image("Pasted Layer", fitted)?;
        self.index = Some(index);
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let (Some(index), Ok(frame)) = (self.index, doc.frames.frame_mut(self.frame))
            && let Ok(layer) = frame.layers.remove(index)
        {
            self.stored = Some(layer);
            select_clamped(doc, self.frame, self.prev_active);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::History;
    use core_raster::Color;

    fn doc() -> Document {
        Document::new(8, 8)
    }

    #[test]
    fn add_layer_undo_redo_keeps_object() {
        let mut d = doc();
        let mut h = History::new();
        let cmd = Box::new(AddLayer::new(&d, "ink", None));
        h.push(&mut d, cmd).unwrap();
        d.active_layer_mut().image.set_pixel(3, 3, Color::BLACK);
        let painted = d.active_layer().image.clone();
        h.undo(&mut d);
        assert_eq!(d.layers().len(), 1);
        assert_eq!(d.layers().active_index(), 0);
        h.redo(&mut d);
        assert_eq!(d.layers().len(), 2);
        // the re-inserted layer carries the pixels painted before undo
        assert_eq!(d.layers().get(1).unwrap().image, painted);
    }

    #[test]
    fn remove_last_layer_fails_and_records_nothing() {
        let mut d = doc();
        let mut h = History::new();
        let cmd = Box::new(RemoveLayer::new(&d, 0));
        let err = h.push(&mut d, cmd).unwrap_err();
        assert_eq!(err, DocError::LastLayer);
        assert_eq!(d.layers().len(), 1);
        assert!(!h.can_undo());
    }

    #[test]
    fn remove_layer_round_trip() {
        let mut d = doc();
        let mut h = History::new();
        let cmd = Box::new(AddLayer::new(&d, "ink", None));
        h.push(&mut d, cmd).unwrap();
        d.active_layer_mut().image.set_pixel(1, 1, Color::BLACK);
        let pixels = d.active_layer().image.clone();
        let cmd = Box::new(RemoveLayer::new(&d, 1));
        h.push(&mut d, cmd).unwrap();
        assert_eq!(d.layers().len(), 1);
        h.undo(&mut d);
        assert_eq!(d.layers().len(), 2);
        assert_eq!(d.layers().get(1).unwrap().image, pixels);
        assert_eq!(d.layers().active_index(), 1);
    }

    #[test]
    fn duplicate_layer_round_trip() {
        let mut d = doc();
        d.active_layer_mut().image.set_pixel(2, 2, Color::BLACK);
        let mut h = History::new();
        let cmd = Box::new(DuplicateLayer::new(&d, 0));
        h.push(&mut d, cmd).unwrap();
        assert_eq!(d.layers().len(), 2);
        assert_eq!(d.layers().get(1).unwrap().name(), "Background copy");
        h.undo(&mut d);
        assert_eq!(d.layers().len(), 1);
        h.redo(&mut d);
        assert_eq!(d.layers().get(1).unwrap().name(), "Background copy");
        assert_eq!(d.layers().get(1).unwrap().image.pixel(2, 2), Some(Color::BLACK));
    }

    #[test]
    fn move_layer_round_trip() {
        let mut d = doc();
        let mut h = History::new();
        let cmd = Box::new(AddLayer::new(&d, "a", None));
        h.push(&mut d, cmd).unwrap();
        let cmd = Box::new(AddLayer::new(&d, "b", None));
        h.push(&mut d, cmd).unwrap();
        let cmd = Box::new(MoveLayer::new(&d, 2, 0));
        h.push(&mut d, cmd).unwrap();
        assert_eq!(d.layers().get(0).unwrap().name(), "b");
        h.undo(&mut d);
        assert_eq!(d.layers().get(2).unwrap().name(), "b");
        assert_eq!(d.layers().get(0).unwrap().name(), "Background");
    }

    #[test]
    fn merge_down_round_trip() {
        let mut d = doc();
        d.active_layer_mut().image.fill(Color::WHITE);
        let mut h = History::new();
        let cmd = Box::new(AddLayer::new(&d, "ink", None));
        h.push(&mut d, cmd).unwrap();
        d.active_layer_mut().image.set_pixel(0, 0, Color::BLACK);
        let below_before = d.layers().get(0).unwrap().image.clone();
        let cmd = Box::new(MergeDown::new(&d, 1));
        h.push(&mut d, cmd).unwrap();
        assert_eq!(d.layers().len(), 1);
        assert_eq!(d.layers().get(0).unwrap().image.pixel(0, 0), Some(Color::BLACK));
        h.undo(&mut d);
        assert_eq!(d.layers().len(), 2);
        assert_eq!(d.layers().get(0).unwrap().image, below_before);
        assert_eq!(d.layers().get(1).unwrap().image.pixel(0, 0), Some(Color::BLACK));
        h.redo(&mut d);
        assert_eq!(d.layers().len(), 1);
    }

    #[test]
    fn paste_scales_oversized_images_down() {
        let mut d = doc();
        let mut big = RasterBuffer::filled(16, 8, Color::BLACK);
        big.set_pixel(0, 0, Color::WHITE);
        let mut h = History::new();
        let cmd = Box::new(Paste::new(&d, big));
        h.push(&mut d, cmd).unwrap();
        assert_eq!(d.layers().len(), 2);
        let img = &d.layers().get(1).unwrap().image;
        assert_eq!((img.width(), img.height()), (8, 8));
        // 16x8 fitted into 8x8 keeping aspect: content occupies 8x4
        assert!(!img.pixel(0, 0).unwrap().is_transparent());
        assert!(!img.pixel(7, 3).unwrap().is_transparent());
        assert!(img.pixel(0, 4).unwrap().is_transparent());
    }

    #[test]
    fn paste_small_image_lands_at_origin() {
        let mut d = doc();
        let small = RasterBuffer::filled(2, 2, Color::BLACK);
        let mut h = History::new();
        let cmd = Box::new(Paste::new(&d, small));
        h.push(&mut d, cmd).unwrap();
        let img = &d.layers().get(1).unwrap().image;
        assert_eq!(img.pixel(1, 1), Some(Color::BLACK));
        assert!(img.pixel(2, 2).unwrap().is_transparent());
        h.undo(&mut d);
        assert_eq!(d.layers().len(), 1);
    }
}
