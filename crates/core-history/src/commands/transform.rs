//! Whole-document transforms, content moves, selection edits, and scripted
//! layer edits.

use crate::commands::layer_mut;
use crate::{Applied, Command};
use core_doc::{DocError, Document, DocumentState, FlipAxis};
use core_raster::{Interpolation, Point, Rect, RasterBuffer};
use core_selection::Selection;

/// Resize every layer of every frame. Undo restores the captured frame
/// manager wholesale, so downscales reverse exactly.
pub struct ResizeDocument {
    new_w: u32,
    new_h: u32,
    filter: Interpolation,
    before: Option<DocumentState>,
}

impl ResizeDocument {
    pub fn new(new_w: u32, new_h: u32, filter: Interpolation) -> Self {
        Self {
            new_w,
            new_h,
            filter,
            before: None,
        }
    }
}

impl Command for ResizeDocument {
    fn label(&self) -> &'static str {
        "resize document"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        if (self.new_w, self.new_h) == (doc.width(), doc.height()) {
            return Ok(Applied::NoOp);
        }
        if self.before.is_none() {
            self.before = Some(doc.capture_state());
        }
        doc.resize(self.new_w, self.new_h, self.filter);
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(state) = self.before.clone() {
            doc.restore_state(state);
        }
    }
}

/// Crop the document to a rectangle.
pub struct CropDocument {
    rect: Rect,
    before: Option<DocumentState>,
}

impl CropDocument {
    pub fn new(rect: Rect) -> Self {
        Self { rect, before: None }
    }
}

impl Command for CropDocument {
    fn label(&self) -> &'static str {
        "crop document"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let captured = self.before.clone().unwrap_or_else(|| doc.capture_state());
        doc.crop(self.rect)?;
        self.before = Some(captured);
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Some(state) = self.before.clone() {
            doc.restore_state(state);
        }
    }
}

/// Mirror every layer of every frame. Flipping is its own inverse, so undo
/// simply flips again; no pixels are captured.
pub struct FlipDocument {
    axis: FlipAxis,
}

impl FlipDocument {
    pub fn new(axis: FlipAxis) -> Self {
        Self { axis }
    }
}

impl Command for FlipDocument {
    fn label(&self) -> &'static str {
        "flip document"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        doc.flip(self.axis);
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        doc.flip(self.axis);
    }
}

/// Commit of a move-tool drag: the selected pixels (or the whole layer) cut
/// out and re-blitted at an offset.
///
/// The tool supplies three canvas-sized buffers captured at press time:
/// `original` (the untouched layer), `base` (the layer with the moved pixels
/// cleared), and `floating` (just the moved pixels). Execute rebuilds
/// deterministically from those captures; the live layer is never consulted.
pub struct MoveContent {
    frame: usize,
    layer: usize,
    original: RasterBuffer,
    base: RasterBuffer,
    floating: RasterBuffer,
    delta: Point,
    selection_before: Option<Selection>,
    selection_after: Option<Selection>,
}

impl MoveContent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frame: usize,
        layer: usize,
        original: RasterBuffer,
        base: RasterBuffer,
        floating: RasterBuffer,
        delta: Point,
        selection_before: Option<Selection>,
    ) -> Self {
        let selection_after = selection_before
            .as_ref()
            .map(|s| s.translated(delta.x, delta.y));
        Self {
            frame,
            layer,
            original,
            base,
            floating,
            delta,
            selection_before,
            selection_after,
        }
    }
}

impl Command for MoveContent {
    fn label(&self) -> &'static str {
        "move"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        if self.delta == Point::new(0, 0) {
            return Ok(Applied::NoOp);
        }
        {
            let image = &mut layer_mut(doc, self.frame, self.layer)?.image;
            image.paste_source(&self.base);
            image.blit(&self.floating, self.delta.x, self.delta.y);
        }
        doc.set_selection(self.selection_after.clone());
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let Ok(layer) = layer_mut(doc, self.frame, self.layer) {
            layer.image.paste_source(&self.original);
        }
        doc.set_selection(self.selection_before.clone());
    }
}

/// Replace the selection, remembering the previous one for undo.
pub struct SelectionEdit {
    before: Option<Selection>,
    after: Option<Selection>,
}

impl SelectionEdit {
    pub fn new(doc: &Document, after: Option<Selection>) -> Self {
        Self {
            before: doc.selection().cloned(),
            after,
        }
    }

    /// Build with an explicit prior selection, for tools that previewed the
    /// new selection on the document before committing the edit.
    pub fn from_parts(before: Option<Selection>, after: Option<Selection>) -> Self {
        Self { before, after }
    }
}

impl Command for SelectionEdit {
    fn label(&self) -> &'static str {
        "edit selection"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let before_empty = self.before.as_ref().is_none_or(|s| s.is_empty());
        let after_empty = self.after.as_ref().is_none_or(|s| s.is_empty());
        if before_empty && after_empty {
            return Ok(Applied::NoOp);
        }
        doc.set_selection(self.after.clone());
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        doc.set_selection(self.before.clone());
    }
}

type EditFn = Box<dyn FnMut(&mut RasterBuffer)>;

/// A scripted in-place edit of one layer's image. The closure runs once; redo
/// replays the captured after-image so scripts with side effects or
/// randomness stay deterministic in history.
pub struct LayerEdit {
    frame: usize,
    layer: usize,
    edit: Option<EditFn>,
    before: Option<RasterBuffer>,
    after: Option<RasterBuffer>,
}

impl LayerEdit {
    pub fn new(doc: &Document, layer: usize, edit: impl FnMut(&mut RasterBuffer) + 'static) -> Self {
        Self {
            frame: doc.frames.current_index(),
            layer,
            edit: Some(Box::new(edit)),
            before: None,
            after: None,
        }
    }
}

impl Command for LayerEdit {
    fn label(&self) -> &'static str {
        "script edit"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let image = &mut layer_mut(doc, self.frame, self.layer)?.image;
        if let Some(after) = &self.after {
            image.paste_source(after);
            return Ok(Applied::Changed);
        }
        let mut edit = self.edit.take().expect("first execute has the closure");
        self.before = Some(image.clone());
        edit(image);
        self.after = Some(image.clone());
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let (Some(before), Ok(layer)) = (&self.before, layer_mut(doc, self.frame, self.layer)) {
            layer.image.paste_source(before);
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
    fn resize_undo_restores_exactly() {
        let mut d = doc();
        d.active_layer_mut().image.set_pixel(5, 5, Color::BLACK);
        let before = d.active_layer().image.clone();
        let mut h = History::new();
        h.push(&mut d, Box::new(ResizeDocument::new(4, 4, Interpolation::Nearest)))
            .unwrap();
        assert_eq!((d.width(), d.height()), (4, 4));
        h.undo(&mut d);
        assert_eq!((d.width(), d.height()), (8, 8));
        assert_eq!(d.active_layer().image, before);
    }

    #[test]
    fn resize_to_same_size_is_noop() {
        let mut d = doc();
        let mut h = History::new();
        assert!(
            !h.push(&mut d, Box::new(ResizeDocument::new(8, 8, Interpolation::Nearest)))
                .unwrap()
        );
    }

    #[test]
    fn crop_undo_restores_pre_crop_document() {
        let mut d = doc();
        d.active_layer_mut().image.set_pixel(0, 0, Color::BLACK);
        d.select_all();
        let before = d.capture_state();
        let mut h = History::new();
        h.push(&mut d, Box::new(CropDocument::new(Rect::new(2, 2, 4, 4))))
            .unwrap();
        assert_eq!((d.width(), d.height()), (4, 4));
        assert!(d.selection().is_none());
        h.undo(&mut d);
        assert_eq!((d.width(), d.height()), (8, 8));
        assert_eq!(d.active_layer().image, before.frames.frame(0).unwrap().layers.get(0).unwrap().image);
        assert!(d.selection().is_some());
    }

    #[test]
    fn flip_undo_is_second_flip() {
        let mut d = doc();
        d.active_layer_mut().image.set_pixel(1, 1, Color::BLACK);
        let before = d.active_layer().image.clone();
        let mut h = History::new();
        h.push(&mut d, Box::new(FlipDocument::new(FlipAxis::Horizontal)))
            .unwrap();
        assert_eq!(d.active_layer().image.pixel(6, 1), Some(Color::BLACK));
        h.undo(&mut d);
        assert_eq!(d.active_layer().image, before);
    }

    #[test]
    fn move_content_with_selection() {
        let mut d = doc();
        d.active_layer_mut().image.fill(Color::WHITE);
        d.active_layer_mut().image.set_pixel(2, 2, Color::BLACK);
        let sel = Selection::from_rect(8, 8, Rect::new(2, 2, 1, 1));
        d.set_selection(Some(sel.clone()));

        let original = d.active_layer().image.clone();
        let mut base = original.clone();
        base.fill_masked(sel.mask(), Color::TRANSPARENT);
        let mut floating = RasterBuffer::new(8, 8);
        floating.set_pixel(2, 2, Color::BLACK);

        let mut h = History::new();
        h.push(
            &mut d,
            Box::new(MoveContent::new(0, 0, original.clone(), base, floating, Point::new(3, 0), Some(sel))),
        )
        .unwrap();
        assert_eq!(d.active_layer().image.pixel(5, 2), Some(Color::BLACK));
        assert!(d.active_layer().image.pixel(2, 2).unwrap().is_transparent());
        assert!(d.selection().unwrap().contains(Point::new(5, 2)));

        h.undo(&mut d);
        assert_eq!(d.active_layer().image, original);
        assert!(d.selection().unwrap().contains(Point::new(2, 2)));
    }

    #[test]
    fn zero_delta_move_is_noop() {
        let mut d = doc();
        let img = d.active_layer().image.clone();
        let mut h = History::new();
        let pushed = h
            .push(
                &mut d,
                Box::new(MoveContent::new(
                    0,
                    0,
                    img.clone(),
                    img.clone(),
                    img,
                    Point::new(0, 0),
                    None,
                )),
            )
            .unwrap();
        assert!(!pushed);
    }

    #[test]
    fn selection_edit_round_trip() {
        let mut d = doc();
        let mut h = History::new();
        let sel = Selection::from_rect(8, 8, Rect::new(1, 1, 3, 3));
        let cmd = Box::new(SelectionEdit::new(&d, Some(sel)));
        h.push(&mut d, cmd).unwrap();
        assert!(d.selection().is_some());
        h.undo(&mut d);
        assert!(d.selection().is_none());
        h.redo(&mut d);
        assert!(d.selection().unwrap().contains(Point::new(2, 2)));
    }

    #[test]
    fn clearing_nothing_is_noop() {
        let mut d = doc();
        let mut h = History::new();
        let cmd = Box::new(SelectionEdit::new(&d, None));
        assert!(!h.push(&mut d, cmd).unwrap());
    }

    #[test]
    fn layer_edit_replays_after_image() {
        let mut d = doc();
        let mut h = History::new();
        let cmd = Box::new(LayerEdit::new(&d, 0, |img| {
            img.fill(Color::rgb(1, 2, 3));
        }));
        h.push(&mut d, cmd).unwrap();
        let after = d.active_layer().image.clone();
        h.undo(&mut d);
        assert!(d.active_layer().image.pixel(0, 0).unwrap().is_transparent());
        h.redo(&mut d);
        assert_eq!(d.active_layer().image, after);
    }
}
