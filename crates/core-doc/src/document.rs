//! The document: canvas dimensions, frames, selection, and compositing.

use crate::frames::{Frame, FrameManager};
use crate::layer::Layer;
use crate::{DocError, stack::LayerStack};
use core_events::SubscriberList;
use core_raster::{Interpolation, Rect, RasterBuffer};
use core_selection::Selection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Mirror axis for [`Document::flip`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Change signals the host subscribes to. Not persisted; a loaded document
/// starts with empty lists.
#[derive(Debug, Default)]
pub struct DocumentEvents {
    /// Any pixel or structural change.
    pub document_changed: SubscriberList<()>,
    /// Selection set or cleared; payload is "has a selection now".
    pub selection_changed: SubscriberList<bool>,
    /// Bounding size of the selection after a change (0,0 when none).
    pub selection_size_changed: SubscriberList<(u32, u32)>,
    /// A frame key was added, removed, or moved; payload is the frame index.
    pub key_changed: SubscriberList<usize>,
    /// A layer was renamed; payload is (layer index in current frame, name).
    pub layer_name_changed: SubscriberList<(usize, String)>,
}

/// Host-configured side effects of keying a frame (the `[animation]`
/// configuration section).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyInsertBehavior {
    /// Seed the new key with a copy of the current frame instead of a blank.
    pub duplicate: bool,
    /// Hide the layers of the previously current frame.
    pub hide_current: bool,
    /// Append a fresh transparent layer on top of the new key's stack.
    pub new_layer: bool,
    /// Step the current frame onto the new key.
    pub move_to_next: bool,
}

/// Snapshot of a document's reversible state (see
/// [`Document::capture_state`]).
#[derive(Clone, Debug)]
pub struct DocumentState {
    pub width: u32,
    pub height: u32,
    pub frames: FrameManager,
    pub selection: Option<Selection>,
    pub ai_output_rect: Option<Rect>,
}

/// A layered, animated raster document.
#[derive(Debug, Serialize, Deserialize)]
pub struct Document {
    width: u32,
    height: u32,
    pub frames: FrameManager,
    selection: Option<Selection>,
    /// Canvas-space rectangle the AI adapter renders into, when configured.
    pub ai_output_rect: Option<Rect>,
    #[serde(skip, default)]
    pub events: DocumentEvents,
}

impl Document {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "document dimensions must be nonzero");
        Self {
            width,
            height,
            frames: FrameManager::new(width, height),
            selection: None,
            ai_output_rect: None,
            events: DocumentEvents::default(),
        }
    }

    /// New document whose first layer is filled with `color` (the
    /// `first_layer_fill_color` of the new-document configuration).
    pub fn with_background(width: u32, height: u32, color: core_raster::Color) -> Self {
        let mut doc = Self::new(width, height);
        doc.frames
            .current_frame_mut()
            .layers
            .active_layer_mut()
            .image
            .fill(color);
        doc
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The layer stack of the current frame.
    pub fn layers(&self) -> &LayerStack {
        &self.frames.current_frame().layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.frames.current_frame_mut().layers
    }

    pub fn active_layer(&self) -> &Layer {
        self.layers().active_layer()
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        self.layers_mut().active_layer_mut()
    }

    /// Rename a layer of the current frame, notifying `layer_name_changed`.
    pub fn rename_layer(&mut self, index: usize, name: impl Into<String>) -> Result<(), DocError> {
        let name = name.into();
        self.layers_mut().get_mut(index)?.set_name(name.clone())?;
        self.events.layer_name_changed.emit(&(index, name));
        Ok(())
    }

    // --- selection -------------------------------------------------------

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Clipping mask of the current selection, `None` when nothing is
    /// selected (no restriction).
    pub fn selection_mask(&self) -> Option<&core_raster::Mask> {
        self.selection.as_ref().map(|s| s.mask())
    }

    /// Install (or clear) the selection. An empty region collapses to `None`
    /// so `selection().is_some()` means "at least one pixel".
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection.filter(|s| !s.is_empty());
        let has = self.selection.is_some();
        let size = self
            .selection
            .as_ref()
            .and_then(|s| s.bounding_rect())
            .map(|r| (r.w, r.h))
            .unwrap_or((0, 0));
        self.events.selection_changed.emit(&has);
        self.events.selection_size_changed.emit(&size);
    }

    pub fn select_all(&mut self) {
        self.set_selection(Some(Selection::all(self.width, self.height)));
    }

    pub fn select_none(&mut self) {
        self.set_selection(None);
    }

    pub fn invert_selection(&mut self) {
        let next = match self.selection.take() {
            Some(s) => s.invert(),
            None => Selection::all(self.width, self.height),
        };
        self.set_selection(Some(next));
    }

    // --- keyed frames -----------------------------------------------------

    /// Mark `index` as a keyed frame with the host-configured side effects.
    ///
    /// Order is fixed: the key's content is seeded first (a copy of the
    /// current frame when `duplicate`, a blank frame otherwise), then the
    /// previously current frame's layers are hidden (`hide_current`), then a
    /// fresh layer is appended on top of the key's stack (`new_layer`), and
    /// finally the current frame steps onto the key (`move_to_next`).
    pub fn insert_key(&mut self, index: usize, behavior: KeyInsertBehavior) {
        let source = self.frames.current_index();
        self.frames.add_key(index);
        if index != source {
            let content = if behavior.duplicate {
                self.frames
                    .frame(source)
                    .expect("current frame exists")
                    .clone()
            } else {
                Frame::new(self.width, self.height)
            };
            *self
                .frames
                .frame_mut(index)
                .expect("add_key extended the frame list") = content;
            if behavior.hide_current {
                for layer in self
                    .frames
                    .frame_mut(source)
                    .expect("current frame exists")
                    .layers
                    .iter_mut()
                {
                    layer.visible = false;
                }
            }
        }
        if behavior.new_layer {
            let layer = Layer::new(self.width, self.height, "Layer")
                .expect("constant name is non-empty");
            let stack = &mut self
                .frames
                .frame_mut(index)
                .expect("add_key extended the frame list")
                .layers;
            let top = stack.len();
            stack.insert(top, layer).expect("append index is valid");
        }
        if behavior.move_to_next {
            let _ = self.frames.set_current(index);
        }
        self.events.key_changed.emit(&index);
        self.events.document_changed.emit(&());
    }

    // --- compositing -----------------------------------------------------

    /// Composite of the frame shown at playback index `p` (hold-last-key
    /// resolution), bottom to top, source-over with per-layer opacity.
    pub fn render(&self, p: usize) -> RasterBuffer {
        self.composite(self.frames.resolved_frame(p), None)
    }

    /// Composite of the current frame.
    pub fn render_current(&self) -> RasterBuffer {
        self.composite(self.frames.current_frame(), None)
    }

    /// Composite of the current frame skipping the layer at `skip` (eraser
    /// preview reconstruction).
    pub fn render_except(&self, skip: usize) -> RasterBuffer {
        self.composite(self.frames.current_frame(), Some(skip))
    }

    fn composite(&self, frame: &Frame, skip: Option<usize>) -> RasterBuffer {
        let mut out = RasterBuffer::new(self.width, self.height);
        for (i, layer) in frame.layers.iter().enumerate() {
            if Some(i) == skip || !layer.visible {
                continue;
            }
            out.blit_with_opacity(&layer.image, 0, 0, layer.opacity.clamp(0.0, 1.0));
        }
        out
    }

    // --- whole-document transforms ----------------------------------------

    /// Deep copy of everything a whole-document transform can touch. Resize
    /// and crop commands capture one of these for exact reversal.
    pub fn capture_state(&self) -> DocumentState {
        DocumentState {
            width: self.width,
            height: self.height,
            frames: self.frames.clone(),
            selection: self.selection.clone(),
            ai_output_rect: self.ai_output_rect,
        }
    }

    /// Restore a captured state wholesale, emitting the change signals.
    pub fn restore_state(&mut self, state: DocumentState) {
        self.width = state.width;
        self.height = state.height;
        self.frames = state.frames;
        self.ai_output_rect = state.ai_output_rect;
        self.set_selection(state.selection);
        self.events.document_changed.emit(&());
    }

    /// Rebuild every layer of every frame at the new size. The selection is
    /// cleared (its pixel set has no meaning at the new scale) and the AI
    /// output rect is dropped when it no longer fits.
    pub fn resize(&mut self, new_w: u32, new_h: u32, filter: Interpolation) {
        assert!(new_w > 0 && new_h > 0, "document dimensions must be nonzero");
        info!(target: "doc", new_w, new_h, ?filter, "resize");
        for frame in self.frames.frames_mut() {
            for layer in frame.layers.iter_mut() {
                layer.image = layer.image.scaled(new_w, new_h, filter);
            }
        }
        self.width = new_w;
        self.height = new_h;
        if let Some(r) = self.ai_output_rect
            && r.clipped(new_w, new_h) != Some(r)
        {
            self.ai_output_rect = None;
        }
        self.set_selection(None);
        self.events.document_changed.emit(&());
    }

    /// Replace every layer with its subregion under `rect` (clipped to the
    /// canvas). Fails with `DimensionMismatch` when the clip leaves nothing.
    pub fn crop(&mut self, rect: Rect) -> Result<(), DocError> {
        let r = rect
            .clipped(self.width, self.height)
            .ok_or(DocError::DimensionMismatch {
                src_w: rect.w,
                src_h: rect.h,
                dst_w: self.width,
                dst_h: self.height,
            })?;
        info!(target: "doc", x = r.x, y = r.y, w = r.w, h = r.h, "crop");
        for frame in self.frames.frames_mut() {
            for layer in frame.layers.iter_mut() {
                layer.image = layer
                    .image
                    .copy_region(r)
                    .expect("clip is inside the canvas");
            }
        }
        self.width = r.w;
        self.height = r.h;
        self.ai_output_rect = None;
        self.set_selection(None);
        self.events.document_changed.emit(&());
        Ok(())
    }

    /// In-place mirror of every layer of every frame.
    pub fn flip(&mut self, axis: FlipAxis) {
        debug!(target: "doc", ?axis, "flip");
        for frame in self.frames.frames_mut() {
            for layer in frame.layers.iter_mut() {
                match axis {
                    FlipAxis::Horizontal => layer.image.flip_horizontal(),
                    FlipAxis::Vertical => layer.image.flip_vertical(),
                }
            }
        }
        self.events.document_changed.emit(&());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_raster::{Color, Point};

    fn doc() -> Document {
        Document::new(10, 10)
    }

    #[test]
    fn render_composites_bottom_to_top_with_opacity() {
        let mut d = doc();
        d.active_layer_mut().image.fill(Color::WHITE);
        d.layers_mut().add("ink").unwrap();
        d.active_layer_mut().image.fill(Color::BLACK);
        d.active_layer_mut().opacity = 0.5;
        let out = d.render_current();
        let px = out.pixel(5, 5).unwrap();
        assert!(px.r > 100 && px.r < 150 && px.a == 255);
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let mut d = doc();
        d.active_layer_mut().image.fill(Color::WHITE);
        d.layers_mut().add("ink").unwrap();
        d.active_layer_mut().image.fill(Color::BLACK);
        d.layers_mut().toggle_visibility(1).unwrap();
        assert_eq!(d.render_current().pixel(0, 0), Some(Color::WHITE));
    }

    #[test]
    fn render_except_skips_one_layer() {
        let mut d = doc();
        d.active_layer_mut().image.fill(Color::WHITE);
        d.layers_mut().add("ink").unwrap();
        d.active_layer_mut().image.fill(Color::BLACK);
        assert_eq!(d.render_except(1).pixel(0, 0), Some(Color::WHITE));
        assert_eq!(d.render_current().pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn playback_render_follows_keys() {
        let mut d = doc();
        d.frames.add_key(2);
        d.frames.playback_total = 5;
        d.frames
            .frame_mut(2)
            .unwrap()
            .layers
            .active_layer_mut()
            .image
            .fill(Color::BLACK);
        assert!(d.render(0).pixel(0, 0).unwrap().is_transparent());
        assert!(d.render(1).pixel(0, 0).unwrap().is_transparent());
        for p in 2..5 {
            assert_eq!(d.render(p).pixel(0, 0), Some(Color::BLACK), "playback {p}");
        }
    }

    #[test]
    fn rename_layer_validates_and_notifies() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let mut d = doc();
        let log: Rc<RefCell<Vec<(usize, String)>>> = Rc::default();
        let l = log.clone();
        d.events
            .layer_name_changed
            .subscribe(move |ev| l.borrow_mut().push(ev.clone()));
        d.rename_layer(0, "Sketch").unwrap();
        assert_eq!(d.layers().get(0).unwrap().name(), "Sketch");
        assert_eq!(d.rename_layer(0, ""), Err(DocError::InvalidName));
        assert!(matches!(d.rename_layer(9, "x"), Err(DocError::InvalidIndex { .. })));
        assert_eq!(*log.borrow(), vec![(0, "Sketch".to_string())]);
    }

    #[test]
    fn insert_key_duplicate_then_new_layer() {
        let mut d = doc();
        d.active_layer_mut().image.set_pixel(1, 1, Color::BLACK);
        d.insert_key(
            2,
            KeyInsertBehavior {
                duplicate: true,
                new_layer: true,
                move_to_next: true,
                ..KeyInsertBehavior::default()
            },
        );
        assert!(d.frames.is_keyed(2));
        assert_eq!(d.frames.current_index(), 2);
        // duplicated content below, blank layer on top and active
        assert_eq!(d.layers().len(), 2);
        assert_eq!(d.layers().get(0).unwrap().image.pixel(1, 1), Some(Color::BLACK));
        assert!(d.active_layer().image.pixels().all(|c| c.is_transparent()));
    }

    #[test]
    fn insert_key_blank_and_hide_current() {
        let mut d = doc();
        d.active_layer_mut().image.set_pixel(1, 1, Color::BLACK);
        d.insert_key(
            1,
            KeyInsertBehavior {
                hide_current: true,
                ..KeyInsertBehavior::default()
            },
        );
        assert!(d.frames.is_keyed(1));
        // blank key, previous frame's layers hidden
        assert!(
            d.frames
                .frame(1)
                .unwrap()
                .layers
                .active_layer()
                .image
                .pixels()
                .all(|c| c.is_transparent())
        );
        assert!(!d.frames.frame(0).unwrap().layers.get(0).unwrap().visible);
        assert_eq!(d.frames.current_index(), 0, "no move_to_next");
    }

    #[test]
    fn selection_collapses_empty_to_none() {
        let mut d = doc();
        d.set_selection(Some(Selection::empty(10, 10)));
        assert!(d.selection().is_none());
        d.select_all();
        assert!(d.selection().unwrap().contains(Point::new(9, 9)));
        d.invert_selection();
        assert!(d.selection().is_none(), "inverted select-all is empty");
    }

    #[test]
    fn selection_signals_fire() {
        use std::cell::RefCell;
        use std::rc::Rc;
        let mut d = doc();
        let log: Rc<RefCell<Vec<bool>>> = Rc::default();
        let l = log.clone();
        d.events.selection_changed.subscribe(move |has| l.borrow_mut().push(*has));
        d.select_all();
        d.select_none();
        assert_eq!(*log.borrow(), vec![true, false]);
    }

    #[test]
    fn resize_nearest_scales_every_frame_and_clears_selection() {
        let mut d = doc();
        d.active_layer_mut().image.fill(Color::WHITE);
        d.frames.add_key(1);
        d.select_all();
        d.resize(20, 20, Interpolation::Nearest);
        assert_eq!(d.width(), 20);
        assert!(d.selection().is_none());
        for frame in d.frames.frames() {
            let img = &frame.layers.active_layer().image;
            assert_eq!((img.width(), img.height()), (20, 20));
        }
        assert_eq!(d.render_current().pixel(19, 19), Some(Color::WHITE));
    }

    #[test]
    fn crop_replaces_dimensions_and_content() {
        let mut d = doc();
        d.active_layer_mut().image.set_pixel(4, 4, Color::BLACK);
        d.crop(Rect::new(3, 3, 4, 4)).unwrap();
        assert_eq!((d.width(), d.height()), (4, 4));
        assert_eq!(d.active_layer().image.pixel(1, 1), Some(Color::BLACK));
        assert!(matches!(
            d.crop(Rect::new(100, 100, 5, 5)),
            Err(DocError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn flip_twice_is_identity() {
        let mut d = doc();
        d.active_layer_mut().image.set_pixel(2, 7, Color::BLACK);
        let before = d.active_layer().image.clone();
        d.flip(FlipAxis::Horizontal);
        assert_eq!(d.active_layer().image.pixel(7, 7), Some(Color::BLACK));
        d.flip(FlipAxis::Horizontal);
        assert_eq!(d.active_layer().image, before);
        d.flip(FlipAxis::Vertical);
        d.flip(FlipAxis::Vertical);
        assert_eq!(d.active_layer().image, before);
    }
}
