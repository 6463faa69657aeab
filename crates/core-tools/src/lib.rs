//! Tool state machines.
//!
//! Each tool is a small state machine fed abstract pointer events in document
//! coordinates. Tools read the drawing context and the selection, paint
//! previews into a [`ToolOverlay`], and on release submit a command to the
//! history — the live layer is never mutated during a drag, so canceling a
//! tool is just dropping its overlay.
//!
//! Overlay contract: when `replaces_active_layer` is set the host composites
//! the overlay image *instead of* the active layer (pen, eraser, shapes,
//! move); otherwise the overlay is drawn above the whole composite. Every
//! tool that allocates an overlay releases it on release or cancellation.

use core_context::{DrawingContext, ToolId};
use core_doc::Document;
use core_events::{PointerEvent, PointerPhase};
use core_history::History;
use core_raster::{Mask, RasterBuffer};
use tracing::trace;

pub mod bucket;
pub mod move_tool;
pub mod pen;
pub mod picker;
pub mod select;
pub mod shapes;

pub use bucket::BucketTool;
pub use move_tool::MoveTool;
pub use pen::PenTool;
pub use picker::PickerTool;
pub use select::{SelectColorTool, SelectEllipseTool, SelectLassoTool, SelectRectangleTool};
pub use shapes::{EllipseTool, LineTool, RectangleTool};

/// Temporary preview image owned by the active tool.
#[derive(Debug, Default)]
pub struct ToolOverlay {
    pub image: Option<RasterBuffer>,
    /// Composite the overlay in place of the active layer rather than above
    /// the whole document.
    pub replaces_active_layer: bool,
}

impl ToolOverlay {
    pub fn clear(&mut self) {
        self.image = None;
        self.replaces_active_layer = false;
    }

    pub fn is_active(&self) -> bool {
        self.image.is_some()
    }
}

/// Everything a tool may touch while handling one event.
pub struct ToolCtx<'a> {
    pub doc: &'a mut Document,
    pub history: &'a mut History,
    pub draw: &'a mut DrawingContext,
    pub overlay: &'a mut ToolOverlay,
    /// Host view scale; border hit tolerances divide by this so the grab
    /// band stays constant on screen.
    pub zoom: f64,
}

impl ToolCtx<'_> {
    /// Clipping mask of the current selection, cloned for capture into a
    /// command.
    pub fn selection_mask(&self) -> Option<Mask> {
        self.doc.selection_mask().cloned()
    }

    /// Address of the drawing target: (current frame, active layer).
    pub fn target(&self) -> (usize, usize) {
        (
            self.doc.frames.current_index(),
            self.doc.layers().active_index(),
        )
    }
}

pub trait Tool {
    fn id(&self) -> ToolId;

    fn on_press(&mut self, _cx: &mut ToolCtx<'_>, _ev: &PointerEvent) {}
    fn on_move(&mut self, _cx: &mut ToolCtx<'_>, _ev: &PointerEvent) {}
    fn on_release(&mut self, _cx: &mut ToolCtx<'_>, _ev: &PointerEvent) {}
    fn on_double_click(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        let _ = (cx, ev);
    }

    /// Abort the current interaction, dropping any preview state.
    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        cx.overlay.clear();
    }

    fn handle(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        match ev.phase {
            PointerPhase::Press => self.on_press(cx, ev),
            PointerPhase::Move => self.on_move(cx, ev),
            PointerPhase::Release => self.on_release(cx, ev),
            PointerPhase::DoubleClick => self.on_double_click(cx, ev),
        }
    }
}

/// The full tool registry; dispatches events to whichever tool the drawing
/// context names as active.
pub struct ToolSet {
    tools: Vec<Box<dyn Tool>>,
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolSet {
    pub fn new() -> Self {
        Self {
            tools: vec![
                Box::new(PenTool::new()),
                Box::new(LineTool::new()),
                Box::new(RectangleTool::new()),
                Box::new(EllipseTool::new()),
                Box::new(BucketTool::new()),
                Box::new(PickerTool::new()),
                Box::new(MoveTool::new()),
                Box::new(SelectRectangleTool::new()),
                Box::new(SelectEllipseTool::new()),
                Box::new(SelectLassoTool::new()),
                Box::new(SelectColorTool::new()),
            ],
        }
    }

    pub fn handle_event(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        let id = cx.draw.tool();
        trace!(target: "tools", ?id, phase = ?ev.phase, x = ev.pos.x, y = ev.pos.y, "pointer_event");
        if let Some(tool) = self.tools.iter_mut().find(|t| t.id() == id) {
            tool.handle(cx, ev);
        }
    }

    /// Abort whatever interaction the active tool has open (tool switch,
    /// escape, document load).
    pub fn cancel_active(&mut self, cx: &mut ToolCtx<'_>) {
        let id = cx.draw.tool();
        if let Some(tool) = self.tools.iter_mut().find(|t| t.id() == id) {
            tool.cancel(cx);
        }
    }
}
