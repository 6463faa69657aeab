//! Move tool: drag the selected pixels (or the whole layer) by an integer
//! offset.
//!
//! On press the tool captures three canvas-sized buffers: the untouched layer
//! (`original`), the layer with the moved pixels cleared (`base`), and the
//! moved pixels alone (`floating`). The drag only repaints the overlay; the
//! layer is first mutated when the release commits a `MoveContent` command
//! built from the captures.

use crate::{Tool, ToolCtx};
use core_context::ToolId;
use core_events::{PointerButton, PointerEvent};
use core_history::commands::MoveContent;
use core_raster::{Color, Point, RasterBuffer};
use core_selection::Selection;
use tracing::warn;

pub struct MoveTool {
    dragging: bool,
    start: Point,
    delta: Point,
    original: Option<RasterBuffer>,
    base: Option<RasterBuffer>,
    floating: Option<RasterBuffer>,
    selection: Option<Selection>,
}

impl MoveTool {
    pub fn new() -> Self {
        Self {
            dragging: false,
            start: Point::new(0, 0),
            delta: Point::new(0, 0),
            original: None,
            base: None,
            floating: None,
            selection: None,
        }
    }

    fn repaint_overlay(&self, cx: &mut ToolCtx<'_>) {
        let (Some(base), Some(floating)) = (&self.base, &self.floating) else {
            return;
        };
        let mut preview = base.clone();
        preview.blit(floating, self.delta.x, self.delta.y);
        cx.overlay.image = Some(preview);
        cx.overlay.replaces_active_layer = true;
    }

    fn reset(&mut self) {
        self.dragging = false;
        self.delta = Point::new(0, 0);
        self.original = None;
        self.base = None;
        self.floating = None;
        self.selection = None;
    }
}

impl Default for MoveTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for MoveTool {
    fn id(&self) -> ToolId {
        ToolId::Move
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button != PointerButton::Left {
            return;
        }
        let original = cx.doc.active_layer().image.clone();
        let selection = cx.doc.selection().cloned();
        let (base, floating) = match &selection {
            Some(sel) => {
                // Cut: selected pixels into the floating buffer, hole in the
                // base.
                let mask = sel.mask();
                let mut floating = RasterBuffer::new(original.width(), original.height());
                for y in 0..original.height() as i32 {
                    for x in 0..original.width() as i32 {
                        if mask.get(x, y)
                            && let Some(c) = original.pixel(x, y)
                        {
                            floating.set_pixel(x, y, c);
                        }
                    }
                }
                let mut base = original.clone();
                base.fill_masked(mask, Color::TRANSPARENT);
                (base, floating)
            }
            None => {
                // No selection: the whole layer floats.
                let base = RasterBuffer::new(original.width(), original.height());
                (base, original.clone())
            }
        };
        self.dragging = true;
        self.start = ev.pos;
        self.delta = Point::new(0, 0);
        self.original = Some(original);
        self.base = Some(base);
        self.floating = Some(floating);
        self.selection = selection;
        self.repaint_overlay(cx);
    }

    fn on_move(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.dragging {
            return;
        }
        self.delta = Point::new(ev.pos.x - self.start.x, ev.pos.y - self.start.y);
        self.repaint_overlay(cx);
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.dragging {
            return;
        }
        self.delta = Point::new(ev.pos.x - self.start.x, ev.pos.y - self.start.y);
        cx.overlay.clear();
        let (frame, layer) = cx.target();
        let cmd = MoveContent::new(
            frame,
            layer,
            self.original.take().expect("press captured"),
            self.base.take().expect("press captured"),
            self.floating.take().expect("press captured"),
            self.delta,
            self.selection.take(),
        );
        self.reset();
        if let Err(err) = cx.history.push(cx.doc, Box::new(cmd)) {
            warn!(target: "tools.move", %err, "move_rejected");
        }
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        self.reset();
        cx.overlay.clear();
    }
}
