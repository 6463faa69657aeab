//! Freehand pen, with the eraser as its right-button variant.

use crate::{Tool, ToolCtx};
use core_context::ToolId;
use core_events::{PointerButton, PointerEvent};
use core_history::commands::DrawStroke;
use core_raster::Point;
use core_rasterizer::{PaintOp, line_with_brush, stamp_brush};
use tracing::warn;

pub struct PenTool {
    drawing: bool,
    erasing: bool,
    points: Vec<Point>,
    last: Point,
}

impl PenTool {
    pub fn new() -> Self {
        Self {
            drawing: false,
            erasing: false,
            points: Vec::new(),
            last: Point::new(0, 0),
        }
    }

    fn op(&self, cx: &ToolCtx<'_>) -> PaintOp {
        if self.erasing {
            PaintOp::Erase
        } else {
            PaintOp::Paint(cx.draw.pen_color())
        }
    }
}

impl Default for PenTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for PenTool {
    fn id(&self) -> ToolId {
        ToolId::Pen
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        match ev.button {
            PointerButton::Left => {
                self.drawing = true;
                self.erasing = false;
            }
            PointerButton::Right => {
                self.drawing = false;
                self.erasing = true;
            }
            PointerButton::Middle => return,
        }
        self.points = vec![ev.pos];
        self.last = ev.pos;
        // Preview on a copy of the active layer so the stroke composites at
        // the layer's depth (and erasing shows through).
        let mut preview = cx.doc.active_layer().image.clone();
        let mask = cx.selection_mask();
        stamp_brush(
            &mut preview,
            ev.pos,
            cx.draw.brush(),
            cx.draw.pen_width(),
            self.op(cx),
            cx.draw.mirrors(),
            mask.as_ref(),
        );
        cx.overlay.image = Some(preview);
        cx.overlay.replaces_active_layer = true;
    }

    fn on_move(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.drawing && !self.erasing {
            return;
        }
        let op = self.op(cx);
        let mask = cx.selection_mask();
        let Some(preview) = cx.overlay.image.as_mut() else {
            return;
        };
        line_with_brush(
            preview,
            self.last,
            ev.pos,
            cx.draw.brush(),
            cx.draw.pen_width(),
            op,
            cx.draw.mirrors(),
            mask.as_ref(),
        );
        self.points.push(ev.pos);
        self.last = ev.pos;
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, _ev: &PointerEvent) {
        if !self.drawing && !self.erasing {
            return;
        }
        let erase = self.erasing;
        self.drawing = false;
        self.erasing = false;
        let points = std::mem::take(&mut self.points);
        cx.overlay.clear();
        if points.is_empty() {
            return;
        }
        let (frame, layer) = cx.target();
        let cmd = DrawStroke::new(
            frame,
            layer,
            points,
            cx.draw.pen_color(),
            cx.draw.pen_width(),
            cx.draw.brush(),
            erase,
            cx.draw.mirrors(),
            cx.selection_mask(),
        );
        if let Err(err) = cx.history.push(cx.doc, Box::new(cmd)) {
            warn!(target: "tools.pen", %err, "stroke_rejected");
        }
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        self.drawing = false;
        self.erasing = false;
        self.points.clear();
        cx.overlay.clear();
    }
}
