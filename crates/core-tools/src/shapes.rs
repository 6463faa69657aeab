//! Drag-to-draw tools: line, rectangle outline, ellipse outline.
//!
//! All three re-render their preview from a snapshot of the active layer on
//! every move, so the shape follows the pointer instead of accumulating.
//! Holding Shift constrains the drag to equal extents (a square bounding box;
//! for the line, a 45°-stepped direction is not applied — equal extents only,
//! matching the original).

use crate::{Tool, ToolCtx};
use core_context::ToolId;
use core_events::{Modifiers, PointerButton, PointerEvent};
use core_history::commands::{DrawStroke, Shape, ShapeKind};
use core_raster::{Point, Rect, RasterBuffer};
use core_rasterizer::{PaintOp, draw_ellipse, draw_rect_outline, line_with_brush};
use tracing::warn;

/// Constrain `end` so the drag spans equal extents in x and y.
fn constrain_square(start: Point, end: Point) -> Point {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let size = dx.abs().min(dy.abs());
    Point::new(
        start.x + size * if dx >= 0 { 1 } else { -1 },
        start.y + size * if dy >= 0 { 1 } else { -1 },
    )
}

/// Shared drag state for the three shape tools.
struct ShapeDrag {
    start: Point,
    original: Option<RasterBuffer>,
}

impl ShapeDrag {
    fn new() -> Self {
        Self {
            start: Point::new(0, 0),
            original: None,
        }
    }

    fn begin(&mut self, cx: &mut ToolCtx<'_>, pos: Point) {
        self.start = pos;
        let original = cx.doc.active_layer().image.clone();
        cx.overlay.image = Some(original.clone());
        cx.overlay.replaces_active_layer = true;
        self.original = Some(original);
    }

    fn end_point(&self, ev: &PointerEvent) -> Point {
        if ev.mods.contains(Modifiers::SHIFT) {
            constrain_square(self.start, ev.pos)
        } else {
            ev.pos
        }
    }

    /// Reset the overlay to the pre-drag pixels and return it for painting.
    fn fresh_preview<'a>(&self, cx: &'a mut ToolCtx<'_>) -> Option<&'a mut RasterBuffer> {
        let original = self.original.as_ref()?;
        let preview = cx.overlay.image.as_mut()?;
        preview.paste_source(original);
        Some(preview)
    }

    fn finish(&mut self, cx: &mut ToolCtx<'_>) {
        self.original = None;
        cx.overlay.clear();
    }

    fn active(&self) -> bool {
        self.original.is_some()
    }
}

pub struct LineTool {
    drag: ShapeDrag,
}

impl LineTool {
    pub fn new() -> Self {
        Self {
            drag: ShapeDrag::new(),
        }
    }
}

impl Default for LineTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for LineTool {
    fn id(&self) -> ToolId {
        ToolId::Line
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button == PointerButton::Left {
            self.drag.begin(cx, ev.pos);
        }
    }

    fn on_move(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.drag.active() {
            return;
        }
        let end = self.drag.end_point(ev);
        let start = self.drag.start;
        let (brush, width, color, mirrors) = (
            cx.draw.brush(),
            cx.draw.pen_width(),
            cx.draw.pen_color(),
            cx.draw.mirrors(),
        );
        let mask = cx.selection_mask();
        if let Some(preview) = self.drag.fresh_preview(cx) {
            line_with_brush(
                preview,
                start,
                end,
                brush,
                width,
                PaintOp::Paint(color),
                mirrors,
                mask.as_ref(),
            );
        }
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.drag.active() {
            return;
        }
        let end = self.drag.end_point(ev);
        let start = self.drag.start;
        self.drag.finish(cx);
        let (frame, layer) = cx.target();
        let cmd = DrawStroke::new(
            frame,
            layer,
            vec![start, end],
            cx.draw.pen_color(),
            cx.draw.pen_width(),
            cx.draw.brush(),
            false,
            cx.draw.mirrors(),
            cx.selection_mask(),
        );
        if let Err(err) = cx.history.push(cx.doc, Box::new(cmd)) {
            warn!(target: "tools.line", %err, "line_rejected");
        }
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        self.drag.finish(cx);
    }
}

pub struct RectangleTool {
    drag: ShapeDrag,
}

impl RectangleTool {
    pub fn new() -> Self {
        Self {
            drag: ShapeDrag::new(),
        }
    }
}

impl Default for RectangleTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for RectangleTool {
    fn id(&self) -> ToolId {
        ToolId::Rectangle
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button == PointerButton::Left {
            self.drag.begin(cx, ev.pos);
        }
    }

    fn on_move(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.drag.active() {
            return;
        }
        let rect = Rect::from_points(self.drag.start, self.drag.end_point(ev));
        let (brush, width, color, mirrors) = (
            cx.draw.brush(),
            cx.draw.pen_width(),
            cx.draw.pen_color(),
            cx.draw.mirrors(),
        );
        let mask = cx.selection_mask();
        if let Some(preview) = self.drag.fresh_preview(cx) {
            draw_rect_outline(
                preview,
                rect,
                brush,
                width,
                PaintOp::Paint(color),
                mirrors,
                mask.as_ref(),
            );
        }
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.drag.active() {
            return;
        }
        let rect = Rect::from_points(self.drag.start, self.drag.end_point(ev));
        self.drag.finish(cx);
        let (frame, layer) = cx.target();
        let cmd = Shape::new(
            frame,
            layer,
            rect,
            ShapeKind::Rectangle,
            false,
            cx.draw.pen_color(),
            cx.draw.pen_width(),
            cx.draw.brush(),
            cx.draw.mirrors(),
            cx.selection_mask(),
        );
        if let Err(err) = cx.history.push(cx.doc, Box::new(cmd)) {
            warn!(target: "tools.rect", %err, "shape_rejected");
        }
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        self.drag.finish(cx);
    }
}

pub struct EllipseTool {
    drag: ShapeDrag,
}

impl EllipseTool {
    pub fn new() -> Self {
        Self {
            drag: ShapeDrag::new(),
        }
    }
}

impl Default for EllipseTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for EllipseTool {
    fn id(&self) -> ToolId {
        ToolId::Ellipse
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button == PointerButton::Left {
            self.drag.begin(cx, ev.pos);
        }
    }

    fn on_move(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.drag.active() {
            return;
        }
        let rect = Rect::from_points(self.drag.start, self.drag.end_point(ev));
        let (brush, width, color, mirrors) = (
            cx.draw.brush(),
            cx.draw.pen_width(),
            cx.draw.pen_color(),
            cx.draw.mirrors(),
        );
        let mask = cx.selection_mask();
        if let Some(preview) = self.drag.fresh_preview(cx) {
            draw_ellipse(
                preview,
                rect,
                brush,
                width,
                PaintOp::Paint(color),
                mirrors,
                mask.as_ref(),
            );
        }
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if !self.drag.active() {
            return;
        }
        let rect = Rect::from_points(self.drag.start, self.drag.end_point(ev));
        self.drag.finish(cx);
        let (frame, layer) = cx.target();
        let cmd = Shape::new(
            frame,
            layer,
            rect,
            ShapeKind::Ellipse,
            false,
            cx.draw.pen_color(),
            cx.draw.pen_width(),
            cx.draw.brush(),
            cx.draw.mirrors(),
            cx.selection_mask(),
        );
        if let Err(err) = cx.history.push(cx.doc, Box::new(cmd)) {
            warn!(target: "tools.ellipse", %err, "shape_rejected");
        }
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        self.drag.finish(cx);
    }
}
