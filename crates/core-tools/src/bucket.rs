//! Bucket tool: flood fill on press.

use crate::{Tool, ToolCtx};
use core_context::ToolId;
use core_events::{PointerButton, PointerEvent};
use core_history::commands::Fill;
use tracing::warn;

pub struct BucketTool;

impl BucketTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BucketTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for BucketTool {
    fn id(&self) -> ToolId {
        ToolId::Bucket
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button != PointerButton::Left {
            return;
        }
        let (frame, layer) = cx.target();
        let cmd = Fill::new(
            frame,
            layer,
            ev.pos,
            cx.draw.pen_color(),
            cx.draw.mirrors(),
            cx.selection_mask(),
        );
        if let Err(err) = cx.history.push(cx.doc, Box::new(cmd)) {
            warn!(target: "tools.bucket", %err, "fill_rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolOverlay;
    use core_context::DrawingContext;
    use core_doc::Document;
    use core_history::History;
    use core_raster::{Color, Point};

    #[test]
    fn press_fills_immediately_and_noop_fill_records_nothing() {
        let mut doc = Document::new(6, 6);
        let mut history = History::new();
        let mut draw = DrawingContext::new();
        let mut overlay = ToolOverlay::default();
        draw.set_pen_color(Color::rgb(9, 9, 9));
        let mut tool = BucketTool::new();

        let mut cx = ToolCtx {
            doc: &mut doc,
            history: &mut history,
            draw: &mut draw,
            overlay: &mut overlay,
            zoom: 1.0,
        };
        tool.on_press(&mut cx, &PointerEvent::press(Point::new(3, 3), PointerButton::Left));
        assert_eq!(doc.active_layer().image.pixel(0, 0), Some(Color::rgb(9, 9, 9)));
        assert_eq!(history.undo_depth(), 1);

        // Filling the same color again changes nothing and records nothing.
        let mut cx = ToolCtx {
            doc: &mut doc,
            history: &mut history,
            draw: &mut draw,
            overlay: &mut overlay,
            zoom: 1.0,
        };
        tool.on_press(&mut cx, &PointerEvent::press(Point::new(3, 3), PointerButton::Left));
        assert_eq!(history.undo_depth(), 1);
    }
}
