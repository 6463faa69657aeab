//! Color picker: sample the composite, set the pen color, bounce back to the
//! previous tool. Pushes no command.

use crate::{Tool, ToolCtx};
use core_context::ToolId;
use core_events::{PointerButton, PointerEvent};
use tracing::debug;

pub struct PickerTool {
    sampled: bool,
}

impl PickerTool {
    pub fn new() -> Self {
        Self { sampled: false }
    }
}

impl Default for PickerTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for PickerTool {
    fn id(&self) -> ToolId {
        ToolId::Picker
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button != PointerButton::Left {
            return;
        }
        let composite = cx.doc.render_current();
        if let Some(color) = composite.pixel(ev.pos.x, ev.pos.y) {
            debug!(target: "tools.picker", %color, "sampled");
            cx.draw.set_pen_color(color);
            self.sampled = true;
        }
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, _ev: &PointerEvent) {
        if !self.sampled {
            return;
        }
        self.sampled = false;
        if let Some(prev) = cx.draw.previous_tool() {
            cx.draw.set_tool(prev);
        }
    }
}
