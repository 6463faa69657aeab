//! Shared drawing parameters.
//!
//! One [`DrawingContext`] exists per editing session, owned by the host with
//! an explicit lifetime and handed to tools by reference — never reached
//! through a global. The UI thread is the single writer; observers are
//! notified synchronously, once per actual change (setting a field to its
//! current value is silent).
//!
//! Commands never read the context at replay time: tools copy the fields they
//! need into the command at capture time.

use core_events::{SubscriberList, Subscription};
use core_raster::Color;
use core_rasterizer::{BrushType, Mirrors};
use tracing::debug;

/// Identifier of the active tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolId {
    Pen,
    Line,
    Rectangle,
    Ellipse,
    Bucket,
    Picker,
    Move,
    SelectRectangle,
    SelectEllipse,
    SelectLasso,
    SelectColor,
}

/// Payload of a context change notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextChange {
    PenColor(Color),
    PenWidth(u32),
    Brush(BrushType),
    MirrorX(bool),
    MirrorY(bool),
    Tool(ToolId),
}

pub struct DrawingContext {
    pen_color: Color,
    pen_width: u32,
    brush: BrushType,
    mirror_x: bool,
    mirror_y: bool,
    tool: ToolId,
    previous_tool: Option<ToolId>,
    changed: SubscriberList<ContextChange>,
}

impl Default for DrawingContext {
    fn default() -> Self {
        Self {
            pen_color: Color::BLACK,
            pen_width: 1,
            brush: BrushType::Square,
            mirror_x: false,
            mirror_y: false,
            tool: ToolId::Pen,
            previous_tool: None,
            changed: SubscriberList::new(),
        }
    }
}

impl DrawingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, f: impl FnMut(&ContextChange) + 'static) -> Subscription {
        self.changed.subscribe(f)
    }

    pub fn unsubscribe(&mut self, sub: Subscription) {
        self.changed.unsubscribe(sub);
    }

    pub fn pen_color(&self) -> Color {
        self.pen_color
    }

    pub fn set_pen_color(&mut self, color: Color) {
        if self.pen_color != color {
            self.pen_color = color;
            self.changed.emit(&ContextChange::PenColor(color));
        }
    }

    pub fn pen_width(&self) -> u32 {
        self.pen_width
    }

    /// Pen width in pixels, minimum 1.
    pub fn set_pen_width(&mut self, width: u32) {
        let width = width.max(1);
        if self.pen_width != width {
            self.pen_width = width;
            self.changed.emit(&ContextChange::PenWidth(width));
        }
    }

    pub fn brush(&self) -> BrushType {
        self.brush
    }

    pub fn set_brush(&mut self, brush: BrushType) {
        if self.brush != brush {
            self.brush = brush;
            self.changed.emit(&ContextChange::Brush(brush));
        }
    }

    pub fn mirror_x(&self) -> bool {
        self.mirror_x
    }

    pub fn set_mirror_x(&mut self, on: bool) {
        if self.mirror_x != on {
            self.mirror_x = on;
            self.changed.emit(&ContextChange::MirrorX(on));
        }
    }

    pub fn mirror_y(&self) -> bool {
        self.mirror_y
    }

    pub fn set_mirror_y(&mut self, on: bool) {
        if self.mirror_y != on {
            self.mirror_y = on;
            self.changed.emit(&ContextChange::MirrorY(on));
        }
    }

    /// Both mirror flags as the rasterizer's type.
    pub fn mirrors(&self) -> Mirrors {
        Mirrors::new(self.mirror_x, self.mirror_y)
    }

    pub fn tool(&self) -> ToolId {
        self.tool
    }

    /// Tool that was active before the current one (used by the picker to
    /// switch back on release).
    pub fn previous_tool(&self) -> Option<ToolId> {
        self.previous_tool
    }

    pub fn set_tool(&mut self, tool: ToolId) {
        if self.tool != tool {
            debug!(target: "context", ?tool, "tool_changed");
            self.previous_tool = Some(self.tool);
            self.tool = tool;
            self.changed.emit(&ContextChange::Tool(tool));
        }
    }
}
