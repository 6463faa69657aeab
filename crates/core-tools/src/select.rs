//! Selection tools: rectangle, ellipse, lasso, and color.
//!
//! Shared behavior: a press on the existing selection's border begins a drag
//! of the selection itself; anywhere else starts a new selection interaction.
//! Shift composes the new region into the old by union, Ctrl by subtraction.
//! During the drag the document's selection is updated live as the preview;
//! the release commits one `SelectionEdit` command carrying the pre-press
//! selection so undo restores it.

use crate::{Tool, ToolCtx};
use core_context::ToolId;
use core_events::{Modifiers, PointerButton, PointerEvent};
use core_history::commands::SelectionEdit;
use core_raster::{Point, Rect};
use core_selection::Selection;
use tracing::warn;

/// Screen-space half-width of the border grab band, in document pixels at
/// zoom 1.
const BORDER_GRAB_BAND: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ComposeMode {
    Replace,
    Union,
    Subtract,
}

impl ComposeMode {
    fn from_mods(mods: Modifiers) -> Self {
        if mods.contains(Modifiers::CTRL) {
            ComposeMode::Subtract
        } else if mods.contains(Modifiers::SHIFT) {
            ComposeMode::Union
        } else {
            ComposeMode::Replace
        }
    }

    fn apply(self, base: Option<&Selection>, shape: Selection) -> Option<Selection> {
        match self {
            ComposeMode::Replace => Some(shape),
            ComposeMode::Union => Some(match base {
                Some(b) => b.clone().union(&shape),
                None => shape,
            }),
            ComposeMode::Subtract => base.map(|b| b.clone().subtract(&shape)),
        }
    }
}

/// Border-drag and commit plumbing shared by all four tools.
struct SelectBase {
    moving: bool,
    interacting: bool,
    mode: ComposeMode,
    start: Point,
    last: Point,
    before: Option<Selection>,
}

impl SelectBase {
    fn new() -> Self {
        Self {
            moving: false,
            interacting: false,
            mode: ComposeMode::Replace,
            start: Point::new(0, 0),
            last: Point::new(0, 0),
            before: None,
        }
    }

    /// Begin dragging the selection body if the press lands on its border.
    fn try_begin_border_drag(&mut self, cx: &mut ToolCtx<'_>, pos: Point) -> bool {
        let tolerance = BORDER_GRAB_BAND / cx.zoom.max(0.01);
        if let Some(sel) = cx.doc.selection()
            && sel.on_border(pos, tolerance)
        {
            self.moving = true;
            self.last = pos;
            self.before = cx.doc.selection().cloned();
            return true;
        }
        false
    }

    fn begin_interaction(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        self.interacting = true;
        self.mode = ComposeMode::from_mods(ev.mods);
        self.start = ev.pos;
        self.last = ev.pos;
        self.before = cx.doc.selection().cloned();
    }

    fn drag_selection(&mut self, cx: &mut ToolCtx<'_>, pos: Point) {
        let (dx, dy) = (pos.x - self.last.x, pos.y - self.last.y);
        if (dx, dy) == (0, 0) {
            return;
        }
        if let Some(sel) = cx.doc.selection() {
            let moved = sel.translated(dx, dy);
            cx.doc.set_selection(Some(moved));
        }
        self.last = pos;
    }

    fn preview(&self, cx: &mut ToolCtx<'_>, shape: Selection) {
        let next = self.mode.apply(self.before.as_ref(), shape);
        cx.doc.set_selection(next);
    }

    /// Push one `SelectionEdit` from the pre-press selection to whatever the
    /// preview left on the document. Skipped when nothing changed.
    fn commit(&mut self, cx: &mut ToolCtx<'_>) {
        self.moving = false;
        self.interacting = false;
        let before = self.before.take();
        let after = cx.doc.selection().cloned();
        if before == after {
            return;
        }
        let cmd = SelectionEdit::from_parts(before, after);
        if let Err(err) = cx.history.push(cx.doc, Box::new(cmd)) {
            warn!(target: "tools.select", %err, "selection_edit_rejected");
        }
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        if self.moving || self.interacting {
            cx.doc.set_selection(self.before.take());
        }
        self.moving = false;
        self.interacting = false;
    }
}

pub struct SelectRectangleTool {
    base: SelectBase,
}

impl SelectRectangleTool {
    pub fn new() -> Self {
        Self {
            base: SelectBase::new(),
        }
    }
}

impl Default for SelectRectangleTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectRectangleTool {
    fn id(&self) -> ToolId {
        ToolId::SelectRectangle
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button != PointerButton::Left || self.base.try_begin_border_drag(cx, ev.pos) {
            return;
        }
        self.base.begin_interaction(cx, ev);
    }

    fn on_move(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if self.base.moving {
            self.base.drag_selection(cx, ev.pos);
        } else if self.base.interacting {
            let (w, h) = (cx.doc.width(), cx.doc.height());
            let shape = Selection::from_rect(w, h, Rect::from_points(self.base.start, ev.pos));
            self.base.preview(cx, shape);
        }
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if self.base.interacting && !self.base.moving {
            let (w, h) = (cx.doc.width(), cx.doc.height());
            let shape = Selection::from_rect(w, h, Rect::from_points(self.base.start, ev.pos));
            self.base.preview(cx, shape);
        }
        if self.base.moving || self.base.interacting {
            self.base.commit(cx);
        }
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        self.base.cancel(cx);
        cx.overlay.clear();
    }
}

pub struct SelectEllipseTool {
    base: SelectBase,
}

impl SelectEllipseTool {
    pub fn new() -> Self {
        Self {
            base: SelectBase::new(),
        }
    }
}

impl Default for SelectEllipseTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectEllipseTool {
    fn id(&self) -> ToolId {
        ToolId::SelectEllipse
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button != PointerButton::Left || self.base.try_begin_border_drag(cx, ev.pos) {
            return;
        }
        self.base.begin_interaction(cx, ev);
    }

    fn on_move(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if self.base.moving {
            self.base.drag_selection(cx, ev.pos);
        } else if self.base.interacting {
            let (w, h) = (cx.doc.width(), cx.doc.height());
            let shape = Selection::from_ellipse(w, h, Rect::from_points(self.base.start, ev.pos));
            self.base.preview(cx, shape);
        }
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if self.base.interacting && !self.base.moving {
            let (w, h) = (cx.doc.width(), cx.doc.height());
            let shape = Selection::from_ellipse(w, h, Rect::from_points(self.base.start, ev.pos));
            self.base.preview(cx, shape);
        }
        if self.base.moving || self.base.interacting {
            self.base.commit(cx);
        }
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        self.base.cancel(cx);
        cx.overlay.clear();
    }
}

pub struct SelectLassoTool {
    base: SelectBase,
    path: Vec<Point>,
    dragged: bool,
    pick_contiguous: bool,
}

impl SelectLassoTool {
    pub fn new() -> Self {
        Self {
            base: SelectBase::new(),
            path: Vec::new(),
            dragged: false,
            pick_contiguous: true,
        }
    }

    fn preview_polygon(&mut self, cx: &mut ToolCtx<'_>) {
        if self.path.len() < 3 {
            return;
        }
        let (w, h) = (cx.doc.width(), cx.doc.height());
        let shape = Selection::from_polygon(w, h, &self.path);
        self.base.preview(cx, shape);
    }
}

impl Default for SelectLassoTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectLassoTool {
    fn id(&self) -> ToolId {
        ToolId::SelectLasso
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button != PointerButton::Left || self.base.try_begin_border_drag(cx, ev.pos) {
            return;
        }
        self.base.begin_interaction(cx, ev);
        self.path = vec![ev.pos];
        self.dragged = false;
        // A click without a drag falls back to a color pick; Ctrl makes that
        // pick global instead of contiguous.
        self.pick_contiguous = !ev.mods.contains(Modifiers::CTRL);
    }

    fn on_move(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if self.base.moving {
            self.base.drag_selection(cx, ev.pos);
            return;
        }
        if !self.base.interacting {
            return;
        }
        if self.path.last() != Some(&ev.pos) {
            self.path.push(ev.pos);
            self.dragged = true;
            self.preview_polygon(cx);
        }
    }

    fn on_release(&mut self, cx: &mut ToolCtx<'_>, _ev: &PointerEvent) {
        if self.base.moving {
            self.base.commit(cx);
            return;
        }
        if !self.base.interacting {
            return;
        }
        if self.dragged {
            // Close the subpath and take the polygon interior.
            self.preview_polygon(cx);
        } else if let Some(&seed) = self.path.first() {
            let composite = cx.doc.render_current();
            if let Some(shape) = Selection::from_color(&composite, seed, self.pick_contiguous) {
                self.base.preview(cx, shape);
            }
        }
        self.path.clear();
        self.base.commit(cx);
    }

    fn cancel(&mut self, cx: &mut ToolCtx<'_>) {
        self.path.clear();
        self.dragged = false;
        self.base.cancel(cx);
        cx.overlay.clear();
    }
}

pub struct SelectColorTool {
    base: SelectBase,
}

impl SelectColorTool {
    pub fn new() -> Self {
        Self {
            base: SelectBase::new(),
        }
    }
}

impl Default for SelectColorTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectColorTool {
    fn id(&self) -> ToolId {
        ToolId::SelectColor
    }

    fn on_press(&mut self, cx: &mut ToolCtx<'_>, ev: &PointerEvent) {
        if ev.button != PointerButton::Left {
            return;
        }
        let composite = cx.doc.render_current();
        // Ctrl selects every matching pixel document-wide; otherwise a
        // 4-connected flood from the pressed pixel.
        let contiguous = !ev.mods.contains(Modifiers::CTRL);
        let Some(shape) = Selection::from_color(&composite, ev.pos, contiguous) else {
            return;
        };
        self.base.interacting = true;
        self.base.mode = if ev.mods.contains(Modifiers::SHIFT) {
            ComposeMode::Union
        } else {
            ComposeMode::Replace
        };
        self.base.before = cx.doc.selection().cloned();
        self.base.preview(cx, shape.simplified());
        self.base.commit(cx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ToolOverlay, ToolSet};
    use core_context::DrawingContext;
    use core_doc::Document;
    use core_history::History;
    use core_raster::Color;

    struct Rig {
        doc: Document,
        history: History,
        draw: DrawingContext,
        overlay: ToolOverlay,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                doc: Document::new(16, 16),
                history: History::new(),
                draw: DrawingContext::new(),
                overlay: ToolOverlay::default(),
            }
        }

        fn cx(&mut self) -> ToolCtx<'_> {
            ToolCtx {
                doc: &mut self.doc,
                history: &mut self.history,
                draw: &mut self.draw,
                overlay: &mut self.overlay,
                // pixel-art zoom; keeps the border grab band at one document
                // pixel so interaction tests can press near a selection
                zoom: 5.0,
            }
        }
    }

    fn drag(tool: &mut impl Tool, rig: &mut Rig, from: Point, to: Point, mods: Modifiers) {
        tool.on_press(
            &mut rig.cx(),
            &PointerEvent::press(from, PointerButton::Left).with_mods(mods),
        );
        tool.on_move(
            &mut rig.cx(),
            &PointerEvent::moved(to, PointerButton::Left).with_mods(mods),
        );
        tool.on_release(
            &mut rig.cx(),
            &PointerEvent::release(to, PointerButton::Left).with_mods(mods),
        );
    }

    #[test]
    fn rectangle_drag_selects_and_undoes() {
        let mut rig = Rig::new();
        let mut tool = SelectRectangleTool::new();
        drag(&mut tool, &mut rig, Point::new(2, 2), Point::new(7, 7), Modifiers::empty());
        let sel = rig.doc.selection().unwrap();
        assert!(sel.contains(Point::new(7, 7)));
        assert!(!sel.contains(Point::new(8, 8)));
        assert_eq!(rig.history.undo_depth(), 1);
        rig.history.undo(&mut rig.doc);
        assert!(rig.doc.selection().is_none());
    }

    #[test]
    fn shift_unions_and_ctrl_subtracts() {
        let mut rig = Rig::new();
        let mut tool = SelectRectangleTool::new();
        drag(&mut tool, &mut rig, Point::new(0, 0), Point::new(4, 4), Modifiers::empty());
        drag(&mut tool, &mut rig, Point::new(8, 8), Point::new(12, 12), Modifiers::SHIFT);
        let sel = rig.doc.selection().unwrap();
        assert!(sel.contains(Point::new(1, 1)));
        assert!(sel.contains(Point::new(10, 10)));
        // start the subtract drag away from any selection border
        drag(&mut tool, &mut rig, Point::new(6, 6), Point::new(0, 0), Modifiers::CTRL);
        let sel = rig.doc.selection().unwrap();
        assert!(!sel.contains(Point::new(1, 1)));
        assert!(!sel.contains(Point::new(4, 4)));
        assert!(sel.contains(Point::new(10, 10)));
    }

    #[test]
    fn border_press_drags_selection_body() {
        let mut rig = Rig::new();
        rig.doc
            .set_selection(Some(Selection::from_rect(16, 16, Rect::new(2, 2, 4, 4))));
        let mut tool = SelectRectangleTool::new();
        // press right on the border pixel (2,3), drag 3 to the right
        drag(&mut tool, &mut rig, Point::new(2, 3), Point::new(5, 3), Modifiers::empty());
        let sel = rig.doc.selection().unwrap();
        assert!(sel.contains(Point::new(5, 2)));
        assert!(!sel.contains(Point::new(2, 2)));
        rig.history.undo(&mut rig.doc);
        assert!(rig.doc.selection().unwrap().contains(Point::new(2, 2)));
    }

    #[test]
    fn ellipse_selection_excludes_corner() {
        let mut rig = Rig::new();
        let mut tool = SelectEllipseTool::new();
        drag(&mut tool, &mut rig, Point::new(2, 2), Point::new(10, 10), Modifiers::empty());
        let sel = rig.doc.selection().unwrap();
        assert!(sel.contains(Point::new(6, 6)));
        assert!(!sel.contains(Point::new(2, 2)));
    }

    #[test]
    fn lasso_polygon_closes_on_release() {
        let mut rig = Rig::new();
        let mut tool = SelectLassoTool::new();
        tool.on_press(&mut rig.cx(), &PointerEvent::press(Point::new(1, 1), PointerButton::Left));
        for p in [Point::new(10, 1), Point::new(10, 10), Point::new(1, 10)] {
            tool.on_move(&mut rig.cx(), &PointerEvent::moved(p, PointerButton::Left));
        }
        tool.on_release(
            &mut rig.cx(),
            &PointerEvent::release(Point::new(1, 10), PointerButton::Left),
        );
        let sel = rig.doc.selection().unwrap();
        assert!(sel.contains(Point::new(5, 5)));
        assert!(!sel.contains(Point::new(14, 14)));
    }

    #[test]
    fn lasso_click_picks_by_color() {
        let mut rig = Rig::new();
        rig.doc.active_layer_mut().image.fill(Color::WHITE);
        rig.doc
            .active_layer_mut()
            .image
            .fill_rect(Rect::new(0, 0, 4, 4), Color::BLACK);
        let mut tool = SelectLassoTool::new();
        let p = Point::new(1, 1);
        tool.on_press(&mut rig.cx(), &PointerEvent::press(p, PointerButton::Left));
        tool.on_release(&mut rig.cx(), &PointerEvent::release(p, PointerButton::Left));
        let sel = rig.doc.selection().unwrap();
        assert!(sel.contains(Point::new(3, 3)));
        assert!(!sel.contains(Point::new(8, 8)));
    }

    #[test]
    fn color_tool_contiguous_vs_global() {
        let mut rig = Rig::new();
        rig.doc.active_layer_mut().image.fill(Color::WHITE);
        // two disconnected black squares
        rig.doc
            .active_layer_mut()
            .image
            .fill_rect(Rect::new(0, 0, 2, 2), Color::BLACK);
        rig.doc
            .active_layer_mut()
            .image
            .fill_rect(Rect::new(10, 10, 2, 2), Color::BLACK);
        let mut tool = SelectColorTool::new();
        tool.on_press(&mut rig.cx(), &PointerEvent::press(Point::new(0, 0), PointerButton::Left));
        let sel = rig.doc.selection().unwrap();
        assert!(sel.contains(Point::new(1, 1)));
        assert!(!sel.contains(Point::new(10, 10)), "contiguous pick stays local");

        tool.on_press(
            &mut rig.cx(),
            &PointerEvent::press(Point::new(0, 0), PointerButton::Left).with_mods(Modifiers::CTRL),
        );
        let sel = rig.doc.selection().unwrap();
        assert!(sel.contains(Point::new(10, 10)), "ctrl picks globally");
    }

    #[test]
    fn toolset_routes_by_context_tool() {
        let mut rig = Rig::new();
        rig.draw.set_tool(ToolId::SelectRectangle);
        let mut tools = ToolSet::new();
        let mut cx = ToolCtx {
            doc: &mut rig.doc,
            history: &mut rig.history,
            draw: &mut rig.draw,
            overlay: &mut rig.overlay,
            zoom: 1.0,
        };
        tools.handle_event(&mut cx, &PointerEvent::press(Point::new(0, 0), PointerButton::Left));
        tools.handle_event(&mut cx, &PointerEvent::moved(Point::new(5, 5), PointerButton::Left));
        tools.handle_event(&mut cx, &PointerEvent::release(Point::new(5, 5), PointerButton::Left));
        assert!(rig.doc.selection().is_some());
    }
}
