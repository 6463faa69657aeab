//! Pixel-producing commands: strokes, shapes, fills, and layer clears.
//!
//! Every parameter (color, width, brush, erase flag, mirror flags, selection
//! mask) is baked in at construction. Redo never consults the live drawing
//! context; toggling a mirror between undo and redo must not change the
//! replayed pixels.

use crate::commands::layer_mut;
use crate::snapshot::RegionSnapshot;
use crate::{Applied, Command};
use core_doc::{DocError, Document};
use core_raster::{Color, Mask, Point, Rect};
use core_rasterizer::{
    BrushType, Mirrors, PaintOp, draw_ellipse, draw_rect_outline, fill_rect_solid, flood_fill,
    line_with_brush, runs_bounds, shape_bounds, stamp_brush, stroke_bounds,
};

/// Freehand stroke: the brush stamped along the captured point list. The
/// right-button (eraser) variant carries `erase = true`.
pub struct DrawStroke {
    frame: usize,
    layer: usize,
    points: Vec<Point>,
    color: Color,
    width: u32,
    brush: BrushType,
    erase: bool,
    mirrors: Mirrors,
    selection: Option<Mask>,
    snapshot: Option<RegionSnapshot>,
}

impl DrawStroke {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frame: usize,
        layer: usize,
        points: Vec<Point>,
        color: Color,
        width: u32,
        brush: BrushType,
        erase: bool,
        mirrors: Mirrors,
        selection: Option<Mask>,
    ) -> Self {
        Self {
            frame,
            layer,
            points,
            color,
            width,
            brush,
            erase,
            mirrors,
            selection,
            snapshot: None,
        }
    }

    fn op(&self) -> PaintOp {
        if self.erase {
            PaintOp::Erase
        } else {
            PaintOp::Paint(self.color)
        }
    }
}

impl Command for DrawStroke {
    fn label(&self) -> &'static str {
        if self.erase { "erase stroke" } else { "draw stroke" }
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let (w, h) = (doc.width(), doc.height());
        let Some(bounds) = stroke_bounds(&self.points, self.width, w, h, self.mirrors) else {
            return Ok(Applied::NoOp);
        };
        let op = self.op();
        let image = &mut layer_mut(doc, self.frame, self.layer)?.image;
        if self.snapshot.is_none() {
            self.snapshot = RegionSnapshot::capture(image, bounds);
        }
        let mask = self.selection.as_ref();
        if self.points.len() == 1 {
            stamp_brush(image, self.points[0], self.brush, self.width, op, self.mirrors, mask);
        } else {
            for pair in self.points.windows(2) {
                line_with_brush(
                    image,
                    pair[0],
                    pair[1],
                    self.brush,
                    self.width,
                    op,
                    self.mirrors,
                    mask,
                );
            }
        }
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let (Some(snap), Ok(layer)) =
            (&self.snapshot, layer_mut(doc, self.frame, self.layer))
        {
            snap.restore(&mut layer.image);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Ellipse,
}

/// Rectangle or ellipse dragged between two corners. `filled` fills the
/// rectangle interior instead of stroking the outline.
pub struct Shape {
    frame: usize,
    layer: usize,
    rect: Rect,
    kind: ShapeKind,
    filled: bool,
    color: Color,
    width: u32,
    brush: BrushType,
    mirrors: Mirrors,
    selection: Option<Mask>,
    snapshot: Option<RegionSnapshot>,
}

impl Shape {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        frame: usize,
        layer: usize,
        rect: Rect,
        kind: ShapeKind,
        filled: bool,
        color: Color,
        width: u32,
        brush: BrushType,
        mirrors: Mirrors,
        selection: Option<Mask>,
    ) -> Self {
        Self {
            frame,
            layer,
            rect,
            kind,
            filled,
            color,
            width,
            brush,
            mirrors,
            selection,
            snapshot: None,
        }
    }
}

impl Command for Shape {
    fn label(&self) -> &'static str {
        match self.kind {
            ShapeKind::Rectangle => "draw rectangle",
            ShapeKind::Ellipse => "draw ellipse",
        }
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let (w, h) = (doc.width(), doc.height());
        let Some(bounds) = shape_bounds(self.rect, self.width, w, h, self.mirrors) else {
            return Ok(Applied::NoOp);
        };
        let image = &mut layer_mut(doc, self.frame, self.layer)?.image;
        if self.snapshot.is_none() {
            self.snapshot = RegionSnapshot::capture(image, bounds);
        }
        let op = PaintOp::Paint(self.color);
        let mask = self.selection.as_ref();
        match (self.kind, self.filled) {
            (ShapeKind::Rectangle, true) => {
                fill_rect_solid(image, self.rect, op, self.mirrors, mask)
            }
            (ShapeKind::Rectangle, false) => draw_rect_outline(
                image,
                self.rect,
                self.brush,
                self.width,
                op,
                self.mirrors,
                mask,
            ),
            (ShapeKind::Ellipse, _) => draw_ellipse(
                image,
                self.rect,
                self.brush,
                self.width,
                op,
                self.mirrors,
                mask,
            ),
        }
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let (Some(snap), Ok(layer)) =
            (&self.snapshot, layer_mut(doc, self.frame, self.layer))
        {
            snap.restore(&mut layer.image);
        }
    }
}

/// Bucket fill from a seed point (plus its mirror seeds). The snapshot covers
/// the bounding rect of the modified row-runs; a fill that changes nothing
/// reports `NoOp` and is never recorded.
pub struct Fill {
    frame: usize,
    layer: usize,
    seed: Point,
    color: Color,
    mirrors: Mirrors,
    selection: Option<Mask>,
    snapshot: Option<RegionSnapshot>,
}

impl Fill {
    pub fn new(
        frame: usize,
        layer: usize,
        seed: Point,
        color: Color,
        mirrors: Mirrors,
        selection: Option<Mask>,
    ) -> Self {
        Self {
            frame,
            layer,
            seed,
            color,
            mirrors,
            selection,
            snapshot: None,
        }
    }
}

impl Command for Fill {
    fn label(&self) -> &'static str {
        "bucket fill"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let (w, h) = (doc.width(), doc.height());
        let seeds = self.mirrors.reflections(self.seed, w, h);
        let first_run = self.snapshot.is_none();
        let image = &mut layer_mut(doc, self.frame, self.layer)?.image;
        // Full pre-image so the snapshot can be cropped to the touched region
        // once the runs are known.
        let before = first_run.then(|| image.clone());
        let mask = self.selection.as_ref();
        let mut runs = Vec::new();
        for seed in seeds {
            runs.extend(flood_fill(image, seed, self.color, mask));
        }
        if first_run {
            let Some(bounds) = runs_bounds(&runs) else {
                return Ok(Applied::NoOp);
            };
            let before = before.expect("captured on first run");
            self.snapshot = RegionSnapshot::capture(&before, bounds);
        }
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let (Some(snap), Ok(layer)) =
            (&self.snapshot, layer_mut(doc, self.frame, self.layer))
        {
            snap.restore(&mut layer.image);
        }
    }
}

/// Fill the layer (or the selected region of it) with transparency.
pub struct ClearLayer {
    frame: usize,
    layer: usize,
    selection: Option<Mask>,
    snapshot: Option<RegionSnapshot>,
}

impl ClearLayer {
    pub fn new(frame: usize, layer: usize, selection: Option<Mask>) -> Self {
        Self {
            frame,
            layer,
            selection,
            snapshot: None,
        }
    }
}

impl Command for ClearLayer {
    fn label(&self) -> &'static str {
        "clear layer"
    }

    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
        let layer = layer_mut(doc, self.frame, self.layer)?;
        if self.snapshot.is_none() {
            let bounds = self
                .selection
                .as_ref()
                .and_then(|m| m.bounding_rect())
                .unwrap_or(layer.image.bounds());
            self.snapshot = RegionSnapshot::capture(&layer.image, bounds);
        }
        layer.clear(self.selection.as_ref());
        Ok(Applied::Changed)
    }

    fn undo(&mut self, doc: &mut Document) {
        if let (Some(snap), Ok(layer)) =
            (&self.snapshot, layer_mut(doc, self.frame, self.layer))
        {
            snap.restore(&mut layer.image);
        }
    }
}
