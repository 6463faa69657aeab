//! Deterministic nearest-neighbor scan conversion.
//!
//! Every drawing tool funnels through the primitives here: a brush stamp, a
//! DDA line of stamps, rectangle and ellipse outlines, solid fills, and a
//! 4-connected flood fill. All of them:
//!
//! * take integer document coordinates and never anti-alias;
//! * optionally clip per pixel against a selection [`Mask`];
//! * optionally replicate each stamp across the document's mirror axes;
//! * produce identical pixels for identical inputs, so command replay and
//!   golden-image tests are exact.
//!
//! The mirror replication happens once per stamp, on the anchor point, which
//! makes a mirrored stroke byte-identical to stamping the reflected points
//! directly.

use core_raster::{Color, Mask, Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod fill;
pub mod shapes;

pub use fill::{RowRun, flood_fill, runs_bounds};
pub use shapes::{draw_ellipse, draw_rect_outline, fill_rect_solid, shape_bounds};

use core_raster::RasterBuffer;

/// Brush footprint selected in the drawing context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushType {
    #[default]
    Square,
    Circular,
}

/// Which document mirror axes are active for a stamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirrors {
    pub x: bool,
    pub y: bool,
}

impl Mirrors {
    pub const NONE: Mirrors = Mirrors { x: false, y: false };

    pub fn new(x: bool, y: bool) -> Self {
        Self { x, y }
    }

    pub fn any(self) -> bool {
        self.x || self.y
    }

    /// The anchor plus its enabled reflections inside a `w` by `h` document,
    /// deduplicated (a point on the mirror axis reflects onto itself).
    pub fn reflections(self, p: Point, w: u32, h: u32) -> SmallVec<[Point; 4]> {
        let mut out: SmallVec<[Point; 4]> = SmallVec::new();
        let mut push = |q: Point| {
            if !out.contains(&q) {
                out.push(q);
            }
        };
        push(p);
        if self.x {
            push(Point::new(w as i32 - 1 - p.x, p.y));
        }
        if self.y {
            push(Point::new(p.x, h as i32 - 1 - p.y));
        }
        if self.x && self.y {
            push(Point::new(w as i32 - 1 - p.x, h as i32 - 1 - p.y));
        }
        out
    }

    /// Union of `rect` and its enabled reflections.
    pub fn reflect_rect(self, rect: Rect, w: u32, h: u32) -> Rect {
        let mut out = rect;
        let rx = |r: Rect| Rect::new(w as i32 - r.x - r.w as i32, r.y, r.w, r.h);
        let ry = |r: Rect| Rect::new(r.x, h as i32 - r.y - r.h as i32, r.w, r.h);
        if self.x {
            out = out.united(rx(rect));
        }
        if self.y {
            out = out.united(ry(rect));
        }
        if self.x && self.y {
            out = out.united(ry(rx(rect)));
        }
        out
    }
}

/// What a stamp writes: pen color via source-over, or transparency for the
/// eraser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintOp {
    Paint(Color),
    Erase,
}

impl PaintOp {
    #[inline]
    fn apply(self, buf: &mut RasterBuffer, x: i32, y: i32) {
        match self {
            PaintOp::Paint(c) => buf.blend_pixel(x, y, c),
            PaintOp::Erase => buf.set_pixel(x, y, Color::TRANSPARENT),
        }
    }
}

/// Integer offsets the brush covers around its anchor.
///
/// Square width `w` is the `w`×`w` block whose top-left sits at
/// `(-(w/2), -(w/2))`; circular width `w` is every offset with
/// `dx² + dy² ≤ (w/2)²`. Width 1 of either shape is the single anchor pixel.
pub fn brush_offsets(brush: BrushType, width: u32) -> Vec<(i32, i32)> {
    let w = width.max(1) as i32;
    match brush {
        BrushType::Square => {
            let o = w / 2;
            let mut out = Vec::with_capacity((w * w) as usize);
            for dy in -o..w - o {
                for dx in -o..w - o {
                    out.push((dx, dy));
                }
            }
            out
        }
        BrushType::Circular => {
            let r = w as f64 / 2.0;
            let r2 = r * r;
            let reach = w / 2;
            let mut out = Vec::new();
            for dy in -reach..=reach {
                for dx in -reach..=reach {
                    if (dx * dx + dy * dy) as f64 <= r2 {
                        out.push((dx, dy));
                    }
                }
            }
            out
        }
    }
}

/// Stamp the brush at `anchor` (and its mirror reflections), clipped to the
/// buffer and, when present, to `mask`.
pub fn stamp_brush(
    buf: &mut RasterBuffer,
    anchor: Point,
    brush: BrushType,
    width: u32,
    op: PaintOp,
    mirrors: Mirrors,
    mask: Option<&Mask>,
) {
    let offsets = brush_offsets(brush, width);
    stamp_offsets(buf, anchor, &offsets, op, mirrors, mask);
}

fn stamp_offsets(
    buf: &mut RasterBuffer,
    anchor: Point,
    offsets: &[(i32, i32)],
    op: PaintOp,
    mirrors: Mirrors,
    mask: Option<&Mask>,
) {
    for p in mirrors.reflections(anchor, buf.width(), buf.height()) {
        for &(dx, dy) in offsets {
            let (x, y) = (p.x + dx, p.y + dy);
            if let Some(m) = mask
                && !m.get(x, y)
            {
                continue;
            }
            op.apply(buf, x, y);
        }
    }
}

/// Stamp the brush along the line from `p1` to `p2` (both endpoints included)
/// using DDA stepping with `steps = max(|Δx|, |Δy|)`. A degenerate line
/// stamps once.
pub fn line_with_brush(
    buf: &mut RasterBuffer,
    p1: Point,
    p2: Point,
    brush: BrushType,
    width: u32,
    op: PaintOp,
    mirrors: Mirrors,
    mask: Option<&Mask>,
) {
    let offsets = brush_offsets(brush, width);
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        stamp_offsets(buf, p1, &offsets, op, mirrors, mask);
        return;
    }
    let x_inc = dx as f64 / steps as f64;
    let y_inc = dy as f64 / steps as f64;
    let mut x = p1.x as f64;
    let mut y = p1.y as f64;
    for _ in 0..=steps {
        let p = Point::new(x.round() as i32, y.round() as i32);
        stamp_offsets(buf, p, &offsets, op, mirrors, mask);
        x += x_inc;
        y += y_inc;
    }
}

/// Bounding rect a brush stroke can touch: the AABB of the points (and their
/// mirror reflections) inflated by the brush width plus a one pixel margin,
/// clipped to the document. `None` when the stroke lies entirely off-canvas.
pub fn stroke_bounds(
    points: &[Point],
    brush_width: u32,
    doc_w: u32,
    doc_h: u32,
    mirrors: Mirrors,
) -> Option<Rect> {
    let first = points.first()?;
    let mut aabb = Rect::new(first.x, first.y, 1, 1);
    for p in &points[1..] {
        aabb = aabb.united(Rect::new(p.x, p.y, 1, 1));
    }
    let aabb = mirrors.reflect_rect(aabb, doc_w, doc_h);
    aabb.inflated(brush_width as i32 + 1).clipped(doc_w, doc_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(w: u32, h: u32) -> RasterBuffer {
        RasterBuffer::new(w, h)
    }

    fn set_pixels(b: &RasterBuffer) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..b.height() as i32 {
            for x in 0..b.width() as i32 {
                if b.pixel(x, y).is_some_and(|c| !c.is_transparent()) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn square_brush_geometry() {
        assert_eq!(brush_offsets(BrushType::Square, 1), vec![(0, 0)]);
        let w3: Vec<_> = brush_offsets(BrushType::Square, 3);
        assert_eq!(w3.len(), 9);
        assert!(w3.contains(&(-1, -1)) && w3.contains(&(1, 1)));
        // Even widths bias toward the bottom-right of the anchor.
        let w2: Vec<_> = brush_offsets(BrushType::Square, 2);
        assert_eq!(w2, vec![(-1, -1), (0, -1), (-1, 0), (0, 0)]);
    }

    #[test]
    fn circular_brush_geometry() {
        assert_eq!(brush_offsets(BrushType::Circular, 1), vec![(0, 0)]);
        let w3 = brush_offsets(BrushType::Circular, 3);
        // r = 1.5 keeps the full 3x3 block (corner distance 2 <= 2.25).
        assert_eq!(w3.len(), 9);
        let w2 = brush_offsets(BrushType::Circular, 2);
        assert_eq!(w2.len(), 5);
        assert!(!w2.contains(&(-1, -1)));
    }

    #[test]
    fn corner_stamp_clips_to_canvas() {
        let mut b = buf(10, 10);
        stamp_brush(
            &mut b,
            Point::new(0, 0),
            BrushType::Square,
            3,
            PaintOp::Paint(Color::BLACK),
            Mirrors::NONE,
            None,
        );
        assert_eq!(set_pixels(&b), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn line_is_dda_with_both_endpoints() {
        let mut b = buf(10, 10);
        line_with_brush(
            &mut b,
            Point::new(2, 2),
            Point::new(7, 7),
            BrushType::Square,
            1,
            PaintOp::Paint(Color::BLACK),
            Mirrors::NONE,
            None,
        );
        let px = set_pixels(&b);
        assert_eq!(px, vec![(2, 2), (3, 3), (4, 4), (5, 5), (6, 6), (7, 7)]);
    }

    #[test]
    fn degenerate_line_stamps_once() {
        let mut b = buf(5, 5);
        line_with_brush(
            &mut b,
            Point::new(2, 2),
            Point::new(2, 2),
            BrushType::Square,
            1,
            PaintOp::Paint(Color::rgba(0, 0, 0, 128)),
            Mirrors::NONE,
            None,
        );
        // A single stamp of a half-alpha color: alpha must not double up.
        assert_eq!(b.pixel(2, 2).unwrap().a, 128);
    }

    #[test]
    fn mirror_x_replicates_stamp() {
        let mut b = buf(20, 20);
        stamp_brush(
            &mut b,
            Point::new(5, 5),
            BrushType::Square,
            1,
            PaintOp::Paint(Color::BLACK),
            Mirrors::new(true, false),
            None,
        );
        assert_eq!(set_pixels(&b), vec![(5, 5), (14, 5)]);
    }

    #[test]
    fn mirror_both_replicates_four_ways() {
        let mut b = buf(8, 8);
        stamp_brush(
            &mut b,
            Point::new(1, 2),
            BrushType::Square,
            1,
            PaintOp::Paint(Color::BLACK),
            Mirrors::new(true, true),
            None,
        );
        assert_eq!(set_pixels(&b), vec![(1, 2), (6, 2), (1, 5), (6, 5)]);
    }

    #[test]
    fn axis_point_mirrors_without_double_blend() {
        // Width 9 canvas: x = 4 is its own reflection. A half-alpha stamp must
        // not blend twice onto the axis pixel.
        let mut b = buf(9, 9);
        stamp_brush(
            &mut b,
            Point::new(4, 4),
            BrushType::Square,
            1,
            PaintOp::Paint(Color::rgba(0, 0, 0, 100)),
            Mirrors::new(true, true),
            None,
        );
        assert_eq!(b.pixel(4, 4).unwrap().a, 100);
    }

    #[test]
    fn mask_clips_per_pixel() {
        let mut b = buf(10, 10);
        let mask = Mask::from_fn(10, 10, |x, _| x >= 5);
        line_with_brush(
            &mut b,
            Point::new(0, 3),
            Point::new(9, 3),
            BrushType::Square,
            1,
            PaintOp::Paint(Color::BLACK),
            Mirrors::NONE,
            Some(&mask),
        );
        assert_eq!(
            set_pixels(&b),
            vec![(5, 3), (6, 3), (7, 3), (8, 3), (9, 3)]
        );
    }

    #[test]
    fn erase_op_writes_transparent() {
        let mut b = RasterBuffer::filled(5, 5, Color::WHITE);
        stamp_brush(
            &mut b,
            Point::new(2, 2),
            BrushType::Square,
            3,
            PaintOp::Erase,
            Mirrors::NONE,
            None,
        );
        assert!(b.pixel(2, 2).unwrap().is_transparent());
        assert_eq!(b.pixel(0, 0), Some(Color::WHITE));
    }

    #[test]
    fn stroke_bounds_inflates_and_clips() {
        let r = stroke_bounds(
            &[Point::new(2, 2), Point::new(7, 7)],
            3,
            10,
            10,
            Mirrors::NONE,
        )
        .unwrap();
        // AABB (2,2)-(7,7) inflated by 3+1, clipped to 10x10.
        assert_eq!(r, Rect::new(0, 0, 10, 10));

        let tight = stroke_bounds(&[Point::new(5, 5)], 1, 64, 64, Mirrors::NONE).unwrap();
        assert_eq!(tight, Rect::new(3, 3, 5, 5));
    }

    #[test]
    fn stroke_bounds_cover_mirrored_side() {
        let r = stroke_bounds(&[Point::new(1, 1)], 1, 20, 20, Mirrors::new(true, false)).unwrap();
        assert!(r.contains(Point::new(18, 1)));
        assert!(r.contains(Point::new(1, 1)));
    }

    #[test]
    fn offcanvas_stroke_has_no_bounds() {
        assert_eq!(
            stroke_bounds(&[Point::new(-50, -50)], 1, 10, 10, Mirrors::NONE),
            None
        );
        assert_eq!(stroke_bounds(&[], 1, 10, 10, Mirrors::NONE), None);
    }
}
