//! Rectangle and ellipse scan conversion.

use crate::{BrushType, Mirrors, PaintOp, line_with_brush, stamp_brush};
use core_raster::{Mask, Point, Rect, RasterBuffer};

/// Stroke the four edges of `rect` with the brush. Corners are stamped by two
/// edges; with an opaque pen that is idempotent.
pub fn draw_rect_outline(
    buf: &mut RasterBuffer,
    rect: Rect,
    brush: BrushType,
    width: u32,
    op: PaintOp,
    mirrors: Mirrors,
    mask: Option<&Mask>,
) {
    if rect.is_empty() {
        return;
    }
    let tl = Point::new(rect.x, rect.y);
    let tr = Point::new(rect.right() - 1, rect.y);
    let br = Point::new(rect.right() - 1, rect.bottom() - 1);
    let bl = Point::new(rect.x, rect.bottom() - 1);
    for (a, b) in [(tl, tr), (tr, br), (br, bl), (bl, tl)] {
        line_with_brush(buf, a, b, brush, width, op, mirrors, mask);
    }
}

/// Solid block fill of `rect`'s interior.
pub fn fill_rect_solid(
    buf: &mut RasterBuffer,
    rect: Rect,
    op: PaintOp,
    mirrors: Mirrors,
    mask: Option<&Mask>,
) {
    for r in mirror_rects(rect, mirrors, buf.width(), buf.height()) {
        let Some(r) = r.clipped(buf.width(), buf.height()) else {
            continue;
        };
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                if let Some(m) = mask
                    && !m.get(x, y)
                {
                    continue;
                }
                match op {
                    PaintOp::Paint(c) => buf.blend_pixel(x, y, c),
                    PaintOp::Erase => buf.set_pixel(x, y, core_raster::Color::TRANSPARENT),
                }
            }
        }
    }
}

fn mirror_rects(rect: Rect, mirrors: Mirrors, w: u32, h: u32) -> Vec<Rect> {
    let rx = |r: Rect| Rect::new(w as i32 - r.x - r.w as i32, r.y, r.w, r.h);
    let ry = |r: Rect| Rect::new(r.x, h as i32 - r.y - r.h as i32, r.w, r.h);
    let mut out = vec![rect];
    let mut push = |r: Rect| {
        if !out.contains(&r) {
            out.push(r);
        }
    };
    if mirrors.x {
        push(rx(rect));
    }
    if mirrors.y {
        push(ry(rect));
    }
    if mirrors.x && mirrors.y {
        push(ry(rx(rect)));
    }
    out
}

/// Stamp an ellipse outline inscribed in `rect`.
///
/// Two symmetric parametric passes: for every column `x` stamp at
/// `cy ± ry·√(1-((x-cx)/rx)²)`, then the same over rows. Center and radii are
/// taken at half-pixel precision from the inclusive rect so the outline is
/// symmetric regardless of drag direction. A rect degenerate in either axis
/// falls back to a line.
pub fn draw_ellipse(
    buf: &mut RasterBuffer,
    rect: Rect,
    brush: BrushType,
    width: u32,
    op: PaintOp,
    mirrors: Mirrors,
    mask: Option<&Mask>,
) {
    if rect.is_empty() {
        return;
    }
    let rx = (rect.w as f64 - 1.0) / 2.0;
    let ry = (rect.h as f64 - 1.0) / 2.0;
    if rx == 0.0 || ry == 0.0 {
        let tl = Point::new(rect.x, rect.y);
        let br = Point::new(rect.right() - 1, rect.bottom() - 1);
        line_with_brush(buf, tl, br, brush, width, op, mirrors, mask);
        return;
    }
    let cx = rect.x as f64 + rx;
    let cy = rect.y as f64 + ry;

    for x in rect.x..rect.right() {
        let t = (x as f64 - cx) / rx;
        let dy = ry * (1.0 - t * t).max(0.0).sqrt();
        for y in [cy - dy, cy + dy] {
            stamp_brush(
                buf,
                Point::new(x, y.round() as i32),
                brush,
                width,
                op,
                mirrors,
                mask,
            );
        }
    }
    for y in rect.y..rect.bottom() {
        let t = (y as f64 - cy) / ry;
        let dx = rx * (1.0 - t * t).max(0.0).sqrt();
        for x in [cx - dx, cx + dx] {
            stamp_brush(
                buf,
                Point::new(x.round() as i32, y),
                brush,
                width,
                op,
                mirrors,
                mask,
            );
        }
    }
}

/// Bounding rect a shape command can touch: the shape rect (and reflections)
/// inflated by the pen width plus one pixel, clipped to the document.
pub fn shape_bounds(rect: Rect, pen_width: u32, doc_w: u32, doc_h: u32, mirrors: Mirrors) -> Option<Rect> {
    mirrors
        .reflect_rect(rect, doc_w, doc_h)
        .inflated(pen_width as i32 + 1)
        .clipped(doc_w, doc_h)
}
