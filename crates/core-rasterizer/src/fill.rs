//! 4-connected flood fill.

use core_raster::{Color, Mask, Point, Rect, RasterBuffer};
use std::collections::VecDeque;
use tracing::trace;

/// A horizontal run of modified pixels, `x0..=x1` on row `y`. Commands use the
/// runs to capture a tight undo snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRun {
    pub y: i32,
    pub x0: i32,
    pub x1: i32,
}

impl RowRun {
    pub fn rect(self) -> Rect {
        Rect::new(self.x0, self.y, (self.x1 - self.x0) as u32 + 1, 1)
    }
}

/// Bounding rect of a run set, `None` when empty.
pub fn runs_bounds(runs: &[RowRun]) -> Option<Rect> {
    let mut it = runs.iter();
    let first = it.next()?.rect();
    Some(it.fold(first, |acc, r| acc.united(r.rect())))
}

/// Flood-fill `fill` from `seed` over the 4-connected region of the seed's
/// color, constrained to `mask` when present.
///
/// No-ops (returning no runs) when the seed is off-canvas, outside the mask,
/// or already the fill color. The returned runs are sorted by row and cover
/// exactly the modified pixels.
pub fn flood_fill(
    buf: &mut RasterBuffer,
    seed: Point,
    fill: Color,
    mask: Option<&Mask>,
) -> Vec<RowRun> {
    let Some(target) = buf.pixel(seed.x, seed.y) else {
        return Vec::new();
    };
    if let Some(m) = mask
        && !m.contains(seed)
    {
        return Vec::new();
    }
    if target == fill {
        return Vec::new();
    }

    let (w, h) = (buf.width(), buf.height());
    let mut visited = Mask::new(w, h);
    let mut rows: Vec<Vec<i32>> = vec![Vec::new(); h as usize];
    let mut queue = VecDeque::new();
    queue.push_back(seed);

    while let Some(p) = queue.pop_front() {
        if !buf.in_bounds(p.x, p.y) || visited.get(p.x, p.y) {
            continue;
        }
        visited.set(p.x, p.y, true);
        if let Some(m) = mask
            && !m.get(p.x, p.y)
        {
            continue;
        }
        if buf.pixel(p.x, p.y) != Some(target) {
            continue;
        }
        buf.set_pixel(p.x, p.y, fill);
        rows[p.y as usize].push(p.x);
        queue.push_back(Point::new(p.x + 1, p.y));
        queue.push_back(Point::new(p.x - 1, p.y));
        queue.push_back(Point::new(p.x, p.y + 1));
        queue.push_back(Point::new(p.x, p.y - 1));
    }

    let mut runs = Vec::new();
    for (y, mut xs) in rows.into_iter().enumerate() {
        if xs.is_empty() {
            continue;
        }
        xs.sort_unstable();
        let mut start = xs[0];
        let mut end = xs[0];
        for &x in &xs[1..] {
            if x == end + 1 {
                end = x;
                continue;
            }
            runs.push(RowRun { y: y as i32, x0: start, x1: end });
            start = x;
            end = x;
        }
        runs.push(RowRun { y: y as i32, x0: start, x1: end });
    }
    trace!(target: "rasterizer.fill", runs = runs.len(), "flood_fill");
    runs
}
