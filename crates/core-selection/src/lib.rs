//! Selection regions over the pixel grid.
//!
//! A [`Selection`] is an arbitrary set of pixels inside one document. Tools
//! author selections from shapes (rects, ellipses, lasso polygons) or from
//! sampled colors; the selection then participates in region algebra (union /
//! subtract / intersect / invert) and clips every drawing operation.
//!
//! Representation: every authoring shape is rasterized immediately into the
//! canonical 1-bit [`Mask`], which is the single source of truth for pixel
//! membership — the path form exists only transiently in the constructors, so
//! "path and mask agree" holds by construction and [`Selection::simplified`]
//! is the identity. All constructors and mutators clip to
//! `[0,W)×[0,H)`; a selection can never reference pixels outside its
//! document.
//!
//! Invariants:
//! * `is_empty() ⇔ covers no pixel`.
//! * Mask dimensions always equal the owning document's dimensions; algebra
//!   between selections of different documents is a logic error (debug
//!   asserted).

use core_raster::{Mask, Point, Rect, RasterBuffer};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    mask: Mask,
}

impl Selection {
    /// Empty selection for a `w` by `h` document.
    pub fn empty(w: u32, h: u32) -> Self {
        Self { mask: Mask::new(w, h) }
    }

    /// The whole canvas ("select all").
    pub fn all(w: u32, h: u32) -> Self {
        Self { mask: Mask::full(w, h) }
    }

    /// Every pixel of `rect`, clipped to the canvas.
    pub fn from_rect(w: u32, h: u32, rect: Rect) -> Self {
        let mut mask = Mask::new(w, h);
        if let Some(r) = rect.clipped(w, h) {
            for y in r.y..r.bottom() {
                for x in r.x..r.right() {
                    mask.set(x, y, true);
                }
            }
        }
        Self { mask }
    }

    /// Pixels inside the ellipse inscribed in `rect`, clipped to the canvas.
    /// Membership is `((x-cx)/rx)² + ((y-cy)/ry)² ≤ 1` with the center and
    /// radii at half-pixel precision.
    pub fn from_ellipse(w: u32, h: u32, rect: Rect) -> Self {
        if rect.is_empty() {
            return Self::empty(w, h);
        }
        let cx = rect.x as f64 + (rect.w as f64 - 1.0) / 2.0;
        let cy = rect.y as f64 + (rect.h as f64 - 1.0) / 2.0;
        let rx = rect.w as f64 / 2.0;
        let ry = rect.h as f64 / 2.0;
        let mask = Mask::from_fn(w, h, |x, y| {
            if !rect.contains(Point::new(x, y)) {
                return false;
            }
            let tx = (x as f64 - cx) / rx;
            let ty = (y as f64 - cy) / ry;
            tx * tx + ty * ty <= 1.0
        });
        Self { mask }
    }

    /// Interior of a closed polygon (even-odd rule, tested at pixel centers),
    /// clipped to the canvas. The final edge back to the first vertex is
    /// implicit, matching a lasso that closes its subpath on release.
    pub fn from_polygon(w: u32, h: u32, vertices: &[Point]) -> Self {
        if vertices.len() < 3 {
            return Self::empty(w, h);
        }
        let mut mask = Mask::new(w, h);
        let min_y = vertices.iter().map(|p| p.y).min().unwrap_or(0).max(0);
        let max_y = vertices
            .iter()
            .map(|p| p.y)
            .max()
            .unwrap_or(0)
            .min(h as i32 - 1);
        for y in min_y..=max_y {
            let scan = y as f64 + 0.5;
            let mut xs: Vec<f64> = Vec::new();
            for i in 0..vertices.len() {
                let a = vertices[i];
                let b = vertices[(i + 1) % vertices.len()];
                let (ay, by) = (a.y as f64 + 0.5, b.y as f64 + 0.5);
                if (ay <= scan && by > scan) || (by <= scan && ay > scan) {
                    let t = (scan - ay) / (by - ay);
                    xs.push(a.x as f64 + 0.5 + t * ((b.x - a.x) as f64));
                }
            }
            xs.sort_by(|p, q| p.partial_cmp(q).expect("finite intersections"));
            for pair in xs.chunks_exact(2) {
                // pixel is inside when its center x + 0.5 lies in [pair0, pair1)
                let x0 = (pair[0] - 0.5).ceil() as i32;
                let x1 = (pair[1] - 0.5).ceil() as i32 - 1;
                for x in x0.max(0)..=x1.min(w as i32 - 1) {
                    if (x as f64 + 0.5) >= pair[0] && (x as f64 + 0.5) < pair[1] {
                        mask.set(x, y, true);
                    }
                }
            }
        }
        Self { mask }
    }

    /// Selection of every pixel whose color equals the color under `seed` in
    /// `image`. `contiguous` restricts to the 4-connected region around the
    /// seed. `None` when the seed is off-canvas.
    pub fn from_color(image: &RasterBuffer, seed: Point, contiguous: bool) -> Option<Self> {
        let target = image.pixel(seed.x, seed.y)?;
        let (w, h) = (image.width(), image.height());
        let mut mask = Mask::new(w, h);
        if contiguous {
            let mut visited = Mask::new(w, h);
            let mut queue = VecDeque::new();
            queue.push_back(seed);
            while let Some(p) = queue.pop_front() {
                if !image.in_bounds(p.x, p.y) || visited.get(p.x, p.y) {
                    continue;
                }
                visited.set(p.x, p.y, true);
                if image.pixel(p.x, p.y) != Some(target) {
                    continue;
                }
                mask.set(p.x, p.y, true);
                queue.push_back(Point::new(p.x + 1, p.y));
                queue.push_back(Point::new(p.x - 1, p.y));
                queue.push_back(Point::new(p.x, p.y + 1));
                queue.push_back(Point::new(p.x, p.y - 1));
            }
        } else {
            for y in 0..h as i32 {
                for x in 0..w as i32 {
                    if image.pixel(x, y) == Some(target) {
                        mask.set(x, y, true);
                    }
                }
            }
        }
        trace!(target: "selection", contiguous, pixels = mask.count(), "from_color");
        Some(Self { mask })
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn contains(&self, p: Point) -> bool {
        self.mask.contains(p)
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        self.mask.bounding_rect()
    }

    /// The clipping mask — the canonical pixel-membership form.
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn into_mask(self) -> Mask {
        self.mask
    }

    /// Canonical form. The mask representation is already canonical, so this
    /// is the identity; it exists so call sites read the same as with a
    /// path-set implementation.
    pub fn simplified(self) -> Self {
        self
    }

    pub fn union(mut self, other: &Selection) -> Self {
        self.mask.union_with(&other.mask);
        self
    }

    pub fn subtract(mut self, other: &Selection) -> Self {
        self.mask.subtract(&other.mask);
        self
    }

    pub fn intersect(mut self, other: &Selection) -> Self {
        self.mask.intersect_with(&other.mask);
        self
    }

    /// Complement within the document bounds.
    pub fn invert(mut self) -> Self {
        self.mask.invert();
        self
    }

    /// Shifted copy; pixels leaving the canvas are dropped.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self { mask: self.mask.translated(dx, dy) }
    }

    /// True when `p` lies within `tolerance` (Euclidean, document units) of
    /// the selection's border. Tools divide their hit width by the view zoom
    /// before calling, so the grab band stays constant on screen.
    pub fn on_border(&self, p: Point, tolerance: f64) -> bool {
        if tolerance < 0.0 {
            return false;
        }
        let reach = tolerance.ceil() as i32;
        let t2 = tolerance * tolerance;
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let (x, y) = (p.x + dx, p.y + dy);
                if (dx * dx + dy * dy) as f64 <= t2 && self.mask.is_border(x, y) {
                    return true;
                }
            }
        }
        false
    }
}
