//! 1-bit per pixel region mask.
//!
//! The mask is the canonical answer to "is this pixel inside the selection".
//! Selection authoring (rects, ellipses, lassos, color picks) rasterizes into
//! one of these; the rasterizer clips against it per pixel.
//!
//! Bits are packed eight per byte over the flat `y * width + x` index. Bits
//! past `width * height` in the final byte are kept zero by every mutating
//! method, which lets the set algebra and emptiness test run whole bytes.

use crate::geom::{Point, Rect};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Mask {
    /// All-clear mask. `width` and `height` must be nonzero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "mask dimensions must be nonzero");
        let len = (width as usize * height as usize).div_ceil(8);
        Self {
            width,
            height,
            bits: vec![0u8; len],
        }
    }

    /// All-set mask.
    pub fn full(width: u32, height: u32) -> Self {
        let mut m = Self::new(width, height);
        m.bits.fill(0xff);
        m.clear_tail();
        m
    }

    /// Build from a membership predicate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(i32, i32) -> bool) -> Self {
        let mut m = Self::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                if f(x, y) {
                    m.set(x, y, true);
                }
            }
        }
        m
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        Some((idx >> 3, 1u8 << (idx & 7)))
    }

    /// Membership test; out-of-bounds is outside.
    pub fn get(&self, x: i32, y: i32) -> bool {
        match self.index(x, y) {
            Some((byte, bit)) => self.bits[byte] & bit != 0,
            None => false,
        }
    }

    /// Set or clear one bit. Out-of-bounds writes are dropped.
    pub fn set(&mut self, x: i32, y: i32, on: bool) {
        if let Some((byte, bit)) = self.index(x, y) {
            if on {
                self.bits[byte] |= bit;
            } else {
                self.bits[byte] &= !bit;
            }
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.get(p.x, p.y)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    pub fn count(&self) -> u64 {
        self.bits.iter().map(|b| b.count_ones() as u64).sum()
    }

    fn assert_same_dims(&self, other: &Mask) {
        debug_assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "mask algebra requires equal dimensions"
        );
    }

    pub fn union_with(&mut self, other: &Mask) {
        self.assert_same_dims(other);
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a |= b;
        }
    }

    pub fn intersect_with(&mut self, other: &Mask) {
        self.assert_same_dims(other);
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a &= b;
        }
    }

    pub fn subtract(&mut self, other: &Mask) {
        self.assert_same_dims(other);
        for (a, b) in self.bits.iter_mut().zip(&other.bits) {
            *a &= !b;
        }
    }

    pub fn invert(&mut self) {
        for b in &mut self.bits {
            *b = !*b;
        }
        self.clear_tail();
    }

    /// Shifted copy; pixels leaving the canvas are dropped, pixels entering
    /// are clear.
    pub fn translated(&self, dx: i32, dy: i32) -> Mask {
        let mut out = Mask::new(self.width, self.height);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if self.get(x, y) {
                    out.set(x + dx, y + dy, true);
                }
            }
        }
        out
    }

    /// Tight bounding rect of the set bits, `None` when empty.
    pub fn bounding_rect(&self) -> Option<Rect> {
        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                if self.get(x, y) {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if min_x == i32::MAX {
            return None;
        }
        Some(Rect::new(
            min_x,
            min_y,
            (max_x - min_x) as u32 + 1,
            (max_y - min_y) as u32 + 1,
        ))
    }

    /// True when the pixel is set and at least one 4-neighbor is clear (or
    /// off-canvas). The set of such pixels is the region's border.
    pub fn is_border(&self, x: i32, y: i32) -> bool {
        self.get(x, y)
            && (!self.get(x - 1, y) || !self.get(x + 1, y) || !self.get(x, y - 1) || !self.get(x, y + 1))
    }

    fn clear_tail(&mut self) {
        let used = self.width as usize * self.height as usize;
        let rem = used & 7;
        if rem != 0
            && let Some(last) = self.bits.last_mut()
        {
            *last &= (1u8 << rem) - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_bounds() {
        let mut m = Mask::new(5, 4);
        assert!(m.is_empty());
        m.set(2, 1, true);
        m.set(4, 3, true);
        assert!(m.get(2, 1));
        assert!(!m.get(3, 1));
        assert!(!m.get(-1, 0));
        assert_eq!(m.bounding_rect(), Some(Rect::new(2, 1, 3, 3)));
        assert_eq!(m.count(), 2);
    }

    #[test]
    fn full_and_invert_keep_tail_clean() {
        // 5*3 = 15 bits: one partial byte at the tail.
        let full = Mask::full(5, 3);
        assert_eq!(full.count(), 15);
        let mut inv = full.clone();
        inv.invert();
        assert!(inv.is_empty());
        inv.invert();
        assert_eq!(inv, full);
    }

    #[test]
    fn algebra() {
        let mut a = Mask::from_fn(4, 4, |x, _| x < 2);
        let b = Mask::from_fn(4, 4, |_, y| y < 2);
        let mut u = a.clone();
        u.union_with(&b);
        assert_eq!(u.count(), 12);
        let mut i = a.clone();
        i.intersect_with(&b);
        assert_eq!(i.count(), 4);
        a.subtract(&b);
        assert_eq!(a.count(), 4);
        assert!(a.get(0, 2) && !a.get(0, 0));
    }

    #[test]
    fn translate_clips() {
        let m = Mask::from_fn(3, 3, |x, y| x == 2 && y == 2);
        let t = m.translated(1, 1);
        assert!(t.is_empty());
        let t2 = m.translated(-2, -2);
        assert!(t2.get(0, 0));
        assert_eq!(t2.count(), 1);
    }

    #[test]
    fn border_of_solid_block() {
        let m = Mask::from_fn(5, 5, |x, y| (1..4).contains(&x) && (1..4).contains(&y));
        assert!(m.is_border(1, 1));
        assert!(m.is_border(3, 2));
        assert!(!m.is_border(2, 2));
        assert!(!m.is_border(0, 0));
    }
}
