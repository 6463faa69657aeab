//! RGBA color and the scalar source-over reference blend.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 8-bit sRGB color with straight alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional, case-insensitive).
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        let byte = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        match s.len() {
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// `#rrggbb`, dropping alpha. Palette entries use this form.
    pub fn to_hex_rgb(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `#rrggbbaa`.
    pub fn to_hex_rgba(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    /// Alpha scaled by `opacity` in [0,1], rounded to nearest.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let o = opacity.clamp(0.0, 1.0);
        Self {
            a: (self.a as f32 * o).round() as u8,
            ..self
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_rgba())
    }
}

#[inline]
fn div_round(n: u32, d: u32) -> u32 {
    (n + d / 2) / d
}

/// Porter-Duff "source over" on straight alpha.
///
/// This scalar routine is the reference every compositing path must match
/// byte-for-byte. Arithmetic stays in `u32` with round-to-nearest division:
///
/// ```text
/// p     = sa*255 + da*(255 - sa)          (= alpha_out * 255^2)
/// c_out = (cs*sa*255 + cd*da*(255-sa)) / p
/// a_out = p / 255
/// ```
#[inline]
pub fn source_over(dst: Color, src: Color) -> Color {
    if src.a == 255 {
        return src;
    }
    if src.a == 0 {
        return dst;
    }
    let sa = src.a as u32;
    let da = dst.a as u32;
    let p = sa * 255 + da * (255 - sa);
    if p == 0 {
        return Color::TRANSPARENT;
    }
    let ch = |cs: u8, cd: u8| {
        div_round(cs as u32 * sa * 255 + cd as u32 * da * (255 - sa), p) as u8
    };
    Color {
        r: ch(src.r, dst.r),
        g: ch(src.g, dst.g),
        b: ch(src.b, dst.b),
        a: div_round(p, 255) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hex_round_trip() {
        let c = Color::rgba(0x12, 0xab, 0xff, 0x80);
        assert_eq!(Color::from_hex(&c.to_hex_rgba()), Some(c));
        assert_eq!(Color::from_hex("#12abff"), Some(Color::rgb(0x12, 0xab, 0xff)));
        assert_eq!(Color::from_hex("12abff"), Some(Color::rgb(0x12, 0xab, 0xff)));
        assert_eq!(Color::from_hex("#12ab"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn over_opaque_source_replaces() {
        let d = Color::rgba(10, 20, 30, 200);
        let s = Color::rgb(200, 100, 50);
        assert_eq!(source_over(d, s), s);
    }

    #[test]
    fn over_transparent_source_keeps_dst() {
        let d = Color::rgba(10, 20, 30, 200);
        assert_eq!(source_over(d, Color::TRANSPARENT), d);
    }

    #[test]
    fn over_onto_transparent_keeps_src() {
        let s = Color::rgba(90, 40, 10, 128);
        assert_eq!(source_over(Color::TRANSPARENT, s), s);
    }

    #[test]
    fn half_alpha_over_white() {
        // 50% black over opaque white lands mid-gray, alpha stays opaque.
        let out = source_over(Color::WHITE, Color::rgba(0, 0, 0, 128));
        assert_eq!(out.a, 255);
        assert!((126..=129).contains(&out.r));
        assert_eq!(out.r, out.g);
        assert_eq!(out.g, out.b);
    }

    proptest! {
        #[test]
        fn over_alpha_never_decreases(dr in 0u8.., dg in 0u8.., db in 0u8.., da in 0u8..,
                                      sr in 0u8.., sg in 0u8.., sb in 0u8.., sa in 0u8..) {
            let d = Color::rgba(dr, dg, db, da);
            let s = Color::rgba(sr, sg, sb, sa);
            let out = source_over(d, s);
            prop_assert!(out.a >= d.a.max(s.a).saturating_sub(1));
        }

        #[test]
        fn over_with_opacity_zero_is_identity(dr in 0u8.., da in 0u8.., sr in 0u8.., sa in 0u8..) {
            let d = Color::rgba(dr, dr, dr, da);
            let s = Color::rgba(sr, sr, sr, sa).with_opacity(0.0);
            prop_assert_eq!(source_over(d, s), d);
        }
    }
}
