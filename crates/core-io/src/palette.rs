//! Palette extraction: cluster a reference image into 16 colors.

use crate::IoError;
use core_raster::RasterBuffer;
use std::path::Path;
use tracing::info;

const PALETTE_SIZE: usize = 16;
const KMEANS_ROUNDS: usize = 10;

/// Load an image file and return its k-means palette as `#rrggbb` strings
/// (at most 16, deduplicated, cluster order).
pub fn extract_palette(path: &Path) -> Result<Vec<String>, IoError> {
    let img = image::open(path)?.to_rgba8();
    let (w, h) = img.dimensions();
    let buf = RasterBuffer::from_rgba_bytes(w, h, img.into_raw())
        .ok_or_else(|| IoError::Malformed("image has no pixels".into()))?;
    let palette = palette_from_image(&buf);
    info!(target: "io.palette", path = %path.display(), colors = palette.len(), "palette_extracted");
    Ok(palette)
}

/// K-means over the image's RGB values (alpha ignored, fully transparent
/// pixels skipped). Initialization samples pixels at even strides, so the
/// result is deterministic for a given image.
pub fn palette_from_image(image: &RasterBuffer) -> Vec<String> {
    let pixels: Vec<[f64; 3]> = image
        .pixels()
        .filter(|c| c.a > 0)
        .map(|c| [c.r as f64, c.g as f64, c.b as f64])
        .collect();
    if pixels.is_empty() {
        return Vec::new();
    }

    let k = PALETTE_SIZE.min(pixels.len());
    let mut centers: Vec<[f64; 3]> = (0..k)
        .map(|i| pixels[i * pixels.len() / k])
        .collect();

    let mut assignment = vec![0usize; pixels.len()];
    for _ in 0..KMEANS_ROUNDS {
        // assign
        for (pi, p) in pixels.iter().enumerate() {
            let mut best = 0usize;
            let mut best_d = f64::MAX;
            for (ci, c) in centers.iter().enumerate() {
                let d = dist2(p, c);
                if d < best_d {
                    best_d = d;
                    best = ci;
                }
            }
            assignment[pi] = best;
        }
        // update
        let mut sums = vec![[0f64; 3]; k];
        let mut counts = vec![0usize; k];
        for (pi, p) in pixels.iter().enumerate() {
            let a = assignment[pi];
            for ch in 0..3 {
                sums[a][ch] += p[ch];
            }
            counts[a] += 1;
        }
        for ci in 0..k {
            if counts[ci] > 0 {
                for ch in 0..3 {
                    centers[ci][ch] = sums[ci][ch] / counts[ci] as f64;
                }
            }
            // empty clusters keep their previous center
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(k);
    for c in centers {
        let hex = format!(
            "#{:02x}{:02x}{:02x}",
            c[0].round() as u8,
            c[1].round() as u8,
            c[2].round() as u8
        );
        if !out.contains(&hex) {
            out.push(hex);
        }
    }
    out
}

fn dist2(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}
