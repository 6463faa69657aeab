//! Raster exports: flattened PNG, animated GIF, and multi-layer TIFF.

use crate::IoError;
use core_doc::Document;
use core_raster::RasterBuffer;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{TiffEncoder, colortype};
use tracing::info;

fn to_rgba_image(buf: &RasterBuffer) -> RgbaImage {
    RgbaImage::from_raw(buf.width(), buf.height(), buf.as_rgba_bytes().to_vec())
        .expect("buffer length matches dimensions")
}

/// Write the composite of playback index `frame` as a PNG, upscaled by the
/// integer `pixel_size` factor (nearest-neighbor).
pub fn export_png(
    doc: &Document,
    frame: usize,
    pixel_size: u32,
    path: &Path,
) -> Result<(), IoError> {
    let composite = doc.render(frame).upscaled(pixel_size.max(1));
    to_rgba_image(&composite).save(path)?;
    info!(target: "io.export", path = %path.display(), frame, pixel_size, "png_exported");
    Ok(())
}

/// Write the whole timeline as a looping GIF: one frame per playback index
/// (hold-last-key resolution), `1000 / fps` ms per frame, upscaled by
/// `pixel_size`.
pub fn export_gif(doc: &Document, pixel_size: u32, path: &Path) -> Result<(), IoError> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = GifEncoder::new(file);
    encoder.set_repeat(Repeat::Infinite)?;
    let delay_ms = 1000 / doc.frames.fps.max(1);
    let total = doc.frames.playback_total.max(1);
    for p in 0..total {
        let composite = doc.render(p).upscaled(pixel_size.max(1));
        let frame = Frame::from_parts(
            to_rgba_image(&composite),
            0,
            0,
            Delay::from_numer_denom_ms(delay_ms, 1),
        );
        encoder.encode_frame(frame)?;
    }
    info!(target: "io.export", path = %path.display(), frames = total, "gif_exported");
    Ok(())
}

/// Per-layer metadata carried in the TIFF sidecar.
#[derive(Debug, Serialize, Deserialize)]
struct LayerMeta {
    name: String,
    visible: bool,
    opacity: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct TiffSidecar {
    width: u32,
    height: u32,
    layers: Vec<LayerMeta>,
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".json");
    PathBuf::from(os)
}

/// Write the current frame as a multi-image TIFF (one IFD per layer, bottom
/// first) plus a `<file>.json` sidecar with name/visibility/opacity.
pub fn save_tiff(doc: &Document, path: &Path) -> Result<(), IoError> {
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(file)?;
    let mut metas = Vec::new();
    for layer in doc.layers().iter() {
        encoder.write_image::<colortype::RGBA8>(
            layer.image.width(),
            layer.image.height(),
            layer.image.as_rgba_bytes(),
        )?;
        metas.push(LayerMeta {
            name: layer.name().to_string(),
            visible: layer.visible,
            opacity: layer.opacity,
        });
    }
    let sidecar = TiffSidecar {
        width: doc.width(),
        height: doc.height(),
        layers: metas,
    };
    let json = File::create(sidecar_path(path))?;
    serde_json::to_writer_pretty(json, &sidecar)?;
    info!(target: "io.export", path = %path.display(), layers = sidecar.layers.len(), "tiff_exported");
    Ok(())
}

/// Load a multi-image TIFF (with its sidecar when present) into a
/// single-frame document.
pub fn load_tiff(path: &Path) -> Result<Document, IoError> {
    let mut decoder = Decoder::new(File::open(path)?)?;
    let mut images: Vec<RasterBuffer> = Vec::new();
    loop {
        let (w, h) = decoder.dimensions()?;
        let data = match decoder.read_image()? {
            DecodingResult::U8(data) => data,
            _ => {
                return Err(IoError::Malformed(
                    "expected 8-bit RGBA layer images".into(),
                ));
            }
        };
        let buf = RasterBuffer::from_rgba_bytes(w, h, data)
            .ok_or_else(|| IoError::Malformed("layer image size mismatch".into()))?;
        images.push(buf);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }
    let first = images
        .first()
        .ok_or_else(|| IoError::Malformed("no layers in file".into()))?;
    let (w, h) = (first.width(), first.height());
    if images.iter().any(|i| (i.width(), i.height()) != (w, h)) {
        return Err(IoError::Malformed("layers disagree on dimensions".into()));
    }

    let sidecar: Option<TiffSidecar> = match File::open(sidecar_path(path)) {
        Ok(f) => Some(serde_json::from_reader(f)?),
        Err(_) => None,
    };

    let mut doc = Document::new(w, h);
    for (i, image) in images.into_iter().enumerate() {
        let meta = sidecar.as_ref().and_then(|s| s.layers.get(i));
        let name = meta
            .map(|m| m.name.clone())
            .unwrap_or_else(|| format!("Layer {}", i + 1));
        if i == 0 {
            let layer = doc.active_layer_mut();
            layer.image = image;
            layer.set_name(name).map_err(|e| IoError::Malformed(e.to_string()))?;
        } else {
            doc.layers_mut()
                .add_with_image(name, image)
                .map_err(|e| IoError::Malformed(e.to_string()))?;
        }
        if let Some(m) = meta {
            let layer = doc.active_layer_mut();
            layer.visible = m.visible;
            layer.opacity = m.opacity;
        }
    }
    let _ = doc.layers_mut().select(0);
    Ok(doc)
}
