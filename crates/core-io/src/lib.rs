//! Document persistence and raster interchange.
//!
//! Four surfaces:
//! * the native container — a zip archive with a single `data` entry holding
//!   the bincode-serialized document ([`container`]);
//! * multi-layer TIFF with a JSON metadata sidecar, and flattened PNG / GIF
//!   exports at an integer pixel scale ([`export`]);
//! * palette extraction from reference images via k-means ([`palette`]).
//!
//! All functions run synchronously; hosts call them from a worker thread for
//! large documents and bridge back with worker events.

use thiserror::Error;

pub mod container;
pub mod export;
pub mod palette;

pub use container::{load_document, save_document};
pub use export::{export_gif, export_png, load_tiff, save_tiff};
pub use palette::{extract_palette, palette_from_image};

#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("document blob encoding failed: {0}")]
    Encode(String),
    #[error("document blob decoding failed: {0}")]
    Decode(String),
    #[error("malformed file: {0}")]
    Malformed(String),
}
