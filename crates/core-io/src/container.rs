//! The native document container.
//!
//! A zip archive with one entry, `data`: the bincode serialization of the
//! whole [`Document`] (dimensions, every frame's layer list with names,
//! visibility, opacity and pixels, the selection, AI output rect, current
//! frame, key set, fps, and playback length). Writing compresses with
//! deflate; reading accepts whatever method the archive declares.

use crate::IoError;
use core_doc::Document;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

const DATA_ENTRY: &str = "data";

pub fn save_document(path: &Path, doc: &Document) -> Result<(), IoError> {
    let blob = bincode::serialize(doc).map_err(|e| IoError::Encode(e.to_string()))?;
    let file = File::create(path)?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    archive.start_file(DATA_ENTRY, options)?;
    archive.write_all(&blob)?;
    archive.finish()?;
    info!(target: "io.save", path = %path.display(), bytes = blob.len(), "document_saved");
    Ok(())
}

pub fn load_document(path: &Path) -> Result<Document, IoError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = archive.by_name(DATA_ENTRY)?;
    let mut blob = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut blob)?;
    let doc: Document =
        bincode::deserialize(&blob).map_err(|e| IoError::Decode(e.to_string()))?;
    info!(target: "io.load", path = %path.display(), w = doc.width(), h = doc.height(), "document_loaded");
    Ok(doc)
}
