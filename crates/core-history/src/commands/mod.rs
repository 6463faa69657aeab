//! The concrete command set.
//!
//! Drawing commands ([`draw`]) snapshot the stroke/shape/fill bounding region
//! on first execute; structural layer commands ([`structure`]) retain the
//! affected layer objects so redo re-inserts the very same pixels; whole
//! document transforms ([`transform`]) capture the document state needed for
//! exact reversal.

pub mod draw;
pub mod structure;
pub mod transform;

pub use draw::{ClearLayer, DrawStroke, Fill, Shape, ShapeKind};
pub use structure::{
    AddLayer, DuplicateLayer, MergeDown, MoveLayer, Paste, RemoveLayer,
};
pub use transform::{
    CropDocument, FlipDocument, LayerEdit, MoveContent, ResizeDocument, SelectionEdit,
};

use core_doc::{DocError, Document, Layer};

/// Look up a layer by (frame, layer) index pair.
pub(crate) fn layer_mut<'a>(
    doc: &'a mut Document,
    frame: usize,
    layer: usize,
) -> Result<&'a mut Layer, DocError> {
    doc.frames.frame_mut(frame)?.layers.get_mut(layer)
}
