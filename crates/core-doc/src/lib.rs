//! Document model: layers, layer stacks, animation frames, and the document
//! itself.
//!
//! Ownership is arena-shaped, never cyclic: the [`Document`] owns a
//! [`FrameManager`], which owns [`Frame`]s, which own a [`LayerStack`] of
//! [`Layer`]s, which own their pixel buffers. Everything above addresses
//! layers and frames by index; commands that must reference "the layer that
//! was at index 3" across time retain the index plus, where needed for undo,
//! the extracted layer object itself.
//!
//! Core invariants (must hold after every public call):
//! * every frame has at least one layer;
//! * `0 ≤ active_index < layers.len()` in every stack;
//! * all layer buffers of all frames share the document's dimensions;
//! * two frames never alias a buffer (duplication deep-copies);
//! * the key set always contains frame 0;
//! * any stored selection is clipped to `[0,W)×[0,H)`.

pub mod document;
pub mod frames;
pub mod layer;
pub mod stack;

pub use document::{Document, DocumentEvents, DocumentState, FlipAxis, KeyInsertBehavior};
pub use frames::{Frame, FrameManager, Playback};
pub use layer::Layer;
pub use stack::LayerStack;

use thiserror::Error;

/// Typed failures for document, layer, and frame operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocError {
    #[error("index {index} out of range (len {len})")]
    InvalidIndex { index: usize, len: usize },
    #[error("cannot remove the last remaining layer")]
    LastLayer,
    #[error("frame 0 cannot be removed or unkeyed")]
    LastFrame,
    #[error("key move collides with existing key at frame {index}")]
    KeyConflict { index: usize },
    #[error("a {src_w}x{src_h} image cannot be fitted to a {dst_w}x{dst_h} canvas")]
    DimensionMismatch {
        src_w: u32,
        src_h: u32,
        dst_w: u32,
        dst_h: u32,
    },
    #[error("layer name must be a non-empty string")]
    InvalidName,
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<(), DocError> {
    if index < len {
        Ok(())
    } else {
        Err(DocError::InvalidIndex { index, len })
    }
}
