//! Ordered layer stack with an active index.
//!
//! Index 0 is the bottom layer, `len() - 1` the top. The stack never goes
//! empty and the active index is always valid; every mutator re-establishes
//! both before returning. Active-index adjustment on remove/move follows the
//! rule "the active layer follows its content": removing at or below the
//! active layer shifts it down, swapping with the active layer carries the
//! active flag along.

use crate::layer::Layer;
use crate::{DocError, check_index};
use core_raster::RasterBuffer;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<Layer>,
    active: usize,
}

impl LayerStack {
    /// Stack with a single transparent layer.
    pub fn new(width: u32, height: u32, first_layer: impl Into<String>) -> Self {
        let layer = Layer::new(width, height, first_layer).expect("caller supplies non-empty name");
        Self {
            layers: vec![layer],
            active: 0,
        }
    }

    /// Rebuild from parts (deserialization). Fails when the invariants cannot
    /// hold.
    pub fn from_parts(layers: Vec<Layer>, active: usize) -> Result<Self, DocError> {
        if layers.is_empty() {
            return Err(DocError::LastLayer);
        }
        check_index(active, layers.len())?;
        Ok(Self { layers, active })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Layer> {
        self.layers.iter_mut()
    }

    pub fn get(&self, index: usize) -> Result<&Layer, DocError> {
        check_index(index, self.layers.len())?;
        Ok(&self.layers[index])
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Layer, DocError> {
        check_index(index, self.layers.len())?;
        Ok(&mut self.layers[index])
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_layer(&self) -> &Layer {
        debug_assert!(self.active < self.layers.len(), "active index in range");
        &self.layers[self.active]
    }

    pub fn active_layer_mut(&mut self) -> &mut Layer {
        debug_assert!(self.active < self.layers.len(), "active index in range");
        &mut self.layers[self.active]
    }

    /// Append a new transparent layer on top; it becomes active. Returns its
    /// index.
    pub fn add(&mut self, name: impl Into<String>) -> Result<usize, DocError> {
        let (w, h) = self.dimensions();
        let layer = Layer::new(w, h, name)?;
        self.layers.push(layer);
        self.active = self.layers.len() - 1;
        Ok(self.active)
    }

    /// Append a layer carrying an existing image on top; it becomes active.
    pub fn add_with_image(
        &mut self,
        name: impl Into<String>,
        image: RasterBuffer,
    ) -> Result<usize, DocError> {
        let layer = Layer::from_image(image, name)?;
        self.layers.push(layer);
        self.active = self.layers.len() - 1;
        Ok(self.active)
    }

    /// Re-insert a layer at `index` (undo of a removal); it becomes active.
    pub fn insert(&mut self, index: usize, layer: Layer) -> Result<(), DocError> {
        if index > self.layers.len() {
            return Err(DocError::InvalidIndex {
                index,
                len: self.layers.len(),
            });
        }
        self.layers.insert(index, layer);
        self.active = index;
        Ok(())
    }

    /// Remove and return the layer at `index`. The last remaining layer
    /// cannot be removed.
    pub fn remove(&mut self, index: usize) -> Result<Layer, DocError> {
        check_index(index, self.layers.len())?;
        if self.layers.len() == 1 {
            return Err(DocError::LastLayer);
        }
        let layer = self.layers.remove(index);
        if self.active >= index {
            self.active = self.active.saturating_sub(1);
        }
        debug!(target: "doc.layers", index, remaining = self.layers.len(), "remove_layer");
        Ok(layer)
    }

    /// Clone the layer at `index` and insert the copy directly above it. The
    /// copy takes the source name plus a " copy" suffix and becomes active.
    /// Returns the copy's index.
    pub fn duplicate(&mut self, index: usize) -> Result<usize, DocError> {
        check_index(index, self.layers.len())?;
        let mut copy = self.layers[index].duplicate();
        copy.set_name(format!("{} copy", copy.name()))?;
        self.layers.insert(index + 1, copy);
        self.active = index + 1;
        Ok(self.active)
    }

    /// Swap the layer with its upper neighbor. The active flag follows
    /// whichever of the two layers carried it.
    pub fn move_up(&mut self, index: usize) -> Result<(), DocError> {
        check_index(index + 1, self.layers.len())?;
        self.layers.swap(index, index + 1);
        if self.active == index {
            self.active = index + 1;
        } else if self.active == index + 1 {
            self.active = index;
        }
        Ok(())
    }

    /// Swap the layer with its lower neighbor.
    pub fn move_down(&mut self, index: usize) -> Result<(), DocError> {
        if index == 0 {
            return Err(DocError::InvalidIndex {
                index,
                len: self.layers.len(),
            });
        }
        check_index(index, self.layers.len())?;
        self.layers.swap(index, index - 1);
        if self.active == index {
            self.active = index - 1;
        } else if self.active == index - 1 {
            self.active = index;
        }
        Ok(())
    }

    /// Composite the layer at `index` (with its opacity) over the layer below
    /// it, then remove it. Returns the removed top layer for undo. Requires
    /// `index > 0`.
    pub fn merge_down(&mut self, index: usize) -> Result<Layer, DocError> {
        if index == 0 {
            return Err(DocError::InvalidIndex {
                index,
                len: self.layers.len(),
            });
        }
        check_index(index, self.layers.len())?;
        let top = self.layers[index].clone();
        let opacity = top.opacity.clamp(0.0, 1.0);
        self.layers[index - 1]
            .image
            .blit_with_opacity(&top.image, 0, 0, opacity);
        self.remove(index)
    }

    /// Move the layer at `from` to position `to`, shifting the layers in
    /// between. The active flag follows the moved layer.
    pub fn move_layer(&mut self, from: usize, to: usize) -> Result<(), DocError> {
        check_index(from, self.layers.len())?;
        check_index(to, self.layers.len())?;
        if from == to {
            return Ok(());
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        if self.active == from {
            self.active = to;
        } else if from < self.active && self.active <= to {
            self.active -= 1;
        } else if to <= self.active && self.active < from {
            self.active += 1;
        }
        Ok(())
    }

    pub fn toggle_visibility(&mut self, index: usize) -> Result<(), DocError> {
        check_index(index, self.layers.len())?;
        self.layers[index].visible = !self.layers[index].visible;
        Ok(())
    }

    /// Make the layer at `index` active.
    pub fn select(&mut self, index: usize) -> Result<(), DocError> {
        check_index(index, self.layers.len())?;
        self.active = index;
        Ok(())
    }

    fn dimensions(&self) -> (u32, u32) {
        let img = &self.layers[0].image;
        (img.width(), img.height())
    }
}
