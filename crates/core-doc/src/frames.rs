//! Animation frames, the keyed-frame set, and playback resolution.
//!
//! A frame is a full layer stack; the manager owns an ordered frame list plus
//! a sorted set of *keyed* frame indices. Playback never shows a non-keyed
//! frame directly: a playback index `p` resolves to the largest key `k ≤ p`
//! and renders `frames[k]` ("hold last key"). Frame 0 is always keyed, so
//! resolution is total.

use crate::stack::LayerStack;
use crate::{DocError, check_index};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// One animation frame: an independent layer stack. Frames never share pixel
/// buffers; `Clone` deep-copies every layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub layers: LayerStack,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layers: LayerStack::new(width, height, "Background"),
        }
    }

    pub fn from_stack(layers: LayerStack) -> Self {
        Self { layers }
    }
}

/// Ordered frame list plus the keyed-frame set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameManager {
    frames: Vec<Frame>,
    keys: BTreeSet<usize>,
    current: usize,
    pub fps: u32,
    pub playback_total: usize,
}

impl FrameManager {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frames: vec![Frame::new(width, height)],
            keys: BTreeSet::from([0]),
            current: 0,
            fps: 8,
            playback_total: 8,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Result<&Frame, DocError> {
        check_index(index, self.frames.len())?;
        Ok(&self.frames[index])
    }

    pub fn frame_mut(&mut self, index: usize) -> Result<&mut Frame, DocError> {
        check_index(index, self.frames.len())?;
        Ok(&mut self.frames[index])
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn frames_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.iter_mut()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.current]
    }

    pub fn current_frame_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.current]
    }

    pub fn set_current(&mut self, index: usize) -> Result<(), DocError> {
        check_index(index, self.frames.len())?;
        self.current = index;
        Ok(())
    }

    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.keys.iter().copied()
    }

    pub fn is_keyed(&self, index: usize) -> bool {
        self.keys.contains(&index)
    }

    /// Largest key at or below `p` — the "hold last key" playback rule. Key 0
    /// always exists, so every index resolves.
    pub fn resolve(&self, p: usize) -> usize {
        debug_assert!(self.keys.contains(&0), "frame 0 must stay keyed");
        self.keys.range(..=p).next_back().copied().unwrap_or(0)
    }

    /// The frame playback index `p` displays.
    pub fn resolved_frame(&self, p: usize) -> &Frame {
        &self.frames[self.resolve(p)]
    }

    /// Mark `index` as keyed, extending the frame list with copies of the
    /// last keyed frame when `index` lies past the end.
    pub fn add_key(&mut self, index: usize) {
        while self.frames.len() <= index {
            let src = self.resolve(self.frames.len() - 1);
            let copy = self.frames[src].clone();
            self.frames.push(copy);
        }
        self.keys.insert(index);
        debug!(target: "doc.frames", index, keys = self.keys.len(), "add_key");
    }

    /// Drop a key. Frame 0's key is permanent; playback indices that resolved
    /// to the removed key fall back to the next lower key.
    pub fn remove_key(&mut self, index: usize) -> Result<(), DocError> {
        if index == 0 {
            return Err(DocError::LastFrame);
        }
        if !self.keys.remove(&index) {
            return Err(DocError::InvalidIndex {
                index,
                len: self.frames.len(),
            });
        }
        Ok(())
    }

    /// Shift the keys in `indices` by `delta` frames. The whole move is
    /// validated before any mutation: every index must currently be keyed and
    /// nonzero, targets must be non-negative, and no target may land on a key
    /// that is not itself moving (`KeyConflict`). The frame list is extended
    /// as needed; frame contents move with their keys.
    pub fn move_keys(&mut self, indices: &[usize], delta: i64) -> Result<(), DocError> {
        if delta == 0 || indices.is_empty() {
            return Ok(());
        }
        let moving: BTreeSet<usize> = indices.iter().copied().collect();
        for &i in &moving {
            if i == 0 {
                return Err(DocError::LastFrame);
            }
            if !self.keys.contains(&i) {
                return Err(DocError::InvalidIndex {
                    index: i,
                    len: self.frames.len(),
                });
            }
        }
        let mut targets = BTreeSet::new();
        for &i in &moving {
            let t = i as i64 + delta;
            if t < 0 {
                return Err(DocError::InvalidIndex {
                    index: i,
                    len: self.frames.len(),
                });
            }
            targets.insert(t as usize);
        }
        for &t in &targets {
            if self.keys.contains(&t) && !moving.contains(&t) {
                return Err(DocError::KeyConflict { index: t });
            }
        }

        let max_target = *targets.iter().next_back().expect("targets nonempty");
        while self.frames.len() <= max_target {
            let src = self.resolve(self.frames.len() - 1);
            let copy = self.frames[src].clone();
            self.frames.push(copy);
        }

        // Move contents high-to-low or low-to-high depending on direction so
        // sources are read before they are overwritten.
        let mut ordered: Vec<usize> = moving.iter().copied().collect();
        if delta > 0 {
            ordered.reverse();
        }
        for &i in &ordered {
            let t = (i as i64 + delta) as usize;
            let frame = self.frames[i].clone();
            self.frames[t] = frame;
            self.keys.remove(&i);
        }
        for &t in &targets {
            self.keys.insert(t);
        }
        debug!(target: "doc.frames", moved = indices.len(), delta, "move_keys");
        Ok(())
    }

    /// Insert a new frame directly after `index`, seeded with a copy of the
    /// frame that playback resolves at `index + 1`. Keys at or above the
    /// insert point shift up by one.
    pub fn insert_frame_after(&mut self, index: usize) -> Result<usize, DocError> {
        check_index(index, self.frames.len())?;
        let at = index + 1;
        let seed = self.resolve(at.min(self.frames.len() - 1));
        let copy = self.frames[seed].clone();
        self.frames.insert(at, copy);
        self.keys = self
            .keys
            .iter()
            .map(|&k| if k >= at { k + 1 } else { k })
            .collect();
        if self.current >= at {
            self.current += 1;
        }
        Ok(at)
    }

    /// Remove the frame at `index`; frames above shift down, keys follow.
    /// Frame 0 is never deletable and the list never goes empty. A key
    /// sitting exactly on the removed frame is dropped.
    pub fn delete_frame(&mut self, index: usize) -> Result<Frame, DocError> {
        check_index(index, self.frames.len())?;
        if index == 0 || self.frames.len() == 1 {
            return Err(DocError::LastFrame);
        }
        let frame = self.frames.remove(index);
        self.keys = self
            .keys
            .iter()
            .filter(|&&k| k != index)
            .map(|&k| if k > index { k - 1 } else { k })
            .collect();
        if self.current >= index {
            self.current = self.current.saturating_sub(1);
        }
        debug!(target: "doc.frames", index, remaining = self.frames.len(), "delete_frame");
        Ok(frame)
    }

}

/// Playback cursor over the timeline. The host owns the timer; each tick
/// calls [`advance`](Playback::advance) and renders the resolved frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Playback {
    position: usize,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Step to the next playback index, wrapping at `manager.playback_total`,
    /// and return the frame index to display.
    pub fn advance(&mut self, manager: &FrameManager) -> usize {
        let total = manager.playback_total.max(1);
        self.position = (self.position + 1) % total;
        manager.resolve(self.position)
    }

    /// Frame index for the current position without stepping.
    pub fn resolve(&self, manager: &FrameManager) -> usize {
        manager.resolve(self.position)
    }
}
