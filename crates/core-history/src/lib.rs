//! Reversible command history.
//!
//! Every mutation of the document goes through a [`Command`]: an object that
//! can apply itself to the document and restore the exact prior pixel state.
//! The [`History`] owns two bounded LIFO stacks; pushing a new command clears
//! the redo stack, and overflowing the capacity discards the oldest entry
//! together with its captured snapshots.
//!
//! Capture discipline:
//! * A command captures **all** of its parameters (color, width, brush,
//!   mirror flags, selection mask) at construction. Re-executing after the
//!   drawing context changed must reproduce the original pixels.
//! * Pixel snapshots are taken lazily on the first `execute` and cover the
//!   minimum affected region (a sub-buffer plus offset), not the whole layer.
//! * A command that fails in `execute` leaves the document untouched and is
//!   not pushed.
//! * `undo` is infallible: it only reverses what `execute` did.

use core_doc::{DocError, Document};
use tracing::{debug, trace, warn};

pub mod commands;
pub mod snapshot;

pub use snapshot::RegionSnapshot;

/// Default history depth; hosts override it from the `number_of_undos`
/// configuration entry.
pub const DEFAULT_CAPACITY: usize = 100;

/// Whether an `execute` changed any state. `NoOp` commands (e.g. a flood fill
/// on its own color) are not recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Changed,
    NoOp,
}

pub trait Command {
    /// Stable name for logs and the host's undo/redo menu entries.
    fn label(&self) -> &'static str;

    /// Apply to the document. Must either complete fully or leave the
    /// document untouched and return an error.
    fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError>;

    /// Restore the exact state from before this command's last `execute`.
    fn undo(&mut self, doc: &mut Document);
}

/// Dual-stack undo/redo engine.
pub struct History {
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drop both stacks (e.g. after loading a different document).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Execute `cmd` and record it. Returns `Ok(false)` when the command
    /// reported a no-op (nothing recorded), `Ok(true)` when it was pushed.
    /// On error nothing is recorded and the document is unchanged.
    pub fn push(
        &mut self,
        doc: &mut Document,
        mut cmd: Box<dyn Command>,
    ) -> Result<bool, DocError> {
        match cmd.execute(doc)? {
            Applied::NoOp => {
                trace!(target: "history", label = cmd.label(), "noop_not_recorded");
                Ok(false)
            }
            Applied::Changed => {
                trace!(target: "history", label = cmd.label(), depth = self.undo_stack.len() + 1, "push");
                self.undo_stack.push(cmd);
                if self.undo_stack.len() > self.capacity {
                    let dropped = self.undo_stack.remove(0);
                    debug!(target: "history", label = dropped.label(), "oldest_entry_dropped");
                }
                self.redo_stack.clear();
                doc.events.document_changed.emit(&());
                Ok(true)
            }
        }
    }

    /// Reverse the most recent command. No-op (returning false) when the
    /// undo stack is empty.
    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(mut cmd) = self.undo_stack.pop() else {
            return false;
        };
        trace!(target: "history", label = cmd.label(), depth = self.undo_stack.len(), "undo");
        cmd.undo(doc);
        self.redo_stack.push(cmd);
        doc.events.document_changed.emit(&());
        true
    }

    /// Re-apply the most recently undone command.
    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(mut cmd) = self.redo_stack.pop() else {
            return false;
        };
        trace!(target: "history", label = cmd.label(), "redo");
        match cmd.execute(doc) {
            Ok(_) => {
                self.undo_stack.push(cmd);
                doc.events.document_changed.emit(&());
                true
            }
            Err(err) => {
                // A replay of captured parameters on the state its undo
                // produced cannot fail; treat a failure as a dropped entry.
                warn!(target: "history", label = cmd.label(), %err, "redo_failed_entry_dropped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_raster::Color;

    struct FillAll {
        color: Color,
        before: Option<Color>,
    }

    impl Command for FillAll {
        fn label(&self) -> &'static str {
            "fill all"
        }
        fn execute(&mut self, doc: &mut Document) -> Result<Applied, DocError> {
            let img = &mut doc.active_layer_mut().image;
            if self.before.is_none() {
                self.before = img.pixel(0, 0);
            }
            img.fill(self.color);
            Ok(Applied::Changed)
        }
        fn undo(&mut self, doc: &mut Document) {
            doc.active_layer_mut()
                .image
                .fill(self.before.expect("undo follows execute"));
        }
    }

    struct Noop;
    impl Command for Noop {
        fn label(&self) -> &'static str {
            "noop"
        }
        fn execute(&mut self, _doc: &mut Document) -> Result<Applied, DocError> {
            Ok(Applied::NoOp)
        }
        fn undo(&mut self, _doc: &mut Document) {}
    }

    struct Failing;
    impl Command for Failing {
        fn label(&self) -> &'static str {
            "failing"
        }
        fn execute(&mut self, _doc: &mut Document) -> Result<Applied, DocError> {
            Err(DocError::LastLayer)
        }
        fn undo(&mut self, _doc: &mut Document) {}
    }

    fn fill(c: Color) -> Box<dyn Command> {
        Box::new(FillAll {
            color: c,
            before: None,
        })
    }

    #[test]
    fn push_undo_redo_cycle() {
        let mut doc = Document::new(4, 4);
        let mut h = History::new();
        assert!(h.push(&mut doc, fill(Color::BLACK)).unwrap());
        assert_eq!(doc.active_layer().image.pixel(0, 0), Some(Color::BLACK));
        assert!(h.undo(&mut doc));
        assert!(doc.active_layer().image.pixel(0, 0).unwrap().is_transparent());
        assert!(h.redo(&mut doc));
        assert_eq!(doc.active_layer().image.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn undo_redo_on_empty_stacks_are_noops() {
        let mut doc = Document::new(4, 4);
        let mut h = History::new();
        assert!(!h.undo(&mut doc));
        assert!(!h.redo(&mut doc));
    }

    #[test]
    fn new_push_clears_redo() {
        let mut doc = Document::new(4, 4);
        let mut h = History::new();
        h.push(&mut doc, fill(Color::BLACK)).unwrap();
        h.undo(&mut doc);
        assert!(h.can_redo());
        h.push(&mut doc, fill(Color::WHITE)).unwrap();
        assert!(!h.can_redo());
    }

    #[test]
    fn noop_commands_are_not_recorded() {
        let mut doc = Document::new(4, 4);
        let mut h = History::new();
        assert!(!h.push(&mut doc, Box::new(Noop)).unwrap());
        assert!(!h.can_undo());
    }

    #[test]
    fn failed_commands_are_not_recorded() {
        let mut doc = Document::new(4, 4);
        let mut h = History::new();
        assert!(h.push(&mut doc, Box::new(Failing)).is_err());
        assert!(!h.can_undo());
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut doc = Document::new(4, 4);
        let mut h = History::with_capacity(2);
        for c in [Color::BLACK, Color::WHITE, Color::rgb(5, 5, 5)] {
            h.push(&mut doc, fill(c)).unwrap();
        }
        assert_eq!(h.undo_depth(), 2);
        assert!(h.undo(&mut doc));
        assert!(h.undo(&mut doc));
        assert!(!h.undo(&mut doc), "oldest entry was discarded");
    }
}
