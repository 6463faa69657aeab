//! Core event types: change-notification subscriber lists, abstract pointer
//! events, and worker-thread message channels.
//!
//! The document core is single-threaded; hosts drive it from one "UI thread".
//! Two notification mechanisms exist:
//!
//! * [`SubscriberList`] — synchronous observers for in-thread change signals
//!   (`document_changed`, `selection_changed`, drawing-context fields).
//!   Observers run on the emitting thread, in subscription order, and must not
//!   re-enter the emitter.
//! * [`WorkerEvent`] over a crossbeam channel — the only bridge for work that
//!   runs off-thread (AI generation, palette extraction). Workers never touch
//!   the document; they send `Progress`/`Complete`/`Failed` and the host's
//!   event loop applies results on the UI thread.
//!
//! Pointer events are the abstract input surface for the tool state machines:
//! a phase, a document-space position, a button, and a modifier mask. The host
//! is responsible for translating native input and view-space coordinates.

use core_raster::Point;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::fmt;

// -------------------------------------------------------------------------------------------------
// Subscriber lists
// -------------------------------------------------------------------------------------------------

/// Handle returned by [`SubscriberList::subscribe`]; pass back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// An ordered list of boxed observers for one signal.
pub struct SubscriberList<T> {
    next_id: u64,
    subscribers: Vec<(u64, Box<dyn FnMut(&T)>)>,
}

impl<T> Default for SubscriberList<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for SubscriberList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberList")
            .field("len", &self.subscribers.len())
            .finish()
    }
}

impl<T> SubscriberList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, f: impl FnMut(&T) + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Box::new(f)));
        Subscription(id)
    }

    /// Remove one observer. Unknown handles are ignored (the observer may
    /// already have been dropped with its owner).
    pub fn unsubscribe(&mut self, sub: Subscription) {
        self.subscribers.retain(|(id, _)| *id != sub.0);
    }

    /// Invoke every observer in subscription order.
    pub fn emit(&mut self, value: &T) {
        for (_, f) in &mut self.subscribers {
            f(value);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

// -------------------------------------------------------------------------------------------------
// Pointer events
// -------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Press,
    Move,
    Release,
    DoubleClick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const CTRL  = 0b0000_0010;
        const ALT   = 0b0000_0100;
    }
}

/// One abstract pointer event in document coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub pos: Point,
    pub button: PointerButton,
    pub mods: Modifiers,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, pos: Point, button: PointerButton, mods: Modifiers) -> Self {
        Self {
            phase,
            pos,
            button,
            mods,
        }
    }

    pub fn press(pos: Point, button: PointerButton) -> Self {
        Self::new(PointerPhase::Press, pos, button, Modifiers::empty())
    }

    pub fn moved(pos: Point, button: PointerButton) -> Self {
        Self::new(PointerPhase::Move, pos, button, Modifiers::empty())
    }

    pub fn release(pos: Point, button: PointerButton) -> Self {
        Self::new(PointerPhase::Release, pos, button, Modifiers::empty())
    }

    pub fn with_mods(mut self, mods: Modifiers) -> Self {
        self.mods = mods;
        self
    }
}

// -------------------------------------------------------------------------------------------------
// Worker messages
// -------------------------------------------------------------------------------------------------

/// Message from a worker thread back to the UI thread. `T` is the payload the
/// worker produces (e.g. a raster image).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerEvent<T> {
    /// Step `step` of `total` finished; optionally carries an intermediate
    /// payload preview.
    Progress {
        step: u32,
        total: u32,
        preview: Option<T>,
    },
    Complete(T),
    Failed(String),
}

/// Unbounded channel for worker messages. Unbounded keeps worker sends
/// non-blocking; the UI thread drains at its own pace.
pub fn worker_channel<T>() -> (Sender<WorkerEvent<T>>, Receiver<WorkerEvent<T>>) {
    unbounded()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn subscribers_run_in_order_and_unsubscribe() {
        let log = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut list: SubscriberList<u32> = SubscriberList::new();
        let l1 = log.clone();
        let a = list.subscribe(move |v| l1.borrow_mut().push(('a', *v)));
        let l2 = log.clone();
        let _b = list.subscribe(move |v| l2.borrow_mut().push(('b', *v)));
        list.emit(&1);
        list.unsubscribe(a);
        list.emit(&2);
        assert_eq!(*log.borrow(), vec![('a', 1), ('b', 1), ('b', 2)]);
    }

    #[test]
    fn unsubscribe_unknown_is_ignored() {
        let mut list: SubscriberList<()> = SubscriberList::new();
        let sub = list.subscribe(|_| {});
        list.unsubscribe(sub);
        list.unsubscribe(sub);
        assert!(list.is_empty());
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        let mut list: SubscriberList<String> = SubscriberList::new();
        list.emit(&"nothing".to_string());
    }

    #[test]
    fn subscriber_sees_state_changes() {
        let hits = Rc::new(Cell::new(0));
        let mut list: SubscriberList<bool> = SubscriberList::new();
        let h = hits.clone();
        list.subscribe(move |on| {
            if *on {
                h.set(h.get() + 1);
            }
        });
        list.emit(&true);
        list.emit(&false);
        list.emit(&true);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn worker_channel_delivers_in_order() {
        let (tx, rx) = worker_channel::<u8>();
        let handle = std::thread::spawn(move || {
            for step in 0..3 {
                tx.send(WorkerEvent::Progress {
                    step,
                    total: 3,
                    preview: None,
                })
                .unwrap();
            }
            tx.send(WorkerEvent::Complete(42)).unwrap();
        });
        handle.join().unwrap();
        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[3], WorkerEvent::Complete(42));
    }
}
