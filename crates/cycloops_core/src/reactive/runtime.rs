//! Reactive runtime: node identity, evaluation-context stack and effect queue.
//!
//! # Invariants
//! - Exactly one frame is pushed per running computed/effect and popped when
//!   it returns, including on unwind.
//! - A derivation that unwinds keeps the edges it tracked before the panic.
//! - Only the outermost flush drains the effect queue; nested writes enqueue.

use super::computed::Computed;
use super::effect::{Effect, EffectNode};
use super::signal::Signal;
use log::error;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u64);

/// A reactive cell that derivations can read from.
pub(crate) trait Source {
    fn node_id(&self) -> NodeId;
    fn subscribe(&self, id: NodeId, subscriber: Weak<dyn Subscriber>);
    fn unsubscribe(&self, id: NodeId);
}

/// A derivation that must learn when one of its sources changed.
pub(crate) trait Subscriber {
    fn mark_stale(&self);
    /// Takes `sources` as the dependency set of the run that just ended,
    /// whether it returned or unwound.
    fn adopt_sources(&self, sources: Vec<Rc<dyn Source>>);
}

/// Back-references from a source to its dependents. Tracking only, no ownership.
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: RefCell<Vec<(NodeId, Weak<dyn Subscriber>)>>,
}

impl Subscribers {
    pub(crate) fn insert(&self, id: NodeId, subscriber: Weak<dyn Subscriber>) {
        let mut entries = self.entries.borrow_mut();
        if !entries.iter().any(|(existing, _)| *existing == id) {
            entries.push((id, subscriber));
        }
    }

    pub(crate) fn remove(&self, id: NodeId) {
        self.entries
            .borrow_mut()
            .retain(|(existing, _)| *existing != id);
    }

    /// Marks every live dependent stale, in subscription order.
    pub(crate) fn notify(&self) {
        let live: Vec<Rc<dyn Subscriber>> = {
            let mut entries = self.entries.borrow_mut();
            entries.retain(|(_, subscriber)| subscriber.strong_count() > 0);
            entries
                .iter()
                .filter_map(|(_, subscriber)| subscriber.upgrade())
                .collect()
        };
        for subscriber in live {
            subscriber.mark_stale();
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

struct Frame {
    owner: Option<(NodeId, Weak<dyn Subscriber>)>,
    sources: Vec<Rc<dyn Source>>,
}

#[derive(Default)]
pub(crate) struct RuntimeInner {
    next_id: Cell<u64>,
    stack: RefCell<Vec<Frame>>,
    queue: RefCell<VecDeque<Rc<EffectNode>>>,
    flushing: Cell<bool>,
}

impl RuntimeInner {
    pub(crate) fn next_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    /// Registers `source` as a dependency of the derivation currently running.
    pub(crate) fn track(&self, source: Rc<dyn Source>) {
        let mut stack = self.stack.borrow_mut();
        let Some(frame) = stack.last_mut() else {
            return;
        };
        let Some((owner_id, owner)) = frame.owner.as_ref() else {
            return;
        };
        let source_id = source.node_id();
        if frame.sources.iter().any(|known| known.node_id() == source_id) {
            return;
        }
        source.subscribe(*owner_id, owner.clone());
        frame.sources.push(source);
    }

    /// Runs `f` inside a fresh evaluation context and returns what it read.
    pub(crate) fn run_tracked<R>(
        &self,
        owner: Option<(NodeId, Weak<dyn Subscriber>)>,
        f: impl FnOnce() -> R,
    ) -> (R, Vec<Rc<dyn Source>>) {
        self.stack.borrow_mut().push(Frame {
            owner,
            sources: Vec::new(),
        });
        let mut guard = FrameGuard {
            runtime: self,
            armed: true,
        };
        let value = f();
        guard.armed = false;
        let frame = self.stack.borrow_mut().pop();
        (value, frame.map(|frame| frame.sources).unwrap_or_default())
    }

    pub(crate) fn enqueue(&self, effect: Rc<EffectNode>) {
        self.queue.borrow_mut().push_back(effect);
    }

    /// Drains the effect queue unless an outer flush is already doing so.
    pub(crate) fn flush(&self) {
        if self.flushing.replace(true) {
            return;
        }
        let _guard = FlushGuard { runtime: self };
        loop {
            let next = self.queue.borrow_mut().pop_front();
            match next {
                Some(effect) => effect.run(),
                None => break,
            }
        }
    }

    /// Runs a freshly created effect immediately, then drains what it queued.
    pub(crate) fn run_now(&self, effect: &Rc<EffectNode>) {
        if self.flushing.get() {
            effect.run();
            return;
        }
        {
            self.flushing.set(true);
            let _guard = FlushGuard { runtime: self };
            effect.run();
        }
        self.flush();
    }
}

struct FrameGuard<'a> {
    runtime: &'a RuntimeInner,
    armed: bool,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Unwinding out of a derivation: the reads made before the panic stay
        // its dependencies so a later write can re-run it.
        let Some(frame) = self.runtime.stack.borrow_mut().pop() else {
            return;
        };
        let Some((owner_id, owner)) = frame.owner else {
            return;
        };
        match owner.upgrade() {
            Some(owner) => owner.adopt_sources(frame.sources),
            None => {
                for source in frame.sources {
                    source.unsubscribe(owner_id);
                }
            }
        }
    }
}

struct FlushGuard<'a> {
    runtime: &'a RuntimeInner,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let dropped: Vec<Rc<EffectNode>> = self.runtime.queue.borrow_mut().drain(..).collect();
            for effect in &dropped {
                effect.clear_queued();
            }
            error!(
                "event=effect_pass module=reactive status=aborted dropped_effects={}",
                dropped.len()
            );
        }
        self.runtime.flushing.set(false);
    }
}

/// Handle to a reactive graph.
///
/// Every signal, computed and effect created from the same runtime shares one
/// evaluation-context stack and one effect queue. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Runtime {
    pub(crate) inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mutable reactive cell.
    pub fn signal<T: 'static>(&self, value: T) -> Signal<T> {
        Signal::new(self.clone(), value)
    }

    /// Creates a lazily evaluated, memoized derivation.
    ///
    /// `derive` is not called until the first read.
    pub fn computed<T: 'static>(&self, derive: impl Fn() -> T + 'static) -> Computed<T> {
        Computed::new(self.clone(), derive)
    }

    /// Creates an effect and runs it once immediately.
    ///
    /// The effect lives as long as the returned handle.
    pub fn effect(&self, callback: impl FnMut() + 'static) -> Effect {
        Effect::new(self.clone(), callback)
    }

    /// Runs `f` without registering any read as a dependency.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.run_tracked(None, f).0
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("depth", &self.inner.stack.borrow().len())
            .field("queued", &self.inner.queue.borrow().len())
            .finish()
    }
}
