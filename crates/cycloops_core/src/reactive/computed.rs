//! Lazily evaluated, memoized derivations.

use super::runtime::{NodeId, Runtime, Source, Subscriber, Subscribers};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct ComputedNode<T> {
    id: NodeId,
    runtime: Runtime,
    derive: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    stale: Cell<bool>,
    sources: RefCell<Vec<Rc<dyn Source>>>,
    subscribers: Subscribers,
}

impl<T> Source for ComputedNode<T> {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn subscribe(&self, id: NodeId, subscriber: Weak<dyn Subscriber>) {
        self.subscribers.insert(id, subscriber);
    }

    fn unsubscribe(&self, id: NodeId) {
        self.subscribers.remove(id);
    }
}

impl<T> Subscriber for ComputedNode<T> {
    fn mark_stale(&self) {
        self.stale.set(true);
        self.subscribers.notify();
    }

    fn adopt_sources(&self, sources: Vec<Rc<dyn Source>>) {
        *self.sources.borrow_mut() = sources;
    }
}

impl<T: 'static> ComputedNode<T> {
    fn refresh(self: &Rc<Self>) {
        if !self.stale.get() {
            return;
        }

        let previous = std::mem::take(&mut *self.sources.borrow_mut());
        for source in &previous {
            source.unsubscribe(self.id);
        }
        drop(previous);

        // Cleared before running so a write during evaluation re-stales it.
        self.stale.set(false);
        let restale = RestaleOnUnwind(&self.stale);
        let owner: Weak<dyn Subscriber> = Rc::downgrade(self) as Weak<dyn Subscriber>;
        let (value, sources) = self
            .runtime
            .inner
            .run_tracked(Some((self.id, owner)), || (self.derive)());
        std::mem::forget(restale);

        self.adopt_sources(sources);
        *self.value.borrow_mut() = Some(value);
    }
}

struct RestaleOnUnwind<'a>(&'a Cell<bool>);

impl Drop for RestaleOnUnwind<'_> {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

/// Read-only derived value.
///
/// The derivation runs on first read and again only after one of the signals
/// or computeds it read last time has changed. Reads in between return the
/// cached value.
pub struct Computed<T> {
    node: Rc<ComputedNode<T>>,
}

impl<T: 'static> Computed<T> {
    pub(crate) fn new(runtime: Runtime, derive: impl Fn() -> T + 'static) -> Self {
        let id = runtime.inner.next_id();
        Self {
            node: Rc::new(ComputedNode {
                id,
                runtime,
                derive: Box::new(derive),
                value: RefCell::new(None),
                stale: Cell::new(true),
                sources: RefCell::new(Vec::new()),
                subscribers: Subscribers::default(),
            }),
        }
    }

    /// Returns a clone of the (possibly recomputed) value and tracks the read.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrows the (possibly recomputed) value and tracks the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        // Tracked first, so a reader stays subscribed if the derivation panics.
        self.node.runtime.inner.track(self.node.clone());
        self.node.refresh();
        let value = self.node.value.borrow();
        let value = value
            .as_ref()
            .expect("computed value is populated by refresh");
        f(value)
    }

    /// Whether the next read will re-run the derivation.
    pub fn is_stale(&self) -> bool {
        self.node.stale.get()
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("stale", &self.node.stale.get())
            .finish_non_exhaustive()
    }
}
