//! Side-effecting subscribers.

use super::runtime::{NodeId, Runtime, Source, Subscriber};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub(crate) struct EffectNode {
    id: NodeId,
    runtime: Runtime,
    callback: RefCell<Box<dyn FnMut()>>,
    sources: RefCell<Vec<Rc<dyn Source>>>,
    queued: Cell<bool>,
    disposed: Cell<bool>,
    this: Weak<EffectNode>,
}

impl Subscriber for EffectNode {
    fn mark_stale(&self) {
        if self.disposed.get() || self.queued.replace(true) {
            return;
        }
        if let Some(this) = self.this.upgrade() {
            self.runtime.inner.enqueue(this);
        }
    }

    fn adopt_sources(&self, sources: Vec<Rc<dyn Source>>) {
        if self.disposed.get() {
            // Disposed from inside its own body.
            for source in &sources {
                source.unsubscribe(self.id);
            }
            return;
        }
        *self.sources.borrow_mut() = sources;
    }
}

impl EffectNode {
    pub(crate) fn run(self: &Rc<Self>) {
        self.queued.set(false);
        if self.disposed.get() {
            return;
        }

        self.release_sources();
        let owner: Weak<dyn Subscriber> = self.this.clone();
        let ((), sources) = self
            .runtime
            .inner
            .run_tracked(Some((self.id, owner)), || {
                let mut callback = self.callback.borrow_mut();
                callback();
            });
        self.adopt_sources(sources);
    }

    pub(crate) fn clear_queued(&self) {
        self.queued.set(false);
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.release_sources();
    }

    fn release_sources(&self) {
        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in &sources {
            source.unsubscribe(self.id);
        }
    }
}

/// Owning handle of a running effect.
///
/// The callback re-runs synchronously whenever anything it read during its
/// previous run changes. Dropping the handle disposes the effect.
#[must_use = "dropping an Effect disposes it immediately"]
pub struct Effect {
    node: Rc<EffectNode>,
}

impl Effect {
    pub(crate) fn new(runtime: Runtime, callback: impl FnMut() + 'static) -> Self {
        let id = runtime.inner.next_id();
        let node = Rc::new_cyclic(|this| EffectNode {
            id,
            runtime: runtime.clone(),
            callback: RefCell::new(Box::new(callback)),
            sources: RefCell::new(Vec::new()),
            queued: Cell::new(false),
            disposed: Cell::new(false),
            this: this.clone(),
        });
        runtime.inner.run_now(&node);
        Self { node }
    }

    /// Stops notifications and releases every dependency edge.
    pub fn dispose(&self) {
        self.node.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.node.disposed.get()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.node.dispose();
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("disposed", &self.node.disposed.get())
            .finish_non_exhaustive()
    }
}
