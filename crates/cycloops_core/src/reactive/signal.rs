//! Mutable reactive cells.

use super::runtime::{NodeId, Runtime, Source, Subscriber, Subscribers};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

struct SignalNode<T> {
    id: NodeId,
    value: RefCell<T>,
    subscribers: Subscribers,
}

impl<T> Source for SignalNode<T> {
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

/// Reactive mutable cell.
///
/// Reading inside a running computed/effect registers that derivation as a
/// dependent. Writing a different value notifies every dependent
/// synchronously.
pub struct Signal<T> {
    node: Rc<SignalNode<T>>,
    runtime: Runtime,
}

impl<T: 'static> Signal<T> {
    pub(crate) fn new(runtime: Runtime, value: T) -> Self {
        let id = runtime.inner.next_id();
        Self {
            node: Rc::new(SignalNode {
                id,
                value: RefCell::new(value),
                subscribers: Subscribers::default(),
            }),
            runtime,
        }
    }

    /// Returns a clone of the current value and tracks the read.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Borrows the current value and tracks the read.
    ///
    /// Writing this signal from inside `f` panics.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.inner.track(self.node.clone());
        f(&self.node.value.borrow())
    }

    /// Returns a clone of the current value without tracking the read.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.node.value.borrow().clone()
    }

    /// Stores `value` and notifies dependents if it differs from the current one.
    ///
    /// Returns `true` when the value changed.
    pub fn set(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        {
            let mut current = self.node.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.notify();
        true
    }

    /// Mutates the value in place and always notifies dependents.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.node.value.borrow_mut());
        self.notify();
    }

    /// Returns a read-only view sharing this cell.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            inner: self.clone(),
        }
    }

    fn notify(&self) {
        self.node.subscribers.notify();
        self.runtime.inner.flush();
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.node.subscribers.len()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T: Debug> Debug for Signal<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signal")
            .field(&*self.node.value.borrow())
            .finish()
    }
}

/// Read-only view of a [`Signal`].
pub struct ReadSignal<T> {
    inner: Signal<T>,
}

impl<T: 'static> ReadSignal<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.get_untracked()
    }
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Debug> Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}
