//! Visibility tracker: folds viewport intersection batches into `visible`.
//!
//! # Responsibility
//! - Register rendered note elements with the intersection provider.
//! - Turn each batch of intersection changes into exactly one `visible` write.
//!
//! # Invariants
//! - An id is in `visible` iff its latest observation was "intersecting".
//! - Observations are released before a rebuild and re-registered after it.
//! - Ids that are no longer rendered are pruned from `visible` on re-registration.
//!
//! Per element: `unobserved -> observed(out) <-> observed(in) -> unobserved`.

use crate::model::note::NoteId;
use crate::state::{VisibleSet, VisibleWriter};
use log::debug;
use std::cell::RefCell;
use std::collections::BTreeSet;

/// Viewport intersection provider (host side).
pub trait IntersectionObserver {
    fn observe(&self, id: NoteId);
    fn unobserve(&self, id: NoteId);
}

/// One intersection change reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    /// Id attached to the element; `None` for rows that are not notes.
    pub note_id: Option<NoteId>,
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    pub fn entered(id: NoteId) -> Self {
        Self {
            note_id: Some(id),
            is_intersecting: true,
        }
    }

    pub fn left(id: NoteId) -> Self {
        Self {
            note_id: Some(id),
            is_intersecting: false,
        }
    }
}

/// Applies a batch of entries, in order, to a copy of `current`.
pub fn fold_intersections(current: &VisibleSet, entries: &[IntersectionEntry]) -> VisibleSet {
    let mut next = current.clone();
    for entry in entries {
        let Some(id) = entry.note_id else {
            continue;
        };
        if entry.is_intersecting {
            next.insert(id);
        } else {
            next.remove(&id);
        }
    }
    next
}

/// Owner of the `visible` signal.
pub struct VisibilityTracker<O: IntersectionObserver> {
    observer: O,
    observed: RefCell<BTreeSet<NoteId>>,
    writer: VisibleWriter,
}

impl<O: IntersectionObserver> VisibilityTracker<O> {
    pub fn new(observer: O, writer: VisibleWriter) -> Self {
        Self {
            observer,
            observed: RefCell::new(BTreeSet::new()),
            writer,
        }
    }

    /// Folds one provider batch into `visible` with a single write.
    pub fn on_intersections(&self, entries: &[IntersectionEntry]) {
        let next = fold_intersections(&self.writer.current(), entries);
        let changed = self.writer.set(next);
        debug!(
            "event=visibility_batch module=visibility status=ok entries={} changed={changed}",
            entries.len()
        );
    }

    /// Starts observing each id that is not observed yet.
    pub fn observe_all(&self, ids: impl IntoIterator<Item = NoteId>) {
        let mut observed = self.observed.borrow_mut();
        for id in ids {
            if observed.insert(id) {
                self.observer.observe(id);
            }
        }
    }

    /// Stops observing every element.
    pub fn release_all(&self) {
        let released = std::mem::take(&mut *self.observed.borrow_mut());
        for id in released {
            self.observer.unobserve(id);
        }
    }

    /// Prunes `visible` to `rendered` and observes every rendered element.
    ///
    /// Second half of a list rebuild: call [`release_all`](Self::release_all)
    /// before replacing the rows and this once they are in place. `visible`
    /// is written at most once, and only when pruning removed ids.
    pub fn observe_rendered(&self, rendered: &[NoteId]) {
        let rendered_set: BTreeSet<NoteId> = rendered.iter().copied().collect();
        let current = self.writer.current();
        let pruned: VisibleSet = current.intersection(&rendered_set).copied().collect();
        if pruned.len() != current.len() {
            debug!(
                "event=visibility_prune module=visibility status=ok removed={}",
                current.len() - pruned.len()
            );
            self.writer.set(pruned);
        }

        self.observe_all(rendered.iter().copied());
    }

    /// Ids currently registered with the provider.
    pub fn observed(&self) -> Vec<NoteId> {
        self.observed.borrow().iter().copied().collect()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::{fold_intersections, IntersectionEntry, IntersectionObserver, VisibilityTracker};
    use crate::model::note::NoteId;
    use crate::reactive::Runtime;
    use crate::state::{AppState, VisibleSet};
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeSet;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingObserver {
        calls: RefCell<Vec<String>>,
    }

    impl IntersectionObserver for RecordingObserver {
        fn observe(&self, id: NoteId) {
            self.calls.borrow_mut().push(format!("observe:{id}"));
        }

        fn unobserve(&self, id: NoteId) {
            self.calls.borrow_mut().push(format!("unobserve:{id}"));
        }
    }

    #[test]
    fn fold_adds_and_removes_in_order() {
        let current = VisibleSet::from([1, 2]);
        let next = fold_intersections(
            &current,
            &[
                IntersectionEntry::entered(3),
                IntersectionEntry::left(1),
                IntersectionEntry {
                    note_id: None,
                    is_intersecting: true,
                },
                IntersectionEntry::left(3),
                IntersectionEntry::entered(3),
            ],
        );
        assert_eq!(next, VisibleSet::from([2, 3]));
        assert_eq!(current, VisibleSet::from([1, 2]), "input untouched");
    }

    #[test]
    fn enter_then_leave_toggles_membership() {
        let rt = Runtime::new();
        let (state, writers) = AppState::new(&rt);
        let tracker = VisibilityTracker::new(RecordingObserver::default(), writers.visible);

        tracker.on_intersections(&[IntersectionEntry::entered(1)]);
        assert_eq!(state.visible.get_untracked(), BTreeSet::from([1]));

        tracker.on_intersections(&[IntersectionEntry::left(1)]);
        assert!(state.visible.get_untracked().is_empty());
    }

    #[test]
    fn one_notification_per_batch() {
        let rt = Runtime::new();
        let (state, writers) = AppState::new(&rt);
        let tracker = VisibilityTracker::new(RecordingObserver::default(), writers.visible);
        let runs = Rc::new(Cell::new(0));
        let _effect = rt.effect({
            let visible = state.visible.clone();
            let runs = runs.clone();
            move || {
                visible.with(|_| ());
                runs.set(runs.get() + 1);
            }
        });

        let batch: Vec<IntersectionEntry> = (1..=50).map(IntersectionEntry::entered).collect();
        tracker.on_intersections(&batch);
        assert_eq!(runs.get(), 2);
        assert_eq!(state.visible.get_untracked().len(), 50);
    }

    #[test]
    fn release_then_observe_rendered_prunes_stale_ids() {
        let rt = Runtime::new();
        let (state, writers) = AppState::new(&rt);
        let tracker = VisibilityTracker::new(RecordingObserver::default(), writers.visible);

        tracker.observe_all([1, 2]);
        tracker.on_intersections(&[IntersectionEntry::entered(1), IntersectionEntry::entered(2)]);
        tracker.observer().calls.borrow_mut().clear();

        tracker.release_all();
        tracker.observe_rendered(&[2, 3]);

        assert_eq!(
            *tracker.observer().calls.borrow(),
            vec!["unobserve:1", "unobserve:2", "observe:2", "observe:3"]
        );
        assert_eq!(tracker.observed(), vec![2, 3]);
        assert_eq!(state.visible.get_untracked(), BTreeSet::from([2]));
    }
}
