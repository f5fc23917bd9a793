//! Durable note store with live queries.
//!
//! # Responsibility
//! - Define the store contract consumed by the bridge, form and export.
//! - Provide the SQLite-backed store that redelivers query results on change.
//!
//! # Invariants
//! - A live query delivers its current result on subscription, then the full
//!   ordered result after every successful insert.
//! - Deliveries never nest; inserts issued during delivery schedule one more
//!   full pass instead.

mod live;

pub use live::LiveNoteStore;

use crate::model::note::{NewNote, Note, NoteId};
use crate::repo::note_repo::{NoteQuery, RepoError, RepoResult};
use std::rc::Rc;

/// Receiver of live-query deliveries.
pub trait QueryObserver {
    /// Full, freshly ordered result set.
    fn next(&self, notes: Vec<Note>);
    /// The query could not be evaluated.
    fn error(&self, err: &RepoError);
}

/// Store contract: insert, one-shot query and live query.
pub trait NoteStore {
    /// Persists `note`; the store assigns the id.
    fn insert(&self, note: &NewNote) -> RepoResult<NoteId>;
    fn query(&self, query: &NoteQuery) -> RepoResult<Vec<Note>>;
    fn live_query(
        &self,
        query: NoteQuery,
        observer: Rc<dyn QueryObserver>,
    ) -> LiveQuerySubscription;
}

impl<S: NoteStore + ?Sized> NoteStore for Rc<S> {
    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        (**self).insert(note)
    }

    fn query(&self, query: &NoteQuery) -> RepoResult<Vec<Note>> {
        (**self).query(query)
    }

    fn live_query(
        &self,
        query: NoteQuery,
        observer: Rc<dyn QueryObserver>,
    ) -> LiveQuerySubscription {
        (**self).live_query(query, observer)
    }
}

/// Handle keeping a live query registered. Dropping it unsubscribes.
#[must_use = "dropping a LiveQuerySubscription unsubscribes immediately"]
pub struct LiveQuerySubscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl LiveQuerySubscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops further deliveries.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for LiveQuerySubscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for LiveQuerySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuerySubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
