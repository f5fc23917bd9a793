//! Store bridge: turns the newest-first live query into the `notes` signal.
//!
//! # Responsibility
//! - Keep `notes` equal to the latest live-query delivery.
//! - Forward note inserts to the store.
//!
//! # Invariants
//! - The bridge is the only writer of `notes`.
//! - A failed delivery leaves `notes` unchanged (stale but consistent).

use crate::model::note::{NewNote, Note, NoteId};
use crate::repo::note_repo::{NoteQuery, RepoError, RepoResult};
use crate::state::NotesWriter;
use crate::store::{LiveQuerySubscription, NoteStore, QueryObserver};
use log::{debug, error};
use std::rc::Rc;

struct NotesFeed {
    writer: NotesWriter,
}

impl QueryObserver for NotesFeed {
    fn next(&self, notes: Vec<Note>) {
        let count = notes.len();
        let changed = self.writer.set(notes);
        debug!("event=notes_feed module=bridge status=delivered count={count} changed={changed}");
    }

    fn error(&self, err: &RepoError) {
        error!("event=notes_feed module=bridge status=error keeping_stale=true error={err}");
    }
}

/// Live connection between a [`NoteStore`] and the `notes` signal.
///
/// Dropping the bridge ends the live query; `notes` keeps its last value.
pub struct StoreBridge<S: NoteStore> {
    store: S,
    _subscription: LiveQuerySubscription,
}

impl<S: NoteStore> StoreBridge<S> {
    /// Subscribes to all notes ordered newest first and starts feeding `notes`.
    pub fn connect(store: S, writer: NotesWriter) -> Self {
        let feed: Rc<dyn QueryObserver> = Rc::new(NotesFeed { writer });
        let subscription = store.live_query(NoteQuery::newest_first(), feed);
        Self {
            store,
            _subscription: subscription,
        }
    }

    /// Inserts a note. The resulting `notes` update arrives through the live
    /// query, not through this return value.
    pub fn add(&self, note: &NewNote) -> RepoResult<NoteId> {
        self.store.insert(note)
    }
}
