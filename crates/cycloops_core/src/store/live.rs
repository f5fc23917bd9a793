//! SQLite-backed live note store.

use super::{LiveQuerySubscription, NoteStore, QueryObserver};
use crate::db::{open_db, open_db_in_memory};
use crate::model::note::{NewNote, Note, NoteId};
use crate::repo::note_repo::{NoteQuery, NoteRepository, RepoResult, SqliteNoteRepository};
use log::{error, info};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

struct LiveQueryEntry {
    id: u64,
    query: NoteQuery,
    observer: Rc<dyn QueryObserver>,
}

type Registry = Rc<RefCell<Vec<LiveQueryEntry>>>;

/// Note store owning one SQLite connection and its live-query registry.
///
/// Single-threaded: share it as `Rc<LiveNoteStore>`.
pub struct LiveNoteStore {
    conn: Connection,
    registry: Registry,
    next_subscription: Cell<u64>,
    delivering: Cell<bool>,
    redeliver: Cell<bool>,
}

impl LiveNoteStore {
    /// Opens (or creates) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps a migrated connection after verifying the schema.
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        SqliteNoteRepository::try_new(&conn)?;
        Ok(Self {
            conn,
            registry: Rc::new(RefCell::new(Vec::new())),
            next_subscription: Cell::new(0),
            delivering: Cell::new(false),
            redeliver: Cell::new(false),
        })
    }

    /// Number of registered live queries.
    pub fn live_query_count(&self) -> usize {
        self.registry.borrow().len()
    }

    fn repo(&self) -> SqliteNoteRepository<'_> {
        SqliteNoteRepository::new(&self.conn)
    }

    /// Delivers results to `only` (or everyone), then keeps doing full passes
    /// while deliveries triggered more inserts or subscriptions.
    fn publish(&self, only: Option<u64>) {
        if self.delivering.replace(true) {
            self.redeliver.set(true);
            return;
        }
        let _guard = DeliveringGuard(&self.delivering);

        let mut target = only;
        loop {
            self.redeliver.set(false);
            let entries: Vec<(NoteQuery, Rc<dyn QueryObserver>)> = self
                .registry
                .borrow()
                .iter()
                .filter(|entry| target.map_or(true, |id| id == entry.id))
                .map(|entry| (entry.query.clone(), entry.observer.clone()))
                .collect();

            for (query, observer) in entries {
                self.deliver(&query, observer.as_ref());
            }

            if !self.redeliver.get() {
                break;
            }
            target = None;
        }
    }

    fn deliver(&self, query: &NoteQuery, observer: &dyn QueryObserver) {
        match self.repo().list_notes(query) {
            Ok(notes) => observer.next(notes),
            Err(err) => {
                error!(
                    "event=live_query module=store status=error order={:?} error={}",
                    query.order, err
                );
                observer.error(&err);
            }
        }
    }
}

struct DeliveringGuard<'a>(&'a Cell<bool>);

impl Drop for DeliveringGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl NoteStore for LiveNoteStore {
    fn insert(&self, note: &NewNote) -> RepoResult<NoteId> {
        let started_at = Instant::now();
        let id = match self.repo().create_note(note) {
            Ok(id) => id,
            Err(err) => {
                error!(
                    "event=note_insert module=store status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        };
        info!(
            "event=note_insert module=store status=ok id={} sentinel_location={} duration_ms={}",
            id,
            note.coordinates().is_sentinel(),
            started_at.elapsed().as_millis()
        );

        self.publish(None);
        Ok(id)
    }

    fn query(&self, query: &NoteQuery) -> RepoResult<Vec<Note>> {
        self.repo().list_notes(query)
    }

    fn live_query(
        &self,
        query: NoteQuery,
        observer: Rc<dyn QueryObserver>,
    ) -> LiveQuerySubscription {
        let id = self.next_subscription.get();
        self.next_subscription.set(id + 1);
        self.registry.borrow_mut().push(LiveQueryEntry {
            id,
            query,
            observer,
        });
        info!("event=live_query module=store status=subscribed subscription={id}");

        self.publish(Some(id));

        let registry = Rc::downgrade(&self.registry);
        LiveQuerySubscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().retain(|entry| entry.id != id);
                info!("event=live_query module=store status=unsubscribed subscription={id}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::LiveNoteStore;
    use crate::model::note::{Coordinates, NewNote, Note};
    use crate::repo::note_repo::{NoteQuery, RepoError};
    use crate::store::{NoteStore, QueryObserver};
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    #[derive(Default)]
    struct Recorder {
        deliveries: RefCell<Vec<Vec<i64>>>,
    }

    impl QueryObserver for Recorder {
        fn next(&self, notes: Vec<Note>) {
            self.deliveries
                .borrow_mut()
                .push(notes.iter().map(|note| note.id).collect());
        }

        fn error(&self, _err: &RepoError) {}
    }

    fn new_note(time: i64) -> NewNote {
        NewNote::new(time, format!("note at {time}"), Coordinates::SENTINEL)
    }

    #[test]
    fn live_query_delivers_initial_and_post_insert_results() {
        let store = LiveNoteStore::open_in_memory().unwrap();
        let recorder = Rc::new(Recorder::default());
        let _subscription = store.live_query(NoteQuery::newest_first(), recorder.clone());

        let first = store.insert(&new_note(100)).unwrap();
        let second = store.insert(&new_note(200)).unwrap();

        assert_eq!(
            *recorder.deliveries.borrow(),
            vec![vec![], vec![first], vec![second, first]]
        );
    }

    #[test]
    fn dropping_subscription_stops_deliveries() {
        let store = LiveNoteStore::open_in_memory().unwrap();
        let recorder = Rc::new(Recorder::default());
        let subscription = store.live_query(NoteQuery::newest_first(), recorder.clone());
        assert_eq!(store.live_query_count(), 1);

        subscription.unsubscribe();
        assert_eq!(store.live_query_count(), 0);
        store.insert(&new_note(1)).unwrap();
        assert_eq!(recorder.deliveries.borrow().len(), 1);
    }

    struct InsertOnFirstDelivery {
        store: Weak<LiveNoteStore>,
        deliveries: RefCell<Vec<usize>>,
    }

    impl QueryObserver for InsertOnFirstDelivery {
        fn next(&self, notes: Vec<Note>) {
            self.deliveries.borrow_mut().push(notes.len());
            if notes.len() == 1 {
                if let Some(store) = self.store.upgrade() {
                    store.insert(&new_note(5)).unwrap();
                }
            }
        }

        fn error(&self, _err: &RepoError) {}
    }

    #[test]
    fn insert_during_delivery_triggers_one_more_full_pass() {
        let store = Rc::new(LiveNoteStore::open_in_memory().unwrap());
        let observer = Rc::new(InsertOnFirstDelivery {
            store: Rc::downgrade(&store),
            deliveries: RefCell::new(Vec::new()),
        });
        let _subscription = store.live_query(NoteQuery::newest_first(), observer.clone());

        store.insert(&new_note(1)).unwrap();

        assert_eq!(*observer.deliveries.borrow(), vec![0, 1, 2]);
    }
}
