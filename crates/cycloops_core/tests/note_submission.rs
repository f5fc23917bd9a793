use async_trait::async_trait;
use cycloops_core::{
    AppState, Coordinates, FixedLocation, GeolocationError, GeolocationProvider,
    LiveQuerySubscription, LiveNoteStore, NewNote, NoLocation, Note, NoteId, NoteQuery,
    NoteService, NoteStore, QueryObserver, RepoError, RepoResult, Runtime, StoreBridge,
    SubmitError,
};
use futures::channel::oneshot;
use futures::executor::block_on;
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;

const T0: i64 = 1_700_000_000_000;

/// Position that resolves only when the test sends it.
struct PendingLocation {
    receiver: RefCell<Option<oneshot::Receiver<Coordinates>>>,
    log: Rc<RefCell<Vec<&'static str>>>,
}

#[async_trait(?Send)]
impl GeolocationProvider for PendingLocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        self.log.borrow_mut().push("geolocation");
        let receiver = self
            .receiver
            .borrow_mut()
            .take()
            .ok_or_else(|| GeolocationError::Other("already requested".to_string()))?;
        receiver
            .await
            .map_err(|_| GeolocationError::PositionUnavailable)
    }
}

struct DeniedLocation;

#[async_trait(?Send)]
impl GeolocationProvider for DeniedLocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::PermissionDenied)
    }
}

struct FailingStore;

impl NoteStore for FailingStore {
    fn insert(&self, _note: &NewNote) -> RepoResult<NoteId> {
        Err(RepoError::InvalidData("disk full".to_string()))
    }

    fn query(&self, _query: &NoteQuery) -> RepoResult<Vec<Note>> {
        Ok(Vec::new())
    }

    fn live_query(
        &self,
        _query: NoteQuery,
        _observer: Rc<dyn QueryObserver>,
    ) -> LiveQuerySubscription {
        LiveQuerySubscription::new(|| {})
    }
}

fn only_note(store: &LiveNoteStore) -> Note {
    let mut notes = store.query(&NoteQuery::newest_first()).unwrap();
    assert_eq!(notes.len(), 1);
    notes.remove(0)
}

#[test]
fn submit_stores_text_time_and_position_then_clears_draft() {
    let runtime = Runtime::new();
    let (state, writers) = AppState::new(&runtime);
    let store = Rc::new(LiveNoteStore::open_in_memory().unwrap());
    let _bridge = StoreBridge::connect(store.clone(), writers.notes);
    let service = NoteService::with_clock(
        store.clone(),
        FixedLocation(Coordinates::new(50.0, 50.0)),
        || T0,
        writers.submitting,
    );

    service.set_draft("Test message");
    let id = block_on(service.submit()).unwrap();

    let note = only_note(&store);
    assert_eq!(note.id, id);
    assert_eq!(note.text, "Test message");
    assert_eq!(note.time, T0);
    assert_eq!((note.lat, note.lon), (50.0, 50.0));
    assert_eq!(service.draft(), "");
    assert!(!service.is_submitting());
    assert_eq!(state.notes.get_untracked().len(), 1);
}

#[test]
fn unavailable_position_falls_back_to_sentinel() {
    let runtime = Runtime::new();
    let (_state, writers) = AppState::new(&runtime);
    let store = Rc::new(LiveNoteStore::open_in_memory().unwrap());
    let service = NoteService::new(store.clone(), DeniedLocation, writers.submitting);

    block_on(service.submit()).unwrap();

    let note = only_note(&store);
    assert_eq!(note.text, "");
    assert!(note.coordinates().is_sentinel());
}

#[test]
fn no_location_provider_also_uses_sentinel() {
    let runtime = Runtime::new();
    let (_state, writers) = AppState::new(&runtime);
    let store = Rc::new(LiveNoteStore::open_in_memory().unwrap());
    let service = NoteService::new(store.clone(), NoLocation, writers.submitting);

    service.set_draft("offline");
    block_on(service.submit()).unwrap();
    assert_eq!(only_note(&store).coordinates(), Coordinates::SENTINEL);
}

#[test]
fn time_is_captured_before_position_and_second_submit_is_rejected() {
    let runtime = Runtime::new();
    let (state, writers) = AppState::new(&runtime);
    let store = Rc::new(LiveNoteStore::open_in_memory().unwrap());
    let log = Rc::new(RefCell::new(Vec::new()));
    let (sender, receiver) = oneshot::channel();
    let service = NoteService::with_clock(
        store.clone(),
        PendingLocation {
            receiver: RefCell::new(Some(receiver)),
            log: log.clone(),
        },
        {
            let log = log.clone();
            move || {
                log.borrow_mut().push("clock");
                T0
            }
        },
        writers.submitting,
    );

    service.set_draft("slow fix");
    let mut first = Box::pin(service.submit());
    assert!(first.as_mut().now_or_never().is_none());
    assert!(service.is_submitting());
    assert!(state.submitting.get_untracked());
    assert_eq!(*log.borrow(), vec!["clock", "geolocation"]);

    let second = block_on(service.submit());
    assert!(matches!(second, Err(SubmitError::InFlight)));

    sender.send(Coordinates::new(1.0, 2.0)).unwrap();
    block_on(first).unwrap();

    assert!(!service.is_submitting());
    assert_eq!(only_note(&store).time, T0);
}

#[test]
fn abandoned_submission_clears_in_flight_flag() {
    let runtime = Runtime::new();
    let (_state, writers) = AppState::new(&runtime);
    let store = Rc::new(LiveNoteStore::open_in_memory().unwrap());
    let (_sender, receiver) = oneshot::channel();
    let service = NoteService::new(
        store.clone(),
        PendingLocation {
            receiver: RefCell::new(Some(receiver)),
            log: Rc::new(RefCell::new(Vec::new())),
        },
        writers.submitting,
    );

    let mut pending = Box::pin(service.submit());
    assert!(pending.as_mut().now_or_never().is_none());
    assert!(service.is_submitting());

    drop(pending);
    assert!(!service.is_submitting());
    assert!(store.query(&NoteQuery::newest_first()).unwrap().is_empty());
}

#[test]
fn store_failure_keeps_draft_for_retry() {
    let runtime = Runtime::new();
    let (_state, writers) = AppState::new(&runtime);
    let service = NoteService::new(
        FailingStore,
        FixedLocation(Coordinates::new(1.0, 1.0)),
        writers.submitting,
    );

    service.set_draft("keep me");
    let err = block_on(service.submit()).unwrap_err();

    assert!(matches!(err, SubmitError::Store(RepoError::InvalidData(_))));
    assert_eq!(service.draft(), "keep me");
    assert!(!service.is_submitting());
}
