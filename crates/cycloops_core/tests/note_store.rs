use cycloops_core::db::open_db;
use cycloops_core::{
    export_geojson_string, export_to_dir, Coordinates, LiveNoteStore, NewNote, Note,
    NoteQuery, NoteRepository, NoteStore, QueryObserver, RepoError, SqliteNoteRepository,
    EXPORT_FILE_NAME,
};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Recorder {
    deliveries: RefCell<Vec<Vec<Note>>>,
}

impl QueryObserver for Recorder {
    fn next(&self, notes: Vec<Note>) {
        self.deliveries.borrow_mut().push(notes);
    }

    fn error(&self, err: &RepoError) {
        panic!("unexpected live query error: {err}");
    }
}

fn new_note(time: i64, text: &str) -> NewNote {
    NewNote::new(time, text, Coordinates::new(10.0, 20.0))
}

#[test]
fn live_query_orders_newest_first_with_unique_ids() {
    let store = LiveNoteStore::open_in_memory().unwrap();
    let recorder = Rc::new(Recorder::default());
    let _subscription = store.live_query(NoteQuery::newest_first(), recorder.clone());

    let a = store.insert(&new_note(300, "a")).unwrap();
    let b = store.insert(&new_note(100, "b")).unwrap();
    let c = store.insert(&new_note(200, "c")).unwrap();
    assert!(a != b && b != c && a != c);

    let deliveries = recorder.deliveries.borrow();
    assert_eq!(deliveries.len(), 4);
    let last: Vec<&str> = deliveries[3].iter().map(|note| note.text.as_str()).collect();
    assert_eq!(last, vec!["a", "c", "b"]);
}

#[test]
fn equal_times_fall_back_to_newest_id_first() {
    let store = LiveNoteStore::open_in_memory().unwrap();
    let first = store.insert(&new_note(50, "first")).unwrap();
    let second = store.insert(&new_note(50, "second")).unwrap();

    let ids: Vec<i64> = store
        .query(&NoteQuery::newest_first())
        .unwrap()
        .iter()
        .map(|note| note.id)
        .collect();
    assert_eq!(ids, vec![second, first]);
}

#[test]
fn invalid_note_is_rejected_without_delivery() {
    let store = LiveNoteStore::open_in_memory().unwrap();
    let recorder = Rc::new(Recorder::default());
    let _subscription = store.live_query(NoteQuery::newest_first(), recorder.clone());

    let err = store
        .insert(&NewNote::new(1, "nowhere", Coordinates::new(91.0, 0.0)))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(recorder.deliveries.borrow().len(), 1);
    assert!(store.query(&NoteQuery::newest_first()).unwrap().is_empty());
}

#[test]
fn ids_are_not_reused_after_delete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycloops.sqlite3");

    let store = LiveNoteStore::open(&path).unwrap();
    store.insert(&new_note(1, "one")).unwrap();
    let second = store.insert(&new_note(2, "two")).unwrap();
    drop(store);

    let conn = open_db(&path).unwrap();
    conn.execute("DELETE FROM notes WHERE id = ?1;", [second])
        .unwrap();
    assert_eq!(SqliteNoteRepository::new(&conn).count_notes().unwrap(), 1);
    drop(conn);

    let store = LiveNoteStore::open(&path).unwrap();
    let third = store.insert(&new_note(3, "three")).unwrap();
    assert!(third > second);
}

#[test]
fn export_lists_notes_in_insertion_order() {
    let store = LiveNoteStore::open_in_memory().unwrap();
    store.insert(&new_note(200, "later")).unwrap();
    store
        .insert(&NewNote::new(100, "earlier", Coordinates::SENTINEL))
        .unwrap();

    let document: Value = serde_json::from_str(&export_geojson_string(&store).unwrap()).unwrap();
    assert_eq!(document["type"], "FeatureCollection");
    let features = document["features"].as_array().unwrap();
    assert_eq!(features.len(), 2);
    assert_eq!(features[0]["properties"]["text"], "later");
    assert_eq!(features[0]["properties"]["timestamp"], 200);
    assert_eq!(features[0]["geometry"]["coordinates"][0], 20.0);
    assert_eq!(features[0]["geometry"]["coordinates"][1], 10.0);
    assert_eq!(features[1]["properties"]["text"], "earlier");
    assert_eq!(features[1]["geometry"]["coordinates"][0], 0.0);
}

#[test]
fn export_of_empty_store_is_an_empty_collection() {
    let store = LiveNoteStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let path = export_to_dir(&store, dir.path()).unwrap();
    assert_eq!(path, dir.path().join(EXPORT_FILE_NAME));

    let document: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(
        document,
        serde_json::json!({ "type": "FeatureCollection", "features": [] })
    );
}
