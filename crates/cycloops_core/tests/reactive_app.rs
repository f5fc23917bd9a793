use cycloops_core::geo::BoundingBox;
use cycloops_core::projections::Locations;
use cycloops_core::{
    AppState, Coordinates, FocusBridge, IntersectionEntry, IntersectionObserver, ListEntry,
    ListReactor, ListSurface, LiveNoteStore, MapReactor, MapSource, MapSurface, NewNote, NoteId,
    NoteProjections, Runtime, StoreBridge, VisibilityTracker,
};
use std::cell::RefCell;
use std::rc::Rc;

const MINUTE_MS: i64 = 60_000;
const T0: i64 = 1_700_000_000_000;

/// Records list rebuilds and observer calls in one shared log.
#[derive(Default)]
struct HostLog {
    events: RefCell<Vec<String>>,
    rows: RefCell<Vec<String>>,
}

impl HostLog {
    fn take_events(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

impl ListSurface for HostLog {
    fn replace_all(&self, entries: &[ListEntry]) {
        self.events
            .borrow_mut()
            .push(format!("render:{}", entries.len()));
        *self.rows.borrow_mut() = entries.iter().map(|entry| entry.text().to_string()).collect();
    }
}

struct SharedObserver(Rc<HostLog>);

impl IntersectionObserver for SharedObserver {
    fn observe(&self, id: NoteId) {
        self.0.events.borrow_mut().push(format!("observe:{id}"));
    }

    fn unobserve(&self, id: NoteId) {
        self.0.events.borrow_mut().push(format!("unobserve:{id}"));
    }
}

#[derive(Default)]
struct FakeMap {
    notes_layer: RefCell<Vec<Vec<NoteId>>>,
    focus_layer: RefCell<Vec<Vec<NoteId>>>,
    fits: RefCell<Vec<(BoundingBox, u32)>>,
}

fn ids(locations: &Locations) -> Vec<NoteId> {
    locations
        .features
        .iter()
        .map(|feature| feature.properties.id)
        .collect()
}

impl MapSurface for FakeMap {
    fn set_source_data(&self, source: MapSource, data: &Locations) {
        match source {
            MapSource::Notes => self.notes_layer.borrow_mut().push(ids(data)),
            MapSource::Focus => self.focus_layer.borrow_mut().push(ids(data)),
        }
    }

    fn fit_bounds(&self, bounds: BoundingBox, padding: u32) {
        self.fits.borrow_mut().push((bounds, padding));
    }
}

struct App {
    runtime: Runtime,
    state: AppState,
    bridge: StoreBridge<Rc<LiveNoteStore>>,
    projections: NoteProjections,
    tracker: Rc<VisibilityTracker<SharedObserver>>,
    focus: FocusBridge,
    host: Rc<HostLog>,
    list: ListReactor,
}

fn mount_app() -> App {
    let runtime = Runtime::new();
    let (state, writers) = AppState::new(&runtime);
    let store = Rc::new(LiveNoteStore::open_in_memory().unwrap());
    let bridge = StoreBridge::connect(store, writers.notes);
    let projections = NoteProjections::new(&runtime, &state);
    let host = Rc::new(HostLog::default());
    let tracker = Rc::new(VisibilityTracker::new(
        SharedObserver(host.clone()),
        writers.visible,
    ));
    let list = ListReactor::mount(&runtime, &state, tracker.clone(), host.clone());
    App {
        runtime,
        state,
        bridge,
        projections,
        tracker,
        focus: FocusBridge::new(writers.focus),
        host,
        list,
    }
}

#[test]
fn inserted_notes_flow_into_projections_newest_first() {
    let app = mount_app();
    assert!(app.projections.note_locations.get().is_empty());

    let first = app
        .bridge
        .add(&NewNote::new(T0, "Note 1", Coordinates::new(10.0, 10.0)))
        .unwrap();
    let second = app
        .bridge
        .add(&NewNote::new(T0 + 5 * MINUTE_MS, "Note 2", Coordinates::new(10.1, 10.1)))
        .unwrap();

    let all = app.projections.note_locations.get();
    assert_eq!(ids(&all), vec![second, first]);
    assert_eq!(all.features[1].geometry.coordinates, [10.0, 10.0]);
    assert_eq!(app.state.notes.get_untracked().len(), 2);
}

#[test]
fn list_renders_deltas_between_notes() {
    let app = mount_app();
    app.bridge
        .add(&NewNote::new(T0, "Note 1", Coordinates::new(10.0, 10.0)))
        .unwrap();
    app.bridge
        .add(&NewNote::new(T0 + 5 * MINUTE_MS, "Note 2", Coordinates::new(10.1, 10.1)))
        .unwrap();

    assert_eq!(
        *app.host.rows.borrow(),
        vec!["Note 2", "5 minutes · 15.6 km", "Note 1"]
    );
    assert_eq!(app.list.entries().len(), 3);
}

#[test]
fn list_rebuild_releases_observations_before_rendering() {
    let app = mount_app();
    let first = app
        .bridge
        .add(&NewNote::new(T0, "a", Coordinates::SENTINEL))
        .unwrap();
    app.host.take_events();

    let second = app
        .bridge
        .add(&NewNote::new(T0 + 1, "b", Coordinates::SENTINEL))
        .unwrap();

    assert_eq!(
        app.host.take_events(),
        vec![
            format!("unobserve:{first}"),
            "render:3".to_string(),
            format!("observe:{second}"),
            format!("observe:{first}"),
        ]
    );
    assert_eq!(app.tracker.observed().len(), 2);
}

#[test]
fn map_follows_visibility_and_focus() {
    let app = mount_app();
    let a = app
        .bridge
        .add(&NewNote::new(T0, "a", Coordinates::new(10.0, 20.0)))
        .unwrap();
    let b = app
        .bridge
        .add(&NewNote::new(T0 + 1, "b", Coordinates::new(12.0, 24.0)))
        .unwrap();

    let map = Rc::new(FakeMap::default());
    let _map = MapReactor::mount(&app.runtime, &app.projections, map.clone());

    // Nothing visible yet: notes layer untouched, focus layer cleared.
    assert!(map.notes_layer.borrow().is_empty());
    assert_eq!(*map.focus_layer.borrow(), vec![Vec::<NoteId>::new()]);

    app.tracker
        .on_intersections(&[IntersectionEntry::entered(a), IntersectionEntry::entered(b)]);
    assert_eq!(*map.notes_layer.borrow(), vec![vec![b, a]]);
    let (bounds, padding) = map.fits.borrow()[0];
    assert_eq!(bounds.as_array(), [20.0, 10.0, 24.0, 12.0]);
    assert_eq!(padding, 100);

    app.focus.focus_in(Some(a));
    assert_eq!(map.focus_layer.borrow().last(), Some(&vec![a]));
    app.focus.focus_out();
    assert_eq!(map.focus_layer.borrow().last(), Some(&Vec::new()));

    // Scrolling everything out keeps the last framed view.
    app.tracker
        .on_intersections(&[IntersectionEntry::left(a), IntersectionEntry::left(b)]);
    assert_eq!(map.notes_layer.borrow().len(), 1);
    assert_eq!(map.fits.borrow().len(), 1);
}

#[test]
fn visible_ids_of_removed_rows_are_pruned_on_rebuild() {
    let app = mount_app();
    let a = app
        .bridge
        .add(&NewNote::new(T0, "a", Coordinates::SENTINEL))
        .unwrap();
    app.tracker.on_intersections(&[
        IntersectionEntry::entered(a),
        IntersectionEntry::entered(999),
    ]);
    assert_eq!(app.state.visible.get_untracked().len(), 2);

    app.bridge
        .add(&NewNote::new(T0 + 1, "b", Coordinates::SENTINEL))
        .unwrap();

    assert_eq!(
        app.state.visible.get_untracked().into_iter().collect::<Vec<_>>(),
        vec![a]
    );
    assert_eq!(ids(&app.projections.visible_locations.get()), vec![a]);
}
