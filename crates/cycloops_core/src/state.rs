//! Application state container.
//!
//! # Responsibility
//! - Own the process-wide `notes`, `visible`, `focus` and `submitting` cells.
//! - Hand out exactly one writer per cell so each has a single owner.
//!
//! # Invariants
//! - Writers are not `Clone`; whoever holds one is the only writer.
//! - Readers get `ReadSignal`s and can never write.

use crate::model::note::{Note, NoteId};
use crate::reactive::{ReadSignal, Runtime, Signal};
use std::collections::BTreeSet;
use std::rc::Rc;

/// Ordered note snapshot as delivered by the store (newest first).
pub type NoteList = Rc<Vec<Note>>;

/// Ids of notes whose rendered element currently intersects the viewport.
pub type VisibleSet = BTreeSet<NoteId>;

/// Read side of the application state. Cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    pub notes: ReadSignal<NoteList>,
    pub visible: ReadSignal<VisibleSet>,
    /// `None` when nothing is focused.
    pub focus: ReadSignal<Option<NoteId>>,
    /// `true` while a note submission is in flight.
    pub submitting: ReadSignal<bool>,
}

/// Write side of the application state, split per owning component.
#[derive(Debug)]
pub struct StateWriters {
    pub notes: NotesWriter,
    pub visible: VisibleWriter,
    pub focus: FocusWriter,
    pub submitting: SubmittingWriter,
}

impl AppState {
    /// Creates empty state on `runtime`.
    pub fn new(runtime: &Runtime) -> (Self, StateWriters) {
        let notes = runtime.signal::<NoteList>(Rc::new(Vec::new()));
        let visible = runtime.signal(VisibleSet::new());
        let focus = runtime.signal::<Option<NoteId>>(None);
        let submitting = runtime.signal(false);

        let state = Self {
            notes: notes.read_only(),
            visible: visible.read_only(),
            focus: focus.read_only(),
            submitting: submitting.read_only(),
        };
        let writers = StateWriters {
            notes: NotesWriter(notes),
            visible: VisibleWriter(visible),
            focus: FocusWriter(focus),
            submitting: SubmittingWriter(submitting),
        };
        (state, writers)
    }
}

/// Sole writer of `notes`; owned by the store bridge.
#[derive(Debug)]
pub struct NotesWriter(Signal<NoteList>);

impl NotesWriter {
    /// Replaces the whole note snapshot. Returns `true` when it changed.
    pub fn set(&self, notes: Vec<Note>) -> bool {
        self.0.set(Rc::new(notes))
    }
}

/// Sole writer of `visible`; owned by the visibility tracker.
#[derive(Debug)]
pub struct VisibleWriter(Signal<VisibleSet>);

impl VisibleWriter {
    pub fn set(&self, visible: VisibleSet) -> bool {
        self.0.set(visible)
    }

    /// Current set without tracking the read.
    pub fn current(&self) -> VisibleSet {
        self.0.get_untracked()
    }
}

/// Sole writer of `focus`; owned by the focus bridge.
#[derive(Debug)]
pub struct FocusWriter(Signal<Option<NoteId>>);

impl FocusWriter {
    pub fn set(&self, focus: Option<NoteId>) -> bool {
        self.0.set(focus)
    }
}

/// Sole writer of `submitting`; owned by the note form.
#[derive(Debug)]
pub struct SubmittingWriter(Signal<bool>);

impl SubmittingWriter {
    pub fn set(&self, submitting: bool) -> bool {
        self.0.set(submitting)
    }

    pub fn current(&self) -> bool {
        self.0.get_untracked()
    }
}
