//! List rendering: view model of notes and interstitial deltas, plus the
//! reactor that reconciles it onto a host surface.
//!
//! # Responsibility
//! - Derive note rows and "time · distance" delta rows from `notes`.
//! - Rebuild the host list whenever `notes` changes, keeping visibility
//!   observations in step with the rendered rows.
//!
//! # Invariants
//! - Rows mirror `notes` order (newest first); one delta sits between each
//!   consecutive pair.
//! - Every observation is released before a rebuild and re-registered after.

use crate::geo::{format_distance_km, haversine_km};
use crate::humanize::format_elapsed_strict;
use crate::model::note::{Note, NoteId};
use crate::reactive::{Computed, Effect, Runtime};
use crate::state::AppState;
use crate::visibility::{IntersectionObserver, VisibilityTracker};
use log::debug;
use std::rc::Rc;

/// Elapsed time and distance between two consecutive notes.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDelta {
    /// Absolute time between the two notes.
    pub elapsed_ms: i64,
    pub distance_km: f64,
    /// `"<elapsed> · <distance>"`
    pub label: String,
}

impl NoteDelta {
    pub fn between(previous: &Note, note: &Note) -> Self {
        let elapsed_ms = (previous.time - note.time).abs();
        let distance_km = haversine_km(previous.lat, previous.lon, note.lat, note.lon);
        let label = format!(
            "{} · {}",
            format_elapsed_strict(elapsed_ms),
            format_distance_km(distance_km)
        );
        Self {
            elapsed_ms,
            distance_km,
            label,
        }
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEntry {
    Note { id: NoteId, text: String },
    Delta(NoteDelta),
}

impl ListEntry {
    pub fn note_id(&self) -> Option<NoteId> {
        match self {
            Self::Note { id, .. } => Some(*id),
            Self::Delta(_) => None,
        }
    }

    /// Text shown for this row.
    pub fn text(&self) -> &str {
        match self {
            Self::Note { text, .. } => text,
            Self::Delta(delta) => &delta.label,
        }
    }
}

/// Builds rows for `notes`, inserting a delta before every note but the first.
pub fn list_entries(notes: &[Note]) -> Vec<ListEntry> {
    let mut entries = Vec::with_capacity(notes.len().saturating_mul(2));
    let mut last: Option<&Note> = None;
    for note in notes {
        if let Some(previous) = last {
            entries.push(ListEntry::Delta(NoteDelta::between(previous, note)));
        }
        entries.push(ListEntry::Note {
            id: note.id,
            text: note.text.clone(),
        });
        last = Some(note);
    }
    entries
}

/// Host-side list the reactor renders into.
pub trait ListSurface {
    /// Replaces every row currently displayed.
    fn replace_all(&self, entries: &[ListEntry]);
}

/// Keeps a [`ListSurface`] in sync with `notes`.
///
/// Dropping the reactor stops rendering.
pub struct ListReactor {
    entries: Computed<Rc<Vec<ListEntry>>>,
    _render: Effect,
}

impl ListReactor {
    pub fn mount<O, S>(
        runtime: &Runtime,
        state: &AppState,
        tracker: Rc<VisibilityTracker<O>>,
        surface: Rc<S>,
    ) -> Self
    where
        O: IntersectionObserver + 'static,
        S: ListSurface + 'static,
    {
        let entries = runtime.computed({
            let notes = state.notes.clone();
            move || notes.with(|notes| Rc::new(list_entries(notes)))
        });

        let render = runtime.effect({
            let entries = entries.clone();
            move || {
                let entries = entries.get();
                let rendered: Vec<NoteId> = entries.iter().filter_map(ListEntry::note_id).collect();

                tracker.release_all();
                surface.replace_all(&entries);
                tracker.observe_rendered(&rendered);

                debug!(
                    "event=list_render module=list status=ok notes={} rows={}",
                    rendered.len(),
                    entries.len()
                );
            }
        });

        Self {
            entries,
            _render: render,
        }
    }

    /// Current rows (tracked when read inside a derivation).
    pub fn entries(&self) -> Rc<Vec<ListEntry>> {
        self.entries.get()
    }
}
