//! Derivation graph: geospatial projections of the note state.
//!
//! # Responsibility
//! - Project `notes` into a point feature collection.
//! - Filter that collection by `visible` and by `focus`.
//!
//! # Invariants
//! - Projections are pure and never write state.
//! - `visible_locations` and `focus_location` are subsets of
//!   `note_locations` with identical feature shape and relative order.

use crate::geo::{Feature, FeatureCollection};
use crate::model::note::{Note, NoteId};
use crate::reactive::{Computed, Runtime};
use crate::state::AppState;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Properties carried by each projected note point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteProperties {
    pub id: NoteId,
    pub text: String,
}

pub type Locations = FeatureCollection<NoteProperties>;

/// Projects one note to a point feature.
pub fn note_feature(note: &Note) -> Feature<NoteProperties> {
    Feature::point(
        note.coordinates().position(),
        NoteProperties {
            id: note.id,
            text: note.text.clone(),
        },
    )
}

/// Keeps the features of `all` for which `keep(id)` holds.
fn filter_locations(all: &Locations, keep: impl Fn(NoteId) -> bool) -> Locations {
    FeatureCollection::new(
        all.features
            .iter()
            .filter(|feature| keep(feature.properties.id))
            .cloned()
            .collect(),
    )
}

/// The three computeds consumed by list and map renderers.
#[derive(Clone, Debug)]
pub struct NoteProjections {
    /// Every note as a point, in `notes` order (newest first).
    pub note_locations: Computed<Rc<Locations>>,
    /// Points whose id is in `visible`.
    pub visible_locations: Computed<Rc<Locations>>,
    /// The focused point, or nothing.
    pub focus_location: Computed<Rc<Locations>>,
}

impl NoteProjections {
    pub fn new(runtime: &Runtime, state: &AppState) -> Self {
        let note_locations = runtime.computed({
            let notes = state.notes.clone();
            move || {
                notes.with(|notes| {
                    Rc::new(FeatureCollection::new(
                        notes.iter().map(note_feature).collect(),
                    ))
                })
            }
        });

        let visible_locations = runtime.computed({
            let all = note_locations.clone();
            let visible = state.visible.clone();
            move || {
                let all = all.get();
                visible.with(|visible| Rc::new(filter_locations(&all, |id| visible.contains(&id))))
            }
        });

        let focus_location = runtime.computed({
            let all = note_locations.clone();
            let focus = state.focus.clone();
            move || {
                let all = all.get();
                let focus = focus.get();
                Rc::new(filter_locations(&all, |id| focus == Some(id)))
            }
        });

        Self {
            note_locations,
            visible_locations,
            focus_location,
        }
    }
}
