//! Note submission service (the note form's use-case logic).
//!
//! # Responsibility
//! - Capture creation time, then the device position, then insert the note.
//! - Guard against double submission while a request is in flight.
//!
//! # Invariants
//! - `time` is read before the geolocation request starts.
//! - Geolocation failure resolves to `Coordinates::SENTINEL`.
//! - The draft is cleared only after a successful insert; failures keep it.
//! - `submitting` is `true` exactly while a submission is in flight.

use crate::model::note::{Coordinates, NewNote, NoteId};
use crate::repo::note_repo::RepoError;
use crate::service::location::{Clock, GeolocationProvider, SystemClock};
use crate::state::SubmittingWriter;
use crate::store::NoteStore;
use log::{error, info, warn};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note submission.
#[derive(Debug)]
pub enum SubmitError {
    /// Another submission has not finished yet.
    InFlight,
    /// The store rejected the insert. The draft is kept for retry.
    Store(RepoError),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InFlight => write!(f, "a note submission is already in progress"),
            Self::Store(err) => write!(f, "failed to save note: {err}"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InFlight => None,
        }
    }
}

impl From<RepoError> for SubmitError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

/// Note form service over a store, a geolocation provider and a clock.
pub struct NoteService<S: NoteStore, G: GeolocationProvider, C: Clock = SystemClock> {
    store: S,
    geolocation: G,
    clock: C,
    draft: RefCell<String>,
    submitting: SubmittingWriter,
}

impl<S: NoteStore, G: GeolocationProvider> NoteService<S, G, SystemClock> {
    /// Creates a service stamping notes with the wall clock.
    pub fn new(store: S, geolocation: G, submitting: SubmittingWriter) -> Self {
        Self::with_clock(store, geolocation, SystemClock, submitting)
    }
}

impl<S: NoteStore, G: GeolocationProvider, C: Clock> NoteService<S, G, C> {
    pub fn with_clock(store: S, geolocation: G, clock: C, submitting: SubmittingWriter) -> Self {
        Self {
            store,
            geolocation,
            clock,
            draft: RefCell::new(String::new()),
            submitting,
        }
    }

    /// Replaces the form text.
    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.borrow_mut() = text.into();
    }

    pub fn draft(&self) -> String {
        self.draft.borrow().clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.current()
    }

    /// Submits the current draft as a new note.
    ///
    /// Empty text is allowed. The new note reaches `notes` through the store's
    /// live query; the returned id is informational.
    ///
    /// # Errors
    /// - `SubmitError::InFlight` when called before a previous submit resolved.
    /// - `SubmitError::Store` when the insert fails; the draft is kept.
    pub async fn submit(&self) -> Result<NoteId, SubmitError> {
        if self.submitting.current() {
            warn!("event=note_submit module=service status=rejected reason=in_flight");
            return Err(SubmitError::InFlight);
        }
        self.submitting.set(true);
        let _in_flight = InFlight(&self.submitting);

        let text = self.draft();
        let time = self.clock.now_ms();
        let coordinates = match self.geolocation.current_position().await {
            Ok(coordinates) => coordinates,
            Err(err) => {
                warn!(
                    "event=geolocation module=service status=fallback reason={} location=sentinel",
                    err
                );
                Coordinates::SENTINEL
            }
        };

        let note = NewNote::new(time, text, coordinates);
        match self.store.insert(&note) {
            Ok(id) => {
                self.draft.borrow_mut().clear();
                info!("event=note_submit module=service status=ok id={id}");
                Ok(id)
            }
            Err(err) => {
                error!("event=note_submit module=service status=error keeping_draft=true error={err}");
                Err(err.into())
            }
        }
    }
}

/// Clears `submitting` when the submission ends, including when its future
/// is dropped before completion.
struct InFlight<'a>(&'a SubmittingWriter);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
