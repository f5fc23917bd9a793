//! Core domain logic for Cycloops, an offline notebook of location-tagged notes.
//!
//! The crate owns persistence, the reactive state graph and the projections
//! that feed list and map surfaces. Hosts plug in their own surfaces,
//! intersection observer and geolocation source through the traits below.

pub mod bridge;
pub mod config;
pub mod db;
pub mod export;
pub mod focus;
pub mod geo;
pub mod humanize;
pub mod list;
pub mod logging;
pub mod map;
pub mod model;
pub mod projections;
pub mod reactive;
pub mod repo;
pub mod service;
pub mod state;
pub mod store;
pub mod visibility;

pub use bridge::StoreBridge;
pub use config::{AppConfig, ConfigError};
pub use export::{export_geojson_string, export_to_dir, ExportError, EXPORT_FILE_NAME};
pub use focus::FocusBridge;
pub use list::{ListEntry, ListReactor, ListSurface, NoteDelta};
pub use logging::{default_log_level, init_logging, logging_status};
pub use map::{MapReactor, MapSource, MapSurface};
pub use model::note::{Coordinates, NewNote, Note, NoteId, NoteValidationError};
pub use projections::NoteProjections;
pub use reactive::{Computed, Effect, ReadSignal, Runtime, Signal};
pub use repo::note_repo::{
    NoteOrder, NoteQuery, NoteRepository, RepoError, RepoResult, SqliteNoteRepository,
};
pub use service::location::{
    Clock, FixedLocation, GeolocationError, GeolocationProvider, NoLocation, SystemClock,
};
pub use service::note_service::{NoteService, SubmitError};
pub use state::{AppState, StateWriters};
pub use store::{LiveNoteStore, LiveQuerySubscription, NoteStore, QueryObserver};
pub use visibility::{IntersectionEntry, IntersectionObserver, VisibilityTracker};
