//! GeoJSON export of the whole note collection.
//!
//! # Responsibility
//! - Serialize every note as an RFC 7946 point feature.
//! - Write the export file under its canonical name.
//!
//! # Invariants
//! - One feature per note, in insertion order.
//! - Geometry is `[lon, lat]`; properties are `{timestamp, text}`.

use crate::geo::{Feature, FeatureCollection};
use crate::model::note::Note;
use crate::repo::note_repo::{NoteQuery, RepoError};
use crate::store::NoteStore;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// File name offered for the download.
pub const EXPORT_FILE_NAME: &str = "cycloops-notes.geojson";

/// Properties of an exported note point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProperties {
    /// Creation time in Unix epoch milliseconds.
    pub timestamp: i64,
    pub text: String,
}

#[derive(Debug)]
pub enum ExportError {
    Repo(RepoError),
    Serialize(serde_json::Error),
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize export: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<RepoError> for ExportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Builds the export collection for `notes`, preserving their order.
pub fn export_feature_collection(notes: &[Note]) -> FeatureCollection<ExportProperties> {
    FeatureCollection::new(
        notes
            .iter()
            .map(|note| {
                Feature::point(
                    note.coordinates().position(),
                    ExportProperties {
                        timestamp: note.time,
                        text: note.text.clone(),
                    },
                )
            })
            .collect(),
    )
}

/// Serializes every note in `store` as a GeoJSON document.
pub fn export_geojson_string(store: &impl NoteStore) -> Result<String, ExportError> {
    let notes = store.query(&NoteQuery::insertion_order())?;
    let collection = export_feature_collection(&notes);
    Ok(serde_json::to_string(&collection)?)
}

/// Writes the export into `dir` as [`EXPORT_FILE_NAME`] and returns its path.
pub fn export_to_dir(store: &impl NoteStore, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
    let path = dir.as_ref().join(EXPORT_FILE_NAME);
    let document = export_geojson_string(store)?;
    if let Err(source) = std::fs::write(&path, document.as_bytes()) {
        error!(
            "event=export module=export status=error path={} error={}",
            path.display(),
            source
        );
        return Err(ExportError::Io { path, source });
    }
    info!(
        "event=export module=export status=ok path={} bytes={}",
        path.display(),
        document.len()
    );
    Ok(path)
}
