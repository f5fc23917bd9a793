//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical persisted note and the insert request shape.
//! - Validate coordinates and timestamps before persistence.
//!
//! # Invariants
//! - `id` is assigned by the store, increases monotonically and is never reused.
//! - `time` is epoch milliseconds captured at creation and never changes.
//! - `(0, 0)` means the device location was unavailable.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier.
///
/// Kept as a type alias so signatures read by intent; backed by the SQLite
/// `INTEGER PRIMARY KEY`.
pub type NoteId = i64;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Written when geolocation is denied or unavailable.
    pub const SENTINEL: Coordinates = Coordinates { lat: 0.0, lon: 0.0 };

    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether these coordinates are the "location unavailable" sentinel.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// GeoJSON position order: `[lon, lat]`.
    pub fn position(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

/// Persisted note record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Creation time in Unix epoch milliseconds.
    pub time: i64,
    /// User-entered text; may be empty.
    pub text: String,
    pub lat: f64,
    pub lon: f64,
}

impl Note {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

/// Note content before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNote {
    pub time: i64,
    pub text: String,
    pub lat: f64,
    pub lon: f64,
}

impl NewNote {
    pub fn new(time: i64, text: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            time,
            text: text.into(),
            lat: coordinates.lat,
            lon: coordinates.lon,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// Attaches the store-assigned id.
    pub fn into_note(self, id: NoteId) -> Note {
        Note {
            id,
            time: self.time,
            text: self.text,
            lat: self.lat,
            lon: self.lon,
        }
    }

    /// Checks invariants required before persistence.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.time < 0 {
            return Err(NoteValidationError::NegativeTime(self.time));
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(NoteValidationError::LatitudeOutOfRange(self.lat));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(NoteValidationError::LongitudeOutOfRange(self.lon));
        }
        Ok(())
    }
}

/// Rejection reasons for [`NewNote::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum NoteValidationError {
    NegativeTime(i64),
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeTime(value) => write!(f, "note time must not be negative, got {value}"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude must be within [-90, 90], got {value}")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude must be within [-180, 180], got {value}")
            }
        }
    }
}

impl Error for NoteValidationError {}
