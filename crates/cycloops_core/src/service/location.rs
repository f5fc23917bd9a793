//! Geolocation and clock seams used by note submission.
//!
//! # Invariants
//! - Geolocation failure never blocks note creation; callers map it to
//!   `Coordinates::SENTINEL`.

use crate::model::note::Coordinates;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why a position could not be obtained. Providers may not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    PermissionDenied,
    PositionUnavailable,
    Other(String),
}

impl Display for GeolocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "geolocation permission denied"),
            Self::PositionUnavailable => write!(f, "geolocation position unavailable"),
            Self::Other(message) => write!(f, "geolocation failed: {message}"),
        }
    }
}

impl Error for GeolocationError {}

/// Single-shot device position request.
#[async_trait(?Send)]
pub trait GeolocationProvider {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Provider that always answers with the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait(?Send)]
impl GeolocationProvider for FixedLocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Provider for hosts without location access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait(?Send)]
impl GeolocationProvider for NoLocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::PositionUnavailable)
    }
}

/// Source of note creation timestamps.
pub trait Clock {
    /// Current Unix time in milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl<F: Fn() -> i64> Clock for F {
    fn now_ms(&self) -> i64 {
        (self)()
    }
}
