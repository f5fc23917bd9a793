//! Note use-case services.
//!
//! # Responsibility
//! - Orchestrate location capture and store inserts for note submission.
//! - Keep host/UI layers decoupled from storage and geolocation details.

pub mod location;
pub mod note_service;
