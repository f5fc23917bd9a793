//! Location-tagged note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its pre-insert shape.
//! - Own coordinate validation and the "location unavailable" sentinel.
//!
//! # Invariants
//! - Every persisted note is identified by a store-assigned `NoteId`.
//! - Notes are create-only; no field changes after insertion.

pub mod note;
