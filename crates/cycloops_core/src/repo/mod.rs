//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note data-access contract.
//! - Isolate SQLite query details from the live store and services.
//!
//! # Invariants
//! - Repository writes must enforce `NewNote::validate()` before persistence.
//! - Read paths reject invalid persisted rows instead of masking them.

pub mod note_repo;
