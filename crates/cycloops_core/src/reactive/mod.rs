//! Single-threaded reactive engine: signals, computeds and effects.
//!
//! # Responsibility
//! - Hold mutable reactive cells (`Signal`) and notify dependents on change.
//! - Derive memoized values lazily (`Computed`) from other reactive cells.
//! - Re-run side-effecting subscribers (`Effect`) when what they read changes.
//!
//! # Invariants
//! - Dependencies are re-derived on every run; stale edges never accumulate.
//! - A computed is recomputed at most once between writes to its inputs.
//! - Notification is synchronous: `set` returns after every triggered effect
//!   has completed.
//! - Writes issued while effects are running are queued and processed FIFO
//!   after the running effect finishes.
//!
//! # See also
//! - `crate::state` for the application-level signals built on this engine.

mod computed;
mod effect;
mod runtime;
mod signal;

pub use computed::Computed;
pub use effect::Effect;
pub use runtime::Runtime;
pub use signal::{ReadSignal, Signal};
