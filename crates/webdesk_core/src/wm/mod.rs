//! Window manager state machine.
//!
//! # Responsibility
//! - Own the authoritative in-memory registry of open windows.
//! - Enforce geometry/stacking rules through one mutation surface.
//!
//! # Invariants
//! - Z-order values come from a monotonic counter and are never reused.
//! - Unknown-id operations are no-ops, never errors: stale ids from racing
//!   close/move events must not crash the shell.

pub mod manager;
