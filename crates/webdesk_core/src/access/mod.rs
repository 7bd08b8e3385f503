//! Access control: profiles, permission checks, cached verification.
//!
//! # Responsibility
//! - Model a subject's granted permissions and role assignments.
//! - Gate operations through a pluggable verifier with a bounded,
//!   time-limited decision cache.
//!
//! # Invariants
//! - Permission and role identifiers are normalized to trimmed lowercase.
//! - A verifier outage never panics a check: the cache, then the local
//!   profile, answer instead.
//!
//! # See also
//! - [`crate::service`]: facades that consult access before acting.

pub mod profile;
pub mod verifier;
