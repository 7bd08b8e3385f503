//! Use-case services orchestrating desktop state and persistence.
//!
//! # Responsibility
//! - Provide stable entry points for shell callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - The service layer remains storage-agnostic.

pub mod notification_service;
pub mod session_service;
