//! Domain models for desktop windows and platform notifications.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one record shape per concept, shared by manager/repo/service layers.
//!
//! # Invariants
//! - Every persisted object is identified by a stable uuid.
//! - Window deletion is hard removal from the registry; notifications use
//!   read/archive timestamps instead of destructive flags.

pub mod notification;
pub mod window;
