//! Spreadsheet formula engine.
//!
//! # Responsibility
//! - Store cell contents keyed by coordinate and track dependency sets.
//! - Parse formulas to a typed AST and evaluate them to typed values.
//!
//! # Invariants
//! - Evaluation never panics and never throws across the engine boundary:
//!   every failure is a `Value::Error` sentinel.
//! - Cycle handling is uniform: one visited set guards the single-cell and
//!   bulk recalculation paths alike.

pub mod coord;
pub mod engine;
pub mod functions;
pub mod parser;
pub mod value;
