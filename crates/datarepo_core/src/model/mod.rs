//! Entity model.
//!
//! # Responsibility
//! - Define the capability every persisted record type provides.
//! - Ship the sample record used by the console harness.
//!
//! # Invariants
//! - Every entity is identified by exactly one primary-key column.

pub mod entity;
pub mod sample;
