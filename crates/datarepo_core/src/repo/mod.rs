//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define one generic data access contract for any `Entity`.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Entity::validate()` before persistence.
//! - Lookup misses are `None`, not errors; store failures propagate as
//!   `RepoError::Db` without translation.

pub mod base_repo;
pub mod error;
pub mod query;
