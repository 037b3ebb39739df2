//! Persistence contracts for the core.
//!
//! # Responsibility
//! - Define the abstract key-value blob store the core writes through to.
//! - Isolate SQLite details from service orchestration.
//!
//! # Invariants
//! - Repository APIs never interpret blob contents.

pub mod blob_repo;
