//! Core use-case services.
//!
//! # Responsibility
//! - Pair every page store mutation with a history record and a
//!   write-through save.
//! - Keep UI callers decoupled from storage details.

pub mod workspace;
