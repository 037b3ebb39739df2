//! Page forest ownership and navigation.
//!
//! # Responsibility
//! - Hold the single mutable copy of every page (`PageStore`).
//! - Provide cycle-safe hierarchy walks (`forest`).

pub mod forest;
pub mod page_store;
