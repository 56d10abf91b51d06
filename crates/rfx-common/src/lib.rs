//! Common types and utilities shared by the rfx crates.
//!
//! - String interning (`Atom`, `Interner`) for type and member names
//! - Recursion and nesting limits

// String interning for name deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Centralized limits and thresholds
pub mod limits;
