//! Row edit lifecycle: the single active session and draft validation.
//!
//! # Responsibility
//! - Hold the one process-wide edit session and its raw draft values.
//! - Validate drafts against the level schema and cross-sibling rules.
//!
//! # Invariants
//! - At most one row is in edit at any time, tracked by stable id.
//! - Validation is synchronous and never mutates the tree.

pub mod session;
pub mod validate;
