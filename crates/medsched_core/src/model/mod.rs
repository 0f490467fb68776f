//! Domain model for the reminder grid.
//!
//! # Responsibility
//! - Define the canonical three-level tree (person, day group, reminder entry).
//! - Define the per-level editable field schema used by the edit surface.
//!
//! # Invariants
//! - Every node carries a stable `NodeId` that survives snapshot rewrites.
//! - Rows are related across snapshots by identifier equality, never by
//!   object identity.

pub mod schema;
pub mod tree;
