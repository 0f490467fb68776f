//! Remote synchronization: store contracts and the persist coordinator.
//!
//! # Responsibility
//! - Define the SPI the shell's transport implements (`ReminderStore`,
//!   `TokenProvider`).
//! - Coordinate optimistic whole-tree persists with rollback-on-failure.
//!
//! # Invariants
//! - At most one persist is in flight at a time.
//! - Every failed persist restores the immediately-prior snapshot before
//!   the failure is reported.

pub mod coordinator;
pub mod store;
