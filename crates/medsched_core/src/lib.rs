//! Core engine for the medsched reminder grid.
//! This crate is the single source of truth for grid business invariants.

pub mod edit;
pub mod logging;
pub mod model;
pub mod mutate;
pub mod service;
pub mod sync;

pub use edit::session::{
    CommitError, CommittedDraft, EditSession, EditSessionError, EditSessionManager,
};
pub use edit::validate::{DraftRejection, FieldIssue, ValidatedFields};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::schema::{draft_of, fields_for, DraftValues, FieldInput, FieldKey, FieldSpec};
pub use model::tree::{
    children_of, DayGroupNode, DayOfWeek, InvalidTimeOfDay, NodeId, NodeLevel, NodeRef,
    PersonNode, ReminderEntryNode, ReminderTree, TimeOfDay, UnknownDayOfWeek,
};
pub use mutate::{MutationError, MutationResult};
pub use service::grid_service::{GridError, GridService, PendingSync};
pub use sync::coordinator::{PersistTicket, SyncCoordinator, SyncError};
pub use sync::store::{
    AccountScope, BearerToken, ReminderStore, StoreFailure, StoreResult, TokenProvider,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
