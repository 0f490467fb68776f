//! Grid use-case service.
//!
//! # Responsibility
//! - Compose edit sessions, validation, the mutation engine and the sync
//!   coordinator into the grid's save/delete/insert flows.
//! - Keep the shell decoupled from individual engine modules.
//!
//! # Invariants
//! - Every mutation is validated before it is applied and persisted.
//! - Mutating operations are rejected busy while a persist is unresolved;
//!   a busy save leaves the edit session open for retry.
//! - View changes and deletes covering the edited row close the session as
//!   an implicit cancel.

use crate::edit::session::{CommitError, EditSession, EditSessionError, EditSessionManager};
use crate::edit::validate::{ensure_unique_day, normalized_required_text, DraftRejection};
use crate::model::schema::{draft_of, DraftValues, FieldKey};
use crate::model::tree::{
    DayGroupNode, DayOfWeek, NodeId, NodeLevel, PersonNode, ReminderEntryNode, ReminderTree,
    TimeOfDay,
};
use crate::mutate::{
    apply_delete, apply_insert_entry, apply_insert_group, apply_insert_person, apply_save,
    MutationError,
};
use crate::sync::coordinator::{PersistTicket, SyncCoordinator, SyncError};
use crate::sync::store::{AccountScope, ReminderStore, StoreFailure, TokenProvider};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors surfaced by grid use-case operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Edit session lifecycle violation (conflict, no session).
    Session(EditSessionError),
    /// Draft or insert input rejected by validation.
    Draft(DraftRejection),
    /// Stale row reference; the shell should reload the tree.
    Mutation(MutationError),
    /// Persist serialization or rollback outcome.
    Sync(SyncError),
    /// Remote failure outside a persist window (load, token fetch).
    Store(StoreFailure),
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(err) => write!(f, "{err}"),
            Self::Draft(err) => write!(f, "{err}"),
            Self::Mutation(err) => write!(f, "{err}"),
            Self::Sync(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Draft(err) => Some(err),
            Self::Mutation(err) => Some(err),
            Self::Sync(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<EditSessionError> for GridError {
    fn from(value: EditSessionError) -> Self {
        Self::Session(value)
    }
}

impl From<DraftRejection> for GridError {
    fn from(value: DraftRejection) -> Self {
        Self::Draft(value)
    }
}

impl From<MutationError> for GridError {
    fn from(value: MutationError) -> Self {
        Self::Mutation(value)
    }
}

impl From<SyncError> for GridError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

impl From<CommitError> for GridError {
    fn from(value: CommitError) -> Self {
        match value {
            CommitError::NoActiveSession => Self::Session(EditSessionError::NoActiveSession),
            CommitError::Rejected(rejection) => Self::Draft(rejection),
        }
    }
}

impl From<StoreFailure> for GridError {
    fn from(value: StoreFailure) -> Self {
        Self::Store(value)
    }
}

/// Handle for one optimistically applied mutation awaiting its remote
/// outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSync {
    pub ticket: PersistTicket,
}

/// Facade over the editable reminder grid.
#[derive(Debug, Default)]
pub struct GridService {
    sessions: EditSessionManager,
    sync: SyncCoordinator,
}

impl GridService {
    /// Creates an engine with an empty canonical tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine over an already-loaded snapshot.
    pub fn with_tree(tree: ReminderTree) -> Self {
        Self {
            sessions: EditSessionManager::new(),
            sync: SyncCoordinator::new(tree),
        }
    }

    /// Current canonical snapshot (optimistic while a persist is in flight).
    pub fn tree(&self) -> &ReminderTree {
        self.sync.tree()
    }

    pub fn active_edit(&self) -> Option<&EditSession> {
        self.sessions.active()
    }

    /// Identifier-based row highlight check.
    pub fn is_editing(&self, node_id: NodeId) -> bool {
        self.sessions.is_editing(node_id)
    }

    pub fn is_busy(&self) -> bool {
        self.sync.is_busy()
    }

    /// Adopts a freshly fetched snapshot as canonical.
    ///
    /// Any open edit session references rows of the previous snapshot and
    /// is closed as an implicit cancel.
    pub fn install_tree(&mut self, tree: ReminderTree) -> Result<(), GridError> {
        if self.sync.is_busy() {
            return Err(SyncError::PersistInFlight.into());
        }
        self.sessions.cancel_edit();
        self.sync.install(tree)?;
        Ok(())
    }

    /// Pagination or any other view change: close the session, keep the
    /// tree.
    pub fn view_changed(&mut self) {
        self.sessions.cancel_edit();
    }

    /// Opens the edit session for one row, pre-populated from the canonical
    /// snapshot.
    pub fn begin_edit(&mut self, node_id: NodeId, level: NodeLevel) -> Result<(), GridError> {
        let node = self
            .tree()
            .find(node_id, level)
            .ok_or(MutationError::NodeNotFound { node_id, level })?;
        let current_values = draft_of(node);
        self.sessions.begin_edit(node_id, level, current_values)?;
        Ok(())
    }

    /// Merges raw field changes into the active draft.
    pub fn update_draft(&mut self, fields: DraftValues) -> Result<(), GridError> {
        self.sessions.update_draft(fields)?;
        Ok(())
    }

    /// Discards the active draft; always succeeds.
    ///
    /// Has no effect on a persist already in flight from a previous commit.
    pub fn cancel_edit(&mut self) {
        self.sessions.cancel_edit();
    }

    /// Commits the active draft: validate, apply, begin the optimistic
    /// persist.
    ///
    /// Busy failures run before commit so the session stays open and the
    /// same save can be retried once the in-flight persist settles.
    /// Validation failures also leave the session open. A stale row
    /// reference closes the session and surfaces not-found.
    pub fn save_active_edit(&mut self) -> Result<PendingSync, GridError> {
        if self.sync.is_busy() {
            return Err(SyncError::PersistInFlight.into());
        }

        let committed = self.sessions.commit_edit(self.sync.tree())?;
        let new_tree = apply_save(
            self.sync.tree(),
            committed.node_id,
            committed.level,
            &committed.fields,
        )?;
        self.begin_sync(new_tree)
    }

    /// Deletes one row and its subtree, optimistically.
    ///
    /// When the active edit session sits inside the deleted subtree it is
    /// closed first, as an implicit cancel.
    pub fn delete_node(
        &mut self,
        node_id: NodeId,
        level: NodeLevel,
    ) -> Result<PendingSync, GridError> {
        if self.sync.is_busy() {
            return Err(SyncError::PersistInFlight.into());
        }

        let subtree = self
            .tree()
            .subtree_ids(node_id, level)
            .ok_or(MutationError::NodeNotFound { node_id, level })?;
        let editing_deleted_row = self
            .sessions
            .active()
            .map(|session| subtree.contains(&session.node_id))
            .unwrap_or(false);
        if editing_deleted_row {
            self.sessions.cancel_edit();
        }

        let new_tree = apply_delete(self.sync.tree(), node_id, level)?;
        info!(
            "event=row_delete module=grid level={} node={} descendants={}",
            level,
            node_id,
            subtree.len() - 1
        );
        self.begin_sync(new_tree)
    }

    /// Adds a person row with a validated display name.
    pub fn add_person(&mut self, name: &str) -> Result<PendingSync, GridError> {
        if self.sync.is_busy() {
            return Err(SyncError::PersistInFlight.into());
        }

        let name = normalized_required_text(name, FieldKey::Name)?;
        let new_tree = apply_insert_person(self.sync.tree(), PersonNode::new(name));
        self.begin_sync(new_tree)
    }

    /// Adds a day group under one person, enforcing sibling day uniqueness.
    pub fn add_group(
        &mut self,
        person_id: NodeId,
        day_of_week: DayOfWeek,
    ) -> Result<PendingSync, GridError> {
        if self.sync.is_busy() {
            return Err(SyncError::PersistInFlight.into());
        }

        let person = self
            .tree()
            .persons
            .iter()
            .find(|person| person.id == person_id)
            .ok_or(MutationError::NodeNotFound {
                node_id: person_id,
                level: NodeLevel::Person,
            })?;
        ensure_unique_day(person, day_of_week, None)?;

        let new_tree =
            apply_insert_group(self.sync.tree(), person_id, DayGroupNode::new(day_of_week))?;
        self.begin_sync(new_tree)
    }

    /// Adds a reminder entry under one day group.
    pub fn add_entry(
        &mut self,
        group_id: NodeId,
        medication_name: &str,
        time_of_day: TimeOfDay,
    ) -> Result<PendingSync, GridError> {
        if self.sync.is_busy() {
            return Err(SyncError::PersistInFlight.into());
        }

        let medication_name = normalized_required_text(medication_name, FieldKey::MedicationName)?;
        let entry = ReminderEntryNode::new(medication_name, time_of_day);
        let new_tree = apply_insert_entry(self.sync.tree(), group_id, entry)?;
        self.begin_sync(new_tree)
    }

    /// Settles one pending persist with the remote outcome.
    ///
    /// Failure has already rolled the tree back when this returns an error.
    pub fn resolve_sync(
        &mut self,
        ticket: PersistTicket,
        outcome: Result<(), StoreFailure>,
    ) -> Result<(), GridError> {
        self.sync.resolve_persist(ticket, outcome)?;
        Ok(())
    }

    fn begin_sync(&mut self, new_tree: ReminderTree) -> Result<PendingSync, GridError> {
        let ticket = self.sync.begin_persist(new_tree)?;
        Ok(PendingSync { ticket })
    }

    // ---- synchronous drivers over the store SPI ----

    /// Fetches and installs the tree for one scope in a single step.
    pub fn load_via<S: ReminderStore, P: TokenProvider>(
        &mut self,
        store: &S,
        tokens: &P,
        scope: &AccountScope,
    ) -> Result<(), GridError> {
        if self.sync.is_busy() {
            return Err(SyncError::PersistInFlight.into());
        }
        let token = tokens.bearer_token()?;
        let tree = store.fetch_tree(scope, &token)?;
        self.install_tree(tree)
    }

    /// Transports one pending mutation and settles it.
    ///
    /// A token failure counts as a persist failure: the optimistic snapshot
    /// is rolled back before the error is surfaced.
    pub fn sync_via<S: ReminderStore, P: TokenProvider>(
        &mut self,
        store: &S,
        tokens: &P,
        pending: PendingSync,
    ) -> Result<(), GridError> {
        let outcome = match tokens.bearer_token() {
            Ok(token) => store.replace_tree(self.sync.tree(), &token),
            Err(failure) => Err(failure),
        };
        self.resolve_sync(pending.ticket, outcome)
    }

    /// Commit-and-persist in one step for synchronous shells.
    pub fn save_active_edit_via<S: ReminderStore, P: TokenProvider>(
        &mut self,
        store: &S,
        tokens: &P,
    ) -> Result<(), GridError> {
        let pending = self.save_active_edit()?;
        self.sync_via(store, tokens, pending)
    }

    /// Delete-and-persist in one step for synchronous shells.
    pub fn delete_node_via<S: ReminderStore, P: TokenProvider>(
        &mut self,
        store: &S,
        tokens: &P,
        node_id: NodeId,
        level: NodeLevel,
    ) -> Result<(), GridError> {
        let pending = self.delete_node(node_id, level)?;
        self.sync_via(store, tokens, pending)
    }
}
