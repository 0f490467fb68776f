//! Single active edit session over the grid.
//!
//! # Responsibility
//! - Track which one row is being edited and its raw draft values.
//! - Gate session open/close so no second edit can start while one is live.
//!
//! # Invariants
//! - Zero or one session exists process-wide; a second `begin_edit` is
//!   rejected, never queued.
//! - The session references its row by stable id, so it stays valid across
//!   immutable tree rewrites.
//! - `cancel_edit` always succeeds and never touches the tree.

use crate::edit::validate::{validate_draft, DraftRejection, ValidatedFields};
use crate::model::schema::DraftValues;
use crate::model::tree::{NodeId, NodeLevel, ReminderTree};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The one in-progress edit, scoped to a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    pub node_id: NodeId,
    pub level: NodeLevel,
    pub draft: DraftValues,
}

/// Errors from session lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditSessionError {
    /// Another row is already in edit; its id is included so the UI can
    /// point at the open session.
    SessionAlreadyActive { node_id: NodeId },
    /// Draft operations require an open session.
    NoActiveSession,
}

impl Display for EditSessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionAlreadyActive { node_id } => {
                write!(f, "another row is already being edited: {node_id}")
            }
            Self::NoActiveSession => write!(f, "no edit session is active"),
        }
    }
}

impl Error for EditSessionError {}

/// Why a commit did not produce validated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    NoActiveSession,
    /// Validation rejected the draft; the session stays open.
    Rejected(DraftRejection),
}

impl Display for CommitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveSession => write!(f, "no edit session is active"),
            Self::Rejected(rejection) => write!(f, "{rejection}"),
        }
    }
}

impl Error for CommitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoActiveSession => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

impl From<DraftRejection> for CommitError {
    fn from(value: DraftRejection) -> Self {
        Self::Rejected(value)
    }
}

/// Validated draft handed back to the caller for application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedDraft {
    pub node_id: NodeId,
    pub level: NodeLevel,
    pub fields: ValidatedFields,
}

/// Holder of the zero-or-one active edit session.
#[derive(Debug, Default)]
pub struct EditSessionManager {
    active: Option<EditSession>,
}

impl EditSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for one row, pre-populated with its current values.
    pub fn begin_edit(
        &mut self,
        node_id: NodeId,
        level: NodeLevel,
        current_values: DraftValues,
    ) -> Result<(), EditSessionError> {
        if let Some(active) = &self.active {
            return Err(EditSessionError::SessionAlreadyActive {
                node_id: active.node_id,
            });
        }
        debug!("event=edit_open module=edit level={level} node={node_id}");
        self.active = Some(EditSession {
            node_id,
            level,
            draft: current_values,
        });
        Ok(())
    }

    /// Merges field changes into the active draft without validating.
    pub fn update_draft(&mut self, fields: DraftValues) -> Result<(), EditSessionError> {
        let session = self
            .active
            .as_mut()
            .ok_or(EditSessionError::NoActiveSession)?;
        session.draft.extend(fields);
        Ok(())
    }

    /// Discards the draft and closes the session; a no-op when none is open.
    pub fn cancel_edit(&mut self) {
        if let Some(session) = self.active.take() {
            debug!(
                "event=edit_cancel module=edit level={} node={}",
                session.level, session.node_id
            );
        }
    }

    /// Hands the draft to the validator.
    ///
    /// On success the session is closed and the validated draft returned for
    /// the mutation engine; on rejection the session stays open so the user
    /// can correct the fields.
    pub fn commit_edit(&mut self, tree: &ReminderTree) -> Result<CommittedDraft, CommitError> {
        let session = self.active.take().ok_or(CommitError::NoActiveSession)?;
        match validate_draft(tree, session.node_id, session.level, &session.draft) {
            Ok(fields) => {
                debug!(
                    "event=edit_commit module=edit level={} node={}",
                    session.level, session.node_id
                );
                Ok(CommittedDraft {
                    node_id: session.node_id,
                    level: session.level,
                    fields,
                })
            }
            Err(rejection) => {
                self.active = Some(session);
                Err(CommitError::Rejected(rejection))
            }
        }
    }

    pub fn active(&self) -> Option<&EditSession> {
        self.active.as_ref()
    }

    /// Identifier-based "is this row being edited" lookup.
    ///
    /// Row highlighting must use this instead of comparing node references;
    /// snapshots allocate new nodes on every mutation.
    pub fn is_editing(&self, node_id: NodeId) -> bool {
        self.active
            .as_ref()
            .map(|session| session.node_id == node_id)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::{CommitError, EditSessionError, EditSessionManager};
    use crate::edit::validate::{DraftRejection, ValidatedFields};
    use crate::model::schema::{DraftValues, FieldKey};
    use crate::model::tree::{NodeLevel, ReminderTree, TimeOfDay};
    use uuid::Uuid;

    fn entry_values(medication: &str, time: &str) -> DraftValues {
        let mut values = DraftValues::new();
        values.insert(FieldKey::MedicationName, medication.to_string());
        values.insert(FieldKey::TimeOfDay, time.to_string());
        values
    }

    #[test]
    fn second_begin_edit_is_rejected_until_close() {
        let mut sessions = EditSessionManager::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        sessions
            .begin_edit(first, NodeLevel::Entry, entry_values("Ibuprofen", "08:00"))
            .expect("first session should open");

        let err = sessions
            .begin_edit(second, NodeLevel::Person, DraftValues::new())
            .expect_err("second session must be rejected");
        assert_eq!(err, EditSessionError::SessionAlreadyActive { node_id: first });

        sessions.cancel_edit();
        sessions
            .begin_edit(second, NodeLevel::Person, DraftValues::new())
            .expect("session should open after cancel");
    }

    #[test]
    fn update_draft_merges_only_changed_fields() {
        let mut sessions = EditSessionManager::new();
        let node = Uuid::new_v4();
        sessions
            .begin_edit(node, NodeLevel::Entry, entry_values("Ibuprofen", "08:00"))
            .unwrap();

        let mut change = DraftValues::new();
        change.insert(FieldKey::TimeOfDay, "20:00".to_string());
        sessions.update_draft(change).unwrap();

        let draft = &sessions.active().unwrap().draft;
        assert_eq!(draft.get(&FieldKey::MedicationName).unwrap(), "Ibuprofen");
        assert_eq!(draft.get(&FieldKey::TimeOfDay).unwrap(), "20:00");
    }

    #[test]
    fn update_draft_without_session_fails() {
        let mut sessions = EditSessionManager::new();
        let err = sessions
            .update_draft(DraftValues::new())
            .expect_err("draft update requires open session");
        assert_eq!(err, EditSessionError::NoActiveSession);
    }

    #[test]
    fn commit_clears_session_and_returns_typed_fields() {
        let mut sessions = EditSessionManager::new();
        let node = Uuid::new_v4();
        sessions
            .begin_edit(node, NodeLevel::Entry, entry_values("Ibuprofen", "20:00"))
            .unwrap();

        let committed = sessions
            .commit_edit(&ReminderTree::default())
            .expect("valid draft should commit");
        assert_eq!(committed.node_id, node);
        assert_eq!(
            committed.fields,
            ValidatedFields::Entry {
                medication_name: "Ibuprofen".to_string(),
                time_of_day: TimeOfDay::try_new(20, 0).unwrap(),
            }
        );
        assert!(sessions.active().is_none());
    }

    #[test]
    fn rejected_commit_keeps_session_open() {
        let mut sessions = EditSessionManager::new();
        let node = Uuid::new_v4();
        sessions
            .begin_edit(node, NodeLevel::Entry, entry_values("Ibuprofen", "not-a-time"))
            .unwrap();

        let err = sessions
            .commit_edit(&ReminderTree::default())
            .expect_err("malformed time must be rejected");
        assert!(matches!(
            err,
            CommitError::Rejected(DraftRejection::Invalid { .. })
        ));
        assert!(sessions.is_editing(node));
    }
}
