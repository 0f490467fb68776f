//! Pure mutation engine over immutable tree snapshots.
//!
//! # Responsibility
//! - Apply save/delete/insert operations by cloning the snapshot and
//!   rewriting only the targeted row's path.
//! - Compute cascades: deleting a row removes its whole subtree.
//!
//! # Invariants
//! - Rows are located by stable id at a stated level, never by position or
//!   object identity.
//! - Input snapshots are never mutated in place.
//! - A parent left childless stays in the tree; pruning is the caller's
//!   explicit decision, not a side effect.

use crate::edit::validate::ValidatedFields;
use crate::model::tree::{
    DayGroupNode, NodeId, NodeLevel, PersonNode, ReminderEntryNode, ReminderTree,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Errors from mutation operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// No row with this id exists at the stated level in the snapshot,
    /// typically because it was removed since the caller last looked.
    NodeNotFound { node_id: NodeId, level: NodeLevel },
    /// The validated fields belong to a different level than the target row.
    FieldLevelMismatch { level: NodeLevel, fields: NodeLevel },
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound { node_id, level } => {
                write!(f, "{level} row no longer exists: {node_id}")
            }
            Self::FieldLevelMismatch { level, fields } => write!(
                f,
                "cannot apply {fields} fields to a {level} row"
            ),
        }
    }
}

impl Error for MutationError {}

/// Replaces only the editable fields of one row, returning a new snapshot.
pub fn apply_save(
    tree: &ReminderTree,
    node_id: NodeId,
    level: NodeLevel,
    fields: &ValidatedFields,
) -> MutationResult<ReminderTree> {
    if fields.level() != level {
        return Err(MutationError::FieldLevelMismatch {
            level,
            fields: fields.level(),
        });
    }

    let mut next = tree.clone();
    let mut found = false;

    match fields {
        ValidatedFields::Person { name } => {
            for person in &mut next.persons {
                if person.id == node_id {
                    person.name = name.clone();
                    found = true;
                    break;
                }
            }
        }
        ValidatedFields::DayGroup { day_of_week } => {
            'persons: for person in &mut next.persons {
                for group in &mut person.groups {
                    if group.id == node_id {
                        group.day_of_week = *day_of_week;
                        found = true;
                        break 'persons;
                    }
                }
            }
        }
        ValidatedFields::Entry {
            medication_name,
            time_of_day,
        } => {
            'persons: for person in &mut next.persons {
                for group in &mut person.groups {
                    for entry in &mut group.entries {
                        if entry.id == node_id {
                            entry.medication_name = medication_name.clone();
                            entry.time_of_day = *time_of_day;
                            found = true;
                            break 'persons;
                        }
                    }
                }
            }
        }
    }

    if !found {
        return Err(MutationError::NodeNotFound { node_id, level });
    }
    Ok(next)
}

/// Removes one row and its whole subtree from its parent's collection.
pub fn apply_delete(
    tree: &ReminderTree,
    node_id: NodeId,
    level: NodeLevel,
) -> MutationResult<ReminderTree> {
    let mut next = tree.clone();
    let removed = match level {
        NodeLevel::Person => {
            let before = next.persons.len();
            next.persons.retain(|person| person.id != node_id);
            before != next.persons.len()
        }
        NodeLevel::DayGroup => {
            let mut removed = false;
            for person in &mut next.persons {
                let before = person.groups.len();
                person.groups.retain(|group| group.id != node_id);
                if before != person.groups.len() {
                    removed = true;
                    break;
                }
            }
            removed
        }
        NodeLevel::Entry => {
            let mut removed = false;
            'persons: for person in &mut next.persons {
                for group in &mut person.groups {
                    let before = group.entries.len();
                    group.entries.retain(|entry| entry.id != node_id);
                    if before != group.entries.len() {
                        removed = true;
                        break 'persons;
                    }
                }
            }
            removed
        }
    };

    if !removed {
        return Err(MutationError::NodeNotFound { node_id, level });
    }
    Ok(next)
}

/// Appends a new person at the end of display order.
pub fn apply_insert_person(tree: &ReminderTree, person: PersonNode) -> ReminderTree {
    let mut next = tree.clone();
    next.persons.push(person);
    next
}

/// Appends a day group under one person.
///
/// Sibling day-of-week uniqueness is the validator's responsibility and is
/// checked by callers before this mutation.
pub fn apply_insert_group(
    tree: &ReminderTree,
    person_id: NodeId,
    group: DayGroupNode,
) -> MutationResult<ReminderTree> {
    let mut next = tree.clone();
    let person = next
        .persons
        .iter_mut()
        .find(|person| person.id == person_id)
        .ok_or(MutationError::NodeNotFound {
            node_id: person_id,
            level: NodeLevel::Person,
        })?;
    person.groups.push(group);
    Ok(next)
}

/// Appends a reminder entry under one day group.
pub fn apply_insert_entry(
    tree: &ReminderTree,
    group_id: NodeId,
    entry: ReminderEntryNode,
) -> MutationResult<ReminderTree> {
    let mut next = tree.clone();
    let group = next
        .persons
        .iter_mut()
        .flat_map(|person| person.groups.iter_mut())
        .find(|group| group.id == group_id)
        .ok_or(MutationError::NodeNotFound {
            node_id: group_id,
            level: NodeLevel::DayGroup,
        })?;
    group.entries.push(entry);
    Ok(next)
}
