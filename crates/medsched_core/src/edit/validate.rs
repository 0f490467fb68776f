//! Draft validation above the mutation layer.
//!
//! # Responsibility
//! - Check required/format rules per the field schema of the node's level.
//! - Enforce day-of-week uniqueness across one person's day groups.
//!
//! # Invariants
//! - Validation has no side effects; a rejection leaves tree and session
//!   untouched.
//! - Free-text fields are trimmed; blank-after-trim fails the required rule.

use crate::model::schema::{fields_for, DraftValues, FieldInput, FieldKey};
use crate::model::tree::{
    DayOfWeek, NodeId, NodeLevel, PersonNode, ReminderTree, TimeOfDay,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Typed field values produced by a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedFields {
    Person {
        name: String,
    },
    DayGroup {
        day_of_week: DayOfWeek,
    },
    Entry {
        medication_name: String,
        time_of_day: TimeOfDay,
    },
}

impl ValidatedFields {
    /// The level whose rows these fields belong to.
    pub fn level(&self) -> NodeLevel {
        match self {
            Self::Person { .. } => NodeLevel::Person,
            Self::DayGroup { .. } => NodeLevel::DayGroup,
            Self::Entry { .. } => NodeLevel::Entry,
        }
    }
}

/// One field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: FieldKey,
    pub message: String,
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Why a draft was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftRejection {
    /// Required/format rules failed; per-field messages included.
    Invalid { issues: Vec<FieldIssue> },
    /// Saving would give two sibling day groups the same day.
    DuplicateDayOfWeek { day: DayOfWeek },
}

impl Display for DraftRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { issues } => {
                write!(f, "draft is invalid:")?;
                for issue in issues {
                    write!(f, " [{issue}]")?;
                }
                Ok(())
            }
            Self::DuplicateDayOfWeek { day } => {
                write!(f, "another group for this person already uses {day}")
            }
        }
    }
}

impl Error for DraftRejection {}

/// Validates one draft for the row at `node_id`/`level` in `tree`.
///
/// The tree is consulted only for the cross-sibling day-of-week rule; the
/// row itself may already be gone, in which case the structural check is
/// left to the mutation engine's identity lookup.
pub fn validate_draft(
    tree: &ReminderTree,
    node_id: NodeId,
    level: NodeLevel,
    draft: &DraftValues,
) -> Result<ValidatedFields, DraftRejection> {
    let mut issues = Vec::new();

    let mut name = None;
    let mut day_of_week = None;
    let mut medication_name = None;
    let mut time_of_day = None;

    for spec in fields_for(level) {
        let raw = draft.get(&spec.key).map(|value| value.trim());
        let raw = match raw {
            Some(value) if !value.is_empty() => value,
            _ => {
                if spec.required {
                    issues.push(FieldIssue {
                        field: spec.key,
                        message: "value is required".to_string(),
                    });
                }
                continue;
            }
        };

        match spec.input {
            FieldInput::FreeText => match spec.key {
                FieldKey::Name => name = Some(raw.to_string()),
                FieldKey::MedicationName => medication_name = Some(raw.to_string()),
                _ => {}
            },
            FieldInput::DayOfWeekSelect => match DayOfWeek::parse(raw) {
                Ok(day) => day_of_week = Some(day),
                Err(err) => issues.push(FieldIssue {
                    field: spec.key,
                    message: err.to_string(),
                }),
            },
            FieldInput::TimeOfDay24h => match TimeOfDay::parse(raw) {
                Ok(time) => time_of_day = Some(time),
                Err(err) => issues.push(FieldIssue {
                    field: spec.key,
                    message: err.to_string(),
                }),
            },
        }
    }

    if !issues.is_empty() {
        return Err(DraftRejection::Invalid { issues });
    }

    match level {
        NodeLevel::Person => Ok(ValidatedFields::Person {
            name: name.expect("required person name present after checks"),
        }),
        NodeLevel::DayGroup => {
            let day = day_of_week.expect("required day-of-week present after checks");
            if let Some(person) = tree.person_owning_group(node_id) {
                ensure_unique_day(person, day, Some(node_id))?;
            }
            Ok(ValidatedFields::DayGroup { day_of_week: day })
        }
        NodeLevel::Entry => Ok(ValidatedFields::Entry {
            medication_name: medication_name
                .expect("required medication name present after checks"),
            time_of_day: time_of_day.expect("required time present after checks"),
        }),
    }
}

/// Rejects `day` when another of `person`'s groups already uses it.
///
/// `exclude` names the group being edited so a no-op day save passes.
pub fn ensure_unique_day(
    person: &PersonNode,
    day: DayOfWeek,
    exclude: Option<NodeId>,
) -> Result<(), DraftRejection> {
    let duplicate = person
        .groups
        .iter()
        .filter(|group| Some(group.id) != exclude)
        .any(|group| group.day_of_week == day);
    if duplicate {
        return Err(DraftRejection::DuplicateDayOfWeek { day });
    }
    Ok(())
}

/// Trims free-text input for insert flows, rejecting blank values with the
/// same message the edit path produces.
pub fn normalized_required_text(
    value: &str,
    field: FieldKey,
) -> Result<String, DraftRejection> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DraftRejection::Invalid {
            issues: vec![FieldIssue {
                field,
                message: "value is required".to_string(),
            }],
        });
    }
    Ok(trimmed.to_string())
}
