//! Per-level editable field schema for the grid's edit surface.
//!
//! # Responsibility
//! - Name the editable fields of each tree level and their input kinds.
//! - Produce widget-string drafts from current node values.

use crate::model::tree::{NodeLevel, NodeRef};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Editable field identifier, unique within one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldKey {
    /// Person display name.
    Name,
    /// Day group day-of-week select.
    DayOfWeek,
    /// Entry medication name.
    MedicationName,
    /// Entry reminder time.
    TimeOfDay,
}

impl FieldKey {
    /// Stable field name used by the shell and in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DayOfWeek => "day_of_week",
            Self::MedicationName => "medication_name",
            Self::TimeOfDay => "time_of_day",
        }
    }

    /// Parses the stable name produced by [`FieldKey::as_str`].
    pub fn parse(value: &str) -> Option<FieldKey> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "day_of_week" => Some(Self::DayOfWeek),
            "medication_name" => Some(Self::MedicationName),
            "time_of_day" => Some(Self::TimeOfDay),
            _ => None,
        }
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input widget kind for one editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput {
    FreeText,
    DayOfWeekSelect,
    /// 24-hour `HH:mm` time input.
    TimeOfDay24h,
}

/// One editable field of a level's row schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub input: FieldInput,
    pub required: bool,
}

const PERSON_FIELDS: [FieldSpec; 1] = [FieldSpec {
    key: FieldKey::Name,
    input: FieldInput::FreeText,
    required: true,
}];

const DAY_GROUP_FIELDS: [FieldSpec; 1] = [FieldSpec {
    key: FieldKey::DayOfWeek,
    input: FieldInput::DayOfWeekSelect,
    required: true,
}];

const ENTRY_FIELDS: [FieldSpec; 2] = [
    FieldSpec {
        key: FieldKey::MedicationName,
        input: FieldInput::FreeText,
        required: true,
    },
    FieldSpec {
        key: FieldKey::TimeOfDay,
        input: FieldInput::TimeOfDay24h,
        required: true,
    },
];

/// Editable field set for one level, in display order.
pub fn fields_for(level: NodeLevel) -> &'static [FieldSpec] {
    match level {
        NodeLevel::Person => &PERSON_FIELDS,
        NodeLevel::DayGroup => &DAY_GROUP_FIELDS,
        NodeLevel::Entry => &ENTRY_FIELDS,
    }
}

/// Raw widget-string values for one draft, keyed by field.
pub type DraftValues = BTreeMap<FieldKey, String>;

/// Current node values normalized to the representation the input widgets
/// use (`HH:mm` for times, lowercase wire value for day-of-week).
pub fn draft_of(node: NodeRef<'_>) -> DraftValues {
    let mut values = DraftValues::new();
    match node {
        NodeRef::Person(person) => {
            values.insert(FieldKey::Name, person.name.clone());
        }
        NodeRef::DayGroup(group) => {
            values.insert(FieldKey::DayOfWeek, group.day_of_week.as_str().to_string());
        }
        NodeRef::Entry(entry) => {
            values.insert(FieldKey::MedicationName, entry.medication_name.clone());
            values.insert(FieldKey::TimeOfDay, entry.time_of_day.to_string());
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::{draft_of, fields_for, FieldInput, FieldKey};
    use crate::model::tree::{NodeLevel, NodeRef, ReminderEntryNode, TimeOfDay};

    #[test]
    fn entry_schema_has_text_and_time_inputs() {
        let fields = fields_for(NodeLevel::Entry);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key, FieldKey::MedicationName);
        assert_eq!(fields[0].input, FieldInput::FreeText);
        assert_eq!(fields[1].key, FieldKey::TimeOfDay);
        assert_eq!(fields[1].input, FieldInput::TimeOfDay24h);
        assert!(fields.iter().all(|field| field.required));
    }

    #[test]
    fn draft_of_entry_renders_time_as_widget_string() {
        let entry = ReminderEntryNode::new("Dipirona", TimeOfDay::try_new(7, 5).unwrap());
        let draft = draft_of(NodeRef::Entry(&entry));
        assert_eq!(draft.get(&FieldKey::MedicationName).unwrap(), "Dipirona");
        assert_eq!(draft.get(&FieldKey::TimeOfDay).unwrap(), "07:05");
    }

    #[test]
    fn field_key_round_trips_through_stable_names() {
        for key in [
            FieldKey::Name,
            FieldKey::DayOfWeek,
            FieldKey::MedicationName,
            FieldKey::TimeOfDay,
        ] {
            assert_eq!(FieldKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(FieldKey::parse("dosage"), None);
    }
}
