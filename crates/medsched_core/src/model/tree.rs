//! Reminder tree domain model.
//!
//! # Responsibility
//! - Define the Person -> DayGroup -> ReminderEntry hierarchy and its value
//!   types (`DayOfWeek`, `TimeOfDay`).
//! - Provide pure, side-effect-free lookups over one tree snapshot.
//!
//! # Invariants
//! - `id` is stable and never reused for another node.
//! - Child collection order is display order only; it carries no semantic
//!   meaning.
//! - A childless person or day group is a valid leaf state and is reported
//!   as non-expandable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every row in the reminder tree.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type NodeId = Uuid;

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid time regex"));

/// Tree depth of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLevel {
    /// Level 0: the person a schedule belongs to.
    Person,
    /// Level 1: one day-of-week group under a person.
    DayGroup,
    /// Level 2: one reminder entry under a day group.
    Entry,
}

impl NodeLevel {
    /// Returns the level that owns rows of this level, `None` at the root.
    pub fn parent_level(self) -> Option<NodeLevel> {
        match self {
            Self::Person => None,
            Self::DayGroup => Some(Self::Person),
            Self::Entry => Some(Self::DayGroup),
        }
    }

    /// Returns the level of this level's children, `None` at the leaves.
    pub fn child_level(self) -> Option<NodeLevel> {
        match self {
            Self::Person => Some(Self::DayGroup),
            Self::DayGroup => Some(Self::Entry),
            Self::Entry => None,
        }
    }

    /// Stable lowercase name used in logs and shell calls.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::DayGroup => "day_group",
            Self::Entry => "entry",
        }
    }

    /// Parses the stable name produced by [`NodeLevel::as_str`].
    pub fn parse(value: &str) -> Option<NodeLevel> {
        match value.trim().to_ascii_lowercase().as_str() {
            "person" => Some(Self::Person),
            "day_group" => Some(Self::DayGroup),
            "entry" => Some(Self::Entry),
            _ => None,
        }
    }
}

impl Display for NodeLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enumerated day-of-week for one reminder group.
///
/// Wire values are lowercase English day names to match the remote store
/// contract; display labels are capitalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// All seven values in display order, Monday first.
    pub const ALL: [DayOfWeek; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Stable lowercase wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Capitalized display label for the select widget.
    pub fn label(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Parses wire values and display labels, case-insensitive.
    pub fn parse(value: &str) -> Result<DayOfWeek, UnknownDayOfWeek> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str() == normalized)
            .ok_or_else(|| UnknownDayOfWeek {
                value: value.trim().to_string(),
            })
    }
}

impl Display for DayOfWeek {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Input is not one of the seven enumerated day-of-week values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDayOfWeek {
    pub value: String,
}

impl Display for UnknownDayOfWeek {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown day of week: `{}`", self.value)
    }
}

impl Error for UnknownDayOfWeek {}

/// 24-hour wall-clock time for one reminder entry.
///
/// Constructed only through validating entry points, so an existing value is
/// always a real time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Creates a time of day, rejecting out-of-range components.
    pub fn try_new(hour: u8, minute: u8) -> Result<TimeOfDay, InvalidTimeOfDay> {
        if hour > 23 || minute > 59 {
            return Err(InvalidTimeOfDay::OutOfRange { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    /// Parses the `HH:mm` widget representation.
    pub fn parse(value: &str) -> Result<TimeOfDay, InvalidTimeOfDay> {
        let trimmed = value.trim();
        let captures = TIME_OF_DAY_RE
            .captures(trimmed)
            .ok_or_else(|| InvalidTimeOfDay::Malformed {
                value: trimmed.to_string(),
            })?;
        // Capture groups are all-digit and at most two chars, so u8 parse
        // cannot fail; range errors are reported by `try_new`.
        let hour: u8 = captures[1].parse().map_err(|_| InvalidTimeOfDay::Malformed {
            value: trimmed.to_string(),
        })?;
        let minute: u8 = captures[2]
            .parse()
            .map_err(|_| InvalidTimeOfDay::Malformed {
                value: trimmed.to_string(),
            })?;
        Self::try_new(hour, minute)
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            hour: u8,
            minute: u8,
        }
        let raw = Raw::deserialize(deserializer)?;
        TimeOfDay::try_new(raw.hour, raw.minute).map_err(serde::de::Error::custom)
    }
}

/// Time input is malformed or out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidTimeOfDay {
    /// Input does not match the `HH:mm` shape.
    Malformed { value: String },
    /// Components parsed but exceed 23 hours / 59 minutes.
    OutOfRange { hour: u8, minute: u8 },
}

impl Display for InvalidTimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { value } => {
                write!(f, "time must use 24-hour HH:mm form, got `{value}`")
            }
            Self::OutOfRange { hour, minute } => {
                write!(f, "time {hour:02}:{minute:02} is out of range")
            }
        }
    }
}

impl Error for InvalidTimeOfDay {}

/// Level 2 row: one scheduled medication reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEntryNode {
    /// Stable row id used for linking and edit targeting.
    pub id: NodeId,
    pub medication_name: String,
    pub time_of_day: TimeOfDay,
}

impl ReminderEntryNode {
    /// Creates an entry with a generated stable id.
    pub fn new(medication_name: impl Into<String>, time_of_day: TimeOfDay) -> Self {
        Self {
            id: Uuid::new_v4(),
            medication_name: medication_name.into(),
            time_of_day,
        }
    }
}

/// Level 1 row: the reminders for one day of the week under one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayGroupNode {
    pub id: NodeId,
    pub day_of_week: DayOfWeek,
    pub entries: Vec<ReminderEntryNode>,
}

impl DayGroupNode {
    /// Creates an empty day group with a generated stable id.
    pub fn new(day_of_week: DayOfWeek) -> Self {
        Self {
            id: Uuid::new_v4(),
            day_of_week,
            entries: Vec::new(),
        }
    }
}

/// Level 0 row: one person and their reminder schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonNode {
    pub id: NodeId,
    pub name: String,
    pub groups: Vec<DayGroupNode>,
}

impl PersonNode {
    /// Creates a person with no day groups and a generated stable id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            groups: Vec::new(),
        }
    }
}

/// One immutable snapshot of the whole reminder hierarchy for a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderTree {
    pub persons: Vec<PersonNode>,
}

/// Borrowed view of one row, tagged with its level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Person(&'a PersonNode),
    DayGroup(&'a DayGroupNode),
    Entry(&'a ReminderEntryNode),
}

impl<'a> NodeRef<'a> {
    pub fn id(self) -> NodeId {
        match self {
            Self::Person(person) => person.id,
            Self::DayGroup(group) => group.id,
            Self::Entry(entry) => entry.id,
        }
    }

    pub fn level(self) -> NodeLevel {
        match self {
            Self::Person(_) => NodeLevel::Person,
            Self::DayGroup(_) => NodeLevel::DayGroup,
            Self::Entry(_) => NodeLevel::Entry,
        }
    }

    /// Next-level child collection; always empty for entries.
    pub fn children(self) -> Vec<NodeRef<'a>> {
        match self {
            Self::Person(person) => person.groups.iter().map(NodeRef::DayGroup).collect(),
            Self::DayGroup(group) => group.entries.iter().map(NodeRef::Entry).collect(),
            Self::Entry(_) => Vec::new(),
        }
    }

    /// Whether the grid should render an expand affordance for this row.
    ///
    /// Childless rows are valid leaf states but are not expandable.
    pub fn is_expandable(self) -> bool {
        match self {
            Self::Person(person) => !person.groups.is_empty(),
            Self::DayGroup(group) => !group.entries.is_empty(),
            Self::Entry(_) => false,
        }
    }
}

/// Pure child lookup matching the grid's expand behavior.
pub fn children_of<'a>(node: NodeRef<'a>) -> Vec<NodeRef<'a>> {
    node.children()
}

impl ReminderTree {
    pub fn new(persons: Vec<PersonNode>) -> Self {
        Self { persons }
    }

    /// Locates one row by stable id at the stated level.
    pub fn find(&self, node_id: NodeId, level: NodeLevel) -> Option<NodeRef<'_>> {
        match level {
            NodeLevel::Person => self
                .persons
                .iter()
                .find(|person| person.id == node_id)
                .map(NodeRef::Person),
            NodeLevel::DayGroup => self
                .persons
                .iter()
                .flat_map(|person| person.groups.iter())
                .find(|group| group.id == node_id)
                .map(NodeRef::DayGroup),
            NodeLevel::Entry => self
                .persons
                .iter()
                .flat_map(|person| person.groups.iter())
                .flat_map(|group| group.entries.iter())
                .find(|entry| entry.id == node_id)
                .map(NodeRef::Entry),
        }
    }

    pub fn contains(&self, node_id: NodeId, level: NodeLevel) -> bool {
        self.find(node_id, level).is_some()
    }

    /// Returns the person owning one day group, if the group exists.
    pub fn person_owning_group(&self, group_id: NodeId) -> Option<&PersonNode> {
        self.persons
            .iter()
            .find(|person| person.groups.iter().any(|group| group.id == group_id))
    }

    /// Returns the day group owning one entry, if the entry exists.
    pub fn group_owning_entry(&self, entry_id: NodeId) -> Option<&DayGroupNode> {
        self.persons
            .iter()
            .flat_map(|person| person.groups.iter())
            .find(|group| group.entries.iter().any(|entry| entry.id == entry_id))
    }

    /// Collects the ids of one row and all of its descendants.
    ///
    /// Returns `None` when the row does not exist at the stated level.
    pub fn subtree_ids(&self, node_id: NodeId, level: NodeLevel) -> Option<Vec<NodeId>> {
        let root = self.find(node_id, level)?;
        let mut ids = Vec::new();
        collect_subtree_ids(root, &mut ids);
        Some(ids)
    }
}

fn collect_subtree_ids(node: NodeRef<'_>, ids: &mut Vec<NodeId>) {
    ids.push(node.id());
    for child in node.children() {
        collect_subtree_ids(child, ids);
    }
}
