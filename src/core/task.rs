use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::tags::extract_tags;

/// Schema version written by this build. Anything else is migrated on load.
pub const CURRENT_VERSION: u32 = 2;

/// Stable identifier of a task. Never reassigned once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
    Deleted,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::Deleted,
    ];

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Deleted => "Deleted",
        }
    }

    /// Case-insensitive match on the current vocabulary only.
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_label().eq_ignore_ascii_case(s))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown status '{s}'"))
    }
}

/// Impact rank, 1 (highest) to 4. Out-of-range input is clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const LOWEST: Priority = Priority(4);

    pub fn clamped(n: i64) -> Self {
        Self(n.clamp(1, 4) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn lane(self) -> Lane {
        match self.0 {
            1 => Lane::Div1,
            2 => Lane::Div2,
            3 => Lane::Div3,
            _ => Lane::Div4,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Older writers stored floats; the saturating cast keeps huge values in range.
        let n = f64::deserialize(deserializer)?;
        Ok(Self::clamped(n.round() as i64))
    }
}

/// One of the four fixed priority buckets a task is displayed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    #[serde(rename = "div1")]
    Div1,
    #[serde(rename = "div2")]
    Div2,
    #[serde(rename = "div3")]
    Div3,
    #[serde(rename = "div4")]
    Div4,
}

impl Lane {
    pub const ALL: [Lane; 4] = [Self::Div1, Self::Div2, Self::Div3, Self::Div4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Div1 => "div1",
            Self::Div2 => "div2",
            Self::Div3 => "div3",
            Self::Div4 => "div4",
        }
    }

    pub fn priority(self) -> Priority {
        Priority::clamped(self as i64 + 1)
    }

    /// Parse a `div<N>` identifier. `N` outside 1..=4 is not a lane.
    pub fn parse(s: &str) -> Option<Self> {
        let n: u8 = s.trim().strip_prefix("div")?.parse().ok()?;
        match n {
            1 => Some(Self::Div1),
            2 => Some(Self::Div2),
            3 => Some(Self::Div3),
            4 => Some(Self::Div4),
            _ => None,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown lane '{s}' (expected div1..div4)"))
    }
}

/// The canonical task record, current schema.
///
/// `priority` and `section` are private so they can only change together;
/// `tags` is recomputed by [`Task::refresh_tags`] whenever text changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredTask")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub notes: String,
    pub date_due: Option<DateTime<Utc>>,
    pub date_captured: Option<DateTime<Utc>>,
    pub date_updated: Option<DateTime<Utc>>,
    pub date_closed: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub tags: BTreeSet<String>,
    priority: Priority,
    section: Lane,
    pub deleted: bool,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_attrib: Option<String>,
    pub subtasks: Vec<Value>,
}

/// Wire shape of a current-version record. `section` is read but the
/// in-memory value is always rederived from `priority`.
#[derive(Deserialize)]
struct StoredTask {
    id: TaskId,
    title: String,
    description: String,
    notes: String,
    date_due: Option<DateTime<Utc>>,
    date_captured: Option<DateTime<Utc>>,
    date_updated: Option<DateTime<Utc>>,
    date_closed: Option<DateTime<Utc>>,
    status: TaskStatus,
    tags: BTreeSet<String>,
    priority: Priority,
    #[allow(dead_code)]
    section: Lane,
    deleted: bool,
    version: u32,
    #[serde(default)]
    status_attrib: Option<String>,
    subtasks: Vec<Value>,
}

impl From<StoredTask> for Task {
    fn from(s: StoredTask) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            notes: s.notes,
            date_due: s.date_due,
            date_captured: s.date_captured,
            date_updated: s.date_updated,
            date_closed: s.date_closed,
            status: s.status,
            tags: s.tags,
            priority: s.priority,
            section: s.priority.lane(),
            deleted: s.deleted,
            version: s.version,
            status_attrib: s.status_attrib,
            subtasks: s.subtasks,
        }
    }
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::fresh(),
            title: title.into(),
            description: String::new(),
            notes: String::new(),
            date_due: None,
            date_captured: Some(now),
            date_updated: Some(now),
            date_closed: None,
            status: TaskStatus::Pending,
            tags: BTreeSet::new(),
            priority: Priority::LOWEST,
            section: Lane::Div4,
            deleted: false,
            version: CURRENT_VERSION,
            status_attrib: None,
            subtasks: Vec::new(),
        }
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn section(&self) -> Lane {
        self.section
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
        self.section = priority.lane();
    }

    pub fn set_lane(&mut self, lane: Lane) {
        self.set_priority(lane.priority());
    }

    /// Rederive `tags` from the description.
    pub fn refresh_tags(&mut self) {
        self.tags = extract_tags(&self.description);
    }

    pub fn touch(&mut self) {
        self.date_updated = Some(Utc::now());
    }

    pub fn has_all_tags<'a>(&self, wanted: impl IntoIterator<Item = &'a String>) -> bool {
        wanted.into_iter().all(|t| self.tags.contains(t))
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_closed() && self.date_due.is_some_and(|due| due < now)
    }
}

/// Caller-supplied fields for a new task. Everything else takes defaults.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub notes: String,
    /// Raw due date as typed; normalised on create.
    pub date_due: Option<String>,
    pub priority: Option<i64>,
    pub status: Option<TaskStatus>,
    pub subtasks: Vec<Value>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn due(mut self, raw: impl Into<String>) -> Self {
        self.date_due = Some(raw.into());
        self
    }
}
