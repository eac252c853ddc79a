//! Upgrades task records of any older shape to the current schema.
//!
//! The migrator works on raw JSON so it can read records this build has no
//! type for. It never fails on a field it cannot interpret: that field takes
//! its documented default and the rest of the record still converts.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::core::tags::{extract_tags, normalize_tag};
use crate::core::task::{CURRENT_VERSION, Priority, Task, TaskId, TaskStatus};
use crate::core::temporal::timestamp_from_value;

const TITLE_KEYS: &[&str] = &["title", "taskTitle", "name"];
const DESCRIPTION_KEYS: &[&str] = &["description", "taskDescription", "desc", "text"];
const LANE_KEYS: &[&str] = &["section", "lane", "div"];
const DUE_KEYS: &[&str] = &["date_due", "dueDate", "due"];
const CAPTURED_KEYS: &[&str] = &["date_captured", "dateCaptured", "created"];
const UPDATED_KEYS: &[&str] = &["date_updated", "dateUpdated", "updated"];
const CLOSED_KEYS: &[&str] = &["date_closed", "dateClosed", "closed"];

/// Schema version a raw record claims, if any.
pub fn record_version(record: &Value) -> Option<u64> {
    record.get("version").and_then(Value::as_u64)
}

pub fn is_current(record: &Value) -> bool {
    record_version(record) == Some(CURRENT_VERSION as u64)
}

/// How a raw record reached the current schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// Current version, stored exactly as it reads.
    Unchanged,
    /// Current version, but some stored field had to be coerced or rederived.
    Resynced,
    /// Older shape, mapped through the legacy field aliases.
    Upgraded,
}

/// Convert one raw record into a current-schema [`Task`].
///
/// Returns `None` only when the value is not an object.
pub fn migrate_record(record: &Value) -> Option<Task> {
    classify_record(record).map(|(task, _)| task)
}

/// Like [`migrate_record`], also reporting which path the record took.
pub fn classify_record(record: &Value) -> Option<(Task, Migration)> {
    let obj = record.as_object()?;
    if !is_current(record) {
        return Some((upgrade(obj), Migration::Upgraded));
    }
    match serde_json::from_value::<Task>(record.clone()) {
        Ok(task) if derived_fields_match(obj, &task) => Some((task, Migration::Unchanged)),
        Ok(task) => {
            log::debug!("Task {} stored a stale section or priority", task.id);
            Some((task, Migration::Resynced))
        }
        Err(e) => {
            log::warn!("Current-version record does not parse cleanly, coercing: {}", e);
            Some((coerce_current(obj), Migration::Resynced))
        }
    }
}

fn derived_fields_match(obj: &Map<String, Value>, task: &Task) -> bool {
    obj.get("section").and_then(Value::as_str) == Some(task.section().as_str())
        && obj.get("priority").and_then(Value::as_u64) == Some(u64::from(task.priority().get()))
}

/// Field-by-field read of a current-version record that failed the strict
/// parse. Every field keeps its current-schema key; only the values that do
/// not read cleanly fall back to defaults.
fn coerce_current(obj: &Map<String, Value>) -> Task {
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let timestamp = |key: &str| obj.get(key).and_then(timestamp_from_value);

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .map(status_from_legacy)
        .unwrap_or(TaskStatus::Pending);

    let mut task = Task::new(text("title"));
    task.id = legacy_id(obj.get("id")).unwrap_or_else(TaskId::fresh);
    task.description = text("description");
    task.notes = text("notes");
    task.date_due = timestamp("date_due");
    task.date_captured = timestamp("date_captured");
    task.date_updated = timestamp("date_updated");
    task.date_closed = timestamp("date_closed");
    task.status = status;
    task.tags = legacy_tags(obj.get("tags"));
    task.tags.extend(extract_tags(&task.description));
    task.set_priority(
        numeric_priority(obj)
            .or_else(|| lane_priority(obj))
            .unwrap_or(Priority::LOWEST),
    );
    task.deleted = obj
        .get("deleted")
        .and_then(Value::as_bool)
        .unwrap_or(status == TaskStatus::Deleted);
    task.status_attrib = obj
        .get("status_attrib")
        .and_then(Value::as_str)
        .map(str::to_string);
    task.subtasks = obj
        .get("subtasks")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    task
}

fn upgrade(obj: &Map<String, Value>) -> Task {
    let title = first_string(obj, TITLE_KEYS).unwrap_or_default();
    let description = first_string(obj, DESCRIPTION_KEYS).unwrap_or_default();

    let mut tags = legacy_tags(obj.get("tags"));
    tags.extend(extract_tags(&format!("{description} {title}")));

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .map(status_from_legacy)
        .unwrap_or(TaskStatus::Pending);

    let deleted = obj
        .get("deleted")
        .and_then(Value::as_bool)
        .unwrap_or(status == TaskStatus::Deleted);

    let provenance = match record_version_of(obj) {
        Some(v) => format!("migrated:v{v}"),
        None => "migrated:v1".to_string(),
    };

    let mut task = Task::new(title);
    task.id = legacy_id(obj.get("id")).unwrap_or_else(TaskId::fresh);
    task.description = description;
    task.notes = String::new();
    task.date_due = first_timestamp(obj, DUE_KEYS);
    task.date_captured = first_timestamp(obj, CAPTURED_KEYS);
    task.date_updated = first_timestamp(obj, UPDATED_KEYS);
    task.date_closed = first_timestamp(obj, CLOSED_KEYS);
    task.status = status;
    task.tags = tags;
    task.set_priority(legacy_priority(obj));
    task.deleted = deleted;
    task.version = CURRENT_VERSION;
    task.status_attrib = Some(provenance);
    task.subtasks = obj
        .get("subtasks")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    log::debug!("Migrated task {} ({})", task.id, task.title);
    task
}

fn record_version_of(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("version")? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(|v| v.as_str().map(str::to_string))
}

fn first_timestamp(
    obj: &Map<String, Value>,
    keys: &[&str],
) -> Option<chrono::DateTime<chrono::Utc>> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find_map(timestamp_from_value)
}

fn legacy_id(value: Option<&Value>) -> Option<TaskId> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(TaskId::from(s.as_str())),
        Value::Number(n) => Some(TaskId::from(n.to_string())),
        _ => None,
    }
}

/// Legacy tags arrive either as an array or as one `,`/`;` delimited string.
fn legacy_tags(value: Option<&Value>) -> BTreeSet<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(normalize_tag)
            .collect(),
        Some(Value::String(s)) => s
            .split([',', ';'])
            .filter_map(normalize_tag)
            .collect(),
        _ => BTreeSet::new(),
    }
}

pub fn status_from_legacy(s: &str) -> TaskStatus {
    if let Some(status) = TaskStatus::from_label(s) {
        return status;
    }
    match s.trim().to_lowercase().as_str() {
        "to do" | "todo" | "open" | "new" => TaskStatus::Pending,
        "doing" | "in-progress" | "inprogress" | "started" => TaskStatus::InProgress,
        "done" | "complete" | "closed" => TaskStatus::Completed,
        "canceled" => TaskStatus::Cancelled,
        "removed" | "trash" => TaskStatus::Deleted,
        other => {
            log::warn!("Unknown legacy status '{}', using Pending", other);
            TaskStatus::Pending
        }
    }
}

/// Lane identifier first, then a bare numeric priority, then the lowest lane.
fn legacy_priority(obj: &Map<String, Value>) -> Priority {
    lane_priority(obj)
        .or_else(|| numeric_priority(obj))
        .unwrap_or(Priority::LOWEST)
}

fn lane_priority(obj: &Map<String, Value>) -> Option<Priority> {
    LANE_KEYS
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find_map(|s| s.trim().strip_prefix("div")?.parse::<i64>().ok())
        .map(Priority::clamped)
}

fn numeric_priority(obj: &Map<String, Value>) -> Option<Priority> {
    let n = match obj.get("priority")? {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i64),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    Some(Priority::clamped(n))
}
