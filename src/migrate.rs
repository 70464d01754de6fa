//! Schema upgrade for persisted task records.
//!
//! Stored data has gone through two shapes:
//!
//! - **v0**: a bare JSON array of tasks, some of which predate `status`,
//!   `priority`, `description` or `archivedAt`.
//! - **v1**: `{ "todos": [...], "archived": [...] }`.
//!
//! Loading always runs `upgrade`, which detects the schema, lifts it to v1 and
//! then normalizes every record field by field. Anything unreadable degrades to
//! an empty state instead of failing startup.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db::TodoState;
use crate::fields::*;
use crate::task::Task;

/// Detected layout of a stored todos record.
#[derive(Debug, PartialEq)]
pub enum Schema {
    /// Bare array of tasks.
    V0(Vec<Value>),
    /// Object holding the active and archived collections.
    V1 { todos: Vec<Value>, archived: Vec<Value> },
    /// Anything else: scalars, null.
    Unrecognised,
}

impl Schema {
    pub fn detect(value: Value) -> Schema {
        match value {
            Value::Array(items) => Schema::V0(items),
            Value::Object(mut obj) => Schema::V1 {
                todos: take_array(&mut obj, "todos"),
                archived: take_array(&mut obj, "archived"),
            },
            _ => Schema::Unrecognised,
        }
    }

    /// Lift any older layout to v1.
    fn into_v1(self) -> (Vec<Value>, Vec<Value>) {
        match self {
            Schema::V0(items) => (items, Vec::new()),
            Schema::V1 { todos, archived } => (todos, archived),
            Schema::Unrecognised => (Vec::new(), Vec::new()),
        }
    }
}

fn take_array(obj: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match obj.remove(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Parse and upgrade a raw todos record into the current in-memory state.
pub fn upgrade(raw: &str, now: DateTime<Utc>) -> TodoState {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "todos record is not valid JSON, starting fresh");
            return TodoState::default();
        }
    };
    upgrade_value(value, now)
}

/// Upgrade an already-parsed record.
pub fn upgrade_value(value: Value, now: DateTime<Utc>) -> TodoState {
    let schema = Schema::detect(value);
    if schema == Schema::Unrecognised {
        tracing::warn!("todos record has an unrecognised shape, starting fresh");
    }
    let (todos, archived) = schema.into_v1();
    let todos = normalize_all(&todos, now);
    let archived = normalize_all(&archived, now);
    tracing::debug!(todos = todos.len(), archived = archived.len(), "todos record loaded");
    TodoState { todos, archived }
}

fn normalize_all(items: &[Value], now: DateTime<Utc>) -> Vec<Task> {
    items
        .iter()
        .filter_map(|item| {
            let task = normalize_task(item, now);
            if task.is_none() {
                tracing::warn!("dropping unreadable task record");
            }
            task
        })
        .collect()
}

/// Coerce one stored record into a `Task`.
///
/// Returns `None` for non-objects and for records without a usable title.
pub fn normalize_task(value: &Value, now: DateTime<Utc>) -> Option<Task> {
    let obj = value.as_object()?;

    let title = obj.get("title")?.as_str()?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => Uuid::new_v4().to_string(),
    };

    let legacy_completed = obj.get("completed").and_then(Value::as_bool).unwrap_or(false);
    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .and_then(Status::parse)
        .unwrap_or(if legacy_completed { Status::Completed } else { Status::Backlog });

    let priority = obj
        .get("priority")
        .and_then(Value::as_str)
        .and_then(Priority::parse)
        .unwrap_or_default();

    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let due_date = obj
        .get("dueDate")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

    let mut categories: Vec<String> = Vec::new();
    if let Some(Value::Array(items)) = obj.get("categories") {
        for id in items.iter().filter_map(Value::as_str) {
            if !categories.iter().any(|c| c == id) {
                categories.push(id.to_string());
            }
        }
    }

    let created_at = timestamp(obj, "createdAt").unwrap_or(now);
    let activated_at = timestamp(obj, "activatedAt");
    let completed_at = if status == Status::Completed {
        Some(timestamp(obj, "completedAt").unwrap_or(now))
    } else {
        None
    };
    let archived_at = timestamp(obj, "archivedAt");

    Some(Task {
        id,
        title,
        description,
        status,
        priority,
        due_date,
        categories,
        created_at,
        activated_at,
        completed_at,
        archived_at,
        completed: status == Status::Completed,
    })
}

fn timestamp(obj: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let raw = obj.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
