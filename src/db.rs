//! Task store and utility functions for task management.
//!
//! This module provides the `TaskStore`, the single owner of the active and
//! archived task collections, along with helpers for identifier resolution,
//! due-date parsing and formatting that the CLI and TUI share.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{ComposeError, Error, Result};
use crate::fields::*;
use crate::migrate;
use crate::reorder;
use crate::storage::{KeyValueStore, TODOS_KEY};
use crate::task::{Task, TaskDraft};

/// The persisted `{ todos, archived }` pair.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoState {
    pub todos: Vec<Task>,
    pub archived: Vec<Task>,
}

/// What `dismiss` did to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    /// An active task was sent back to the backlog.
    Demoted,
    /// Any other task was deleted.
    Removed,
}

/// Owner of the active and archived collections.
///
/// Every mutation that changes state writes the full `TodoState` back to the
/// key-value store. Write failures are logged and swallowed: the in-memory
/// state stays authoritative for the rest of the session.
pub struct TaskStore<S: KeyValueStore> {
    state: TodoState,
    store: S,
    require_due_date: bool,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Load and upgrade the todos record, starting empty if it is missing or unreadable.
    pub fn load(store: S) -> Self {
        let state = match store.get(TODOS_KEY) {
            Ok(Some(raw)) => migrate::upgrade(&raw, Utc::now()),
            Ok(None) => TodoState::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read todos, starting fresh");
                TodoState::default()
            }
        };
        TaskStore { state, store, require_due_date: false }
    }

    /// Require a due date on every new task.
    pub fn with_due_date_required(mut self, required: bool) -> Self {
        self.require_due_date = required;
        self
    }

    pub fn todos(&self) -> &[Task] {
        &self.state.todos
    }

    pub fn archived(&self) -> &[Task] {
        &self.state.archived
    }

    pub fn state(&self) -> &TodoState {
        &self.state
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.state.todos.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.state.todos.iter_mut().find(|t| t.id == id)
    }

    fn persist(&mut self) {
        let data = match serde_json::to_string(&self.state) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize todos");
                return;
            }
        };
        if let Err(e) = self.store.set(TODOS_KEY, &data) {
            tracing::warn!(error = %e, "failed to persist todos");
        }
    }

    /// Check a draft against the create rules without touching the store.
    pub fn validate(&self, draft: &TaskDraft) -> std::result::Result<(), ComposeError> {
        if draft.title.trim().is_empty() {
            return Err(ComposeError::EmptyTitle);
        }
        if self.require_due_date && draft.due_date.is_none() {
            return Err(ComposeError::MissingDueDate);
        }
        Ok(())
    }

    /// Validate a draft and put the new task at the front of the collection.
    pub fn create(&mut self, draft: TaskDraft) -> std::result::Result<String, ComposeError> {
        self.validate(&draft)?;
        let task = Task::from_draft(draft, Utc::now());
        let id = task.id.clone();
        tracing::info!(id = %id, title = %task.title, "task created");
        self.state.todos.insert(0, task);
        self.persist();
        Ok(id)
    }

    /// Move a task between backlog, active and completed.
    pub fn set_status(&mut self, id: &str, status: Status) -> bool {
        let now = Utc::now();
        let changed = match self.get_mut(id) {
            Some(task) => task.set_status(status, now),
            None => false,
        };
        if changed {
            tracing::info!(id, status = %status, "status changed");
            self.persist();
        }
        changed
    }

    pub fn set_priority(&mut self, id: &str, priority: Priority) -> bool {
        let changed = match self.get_mut(id) {
            Some(task) if task.priority != priority => {
                task.priority = priority;
                true
            }
            _ => false,
        };
        if changed {
            self.persist();
        }
        changed
    }

    /// Set a priority from free text. Anything but `high`, `medium` or `low` is ignored.
    pub fn set_priority_value(&mut self, id: &str, raw: &str) -> bool {
        match Priority::parse(raw) {
            Some(priority) => self.set_priority(id, priority),
            None => {
                tracing::debug!(id, raw, "ignoring unknown priority");
                false
            }
        }
    }

    /// Advance a task's priority badge one step and return the new value.
    pub fn cycle_priority(&mut self, id: &str) -> Option<Priority> {
        let next = self.get(id)?.priority.next();
        self.set_priority(id, next);
        Some(next)
    }

    /// Attach a category. Holding a `&Category` proves the category exists.
    pub fn assign_category(&mut self, task_id: &str, category: &Category) -> bool {
        let changed = self
            .get_mut(task_id)
            .map(|task| task.add_category(&category.id))
            .unwrap_or(false);
        if changed {
            self.persist();
        }
        changed
    }

    /// Detach a category from one task.
    pub fn unassign_category_from_task(&mut self, task_id: &str, category_id: &str) -> bool {
        let changed = self
            .get_mut(task_id)
            .map(|task| task.remove_category(category_id))
            .unwrap_or(false);
        if changed {
            self.persist();
        }
        changed
    }

    /// Remove a category reference from every task, active and archived.
    /// Returns how many tasks were touched.
    pub fn unassign_category(&mut self, category_id: &str) -> usize {
        let mut touched = 0;
        for task in self.state.todos.iter_mut().chain(self.state.archived.iter_mut()) {
            if task.remove_category(category_id) {
                touched += 1;
            }
        }
        if touched > 0 {
            tracing::info!(category_id, touched, "category swept from tasks");
            self.persist();
        }
        touched
    }

    /// Delete a task permanently from the active collection.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.state.todos.iter().position(|t| t.id == id)?;
        let task = self.state.todos.remove(idx);
        tracing::info!(id, "task removed");
        self.persist();
        Some(task)
    }

    /// Two-tier delete: active tasks are demoted to the backlog, anything else is removed.
    pub fn dismiss(&mut self, id: &str) -> Option<Dismissal> {
        let status = self.get(id)?.status;
        if status == Status::Active {
            self.set_status(id, Status::Backlog);
            Some(Dismissal::Demoted)
        } else {
            self.remove(id).map(|_| Dismissal::Removed)
        }
    }

    /// Move every completed task into the archive. Returns how many moved.
    ///
    /// The new batch goes to the front of the archive in collection order. An
    /// archived record with the same id is overwritten by the newer one.
    pub fn archive_completed(&mut self) -> usize {
        let now = Utc::now();
        let (batch, keep): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.state.todos)
            .into_iter()
            .partition(|t| t.status == Status::Completed || t.completed);
        self.state.todos = keep;
        if batch.is_empty() {
            return 0;
        }

        let batch: Vec<Task> = batch
            .into_iter()
            .map(|mut t| {
                t.status = Status::Completed;
                t.completed = true;
                t.completed_at.get_or_insert(now);
                t.archived_at.get_or_insert(now);
                t
            })
            .collect();
        let batch_ids: HashSet<String> = batch.iter().map(|t| t.id.clone()).collect();

        let previous = std::mem::take(&mut self.state.archived);
        let moved = batch.len();
        self.state.archived = batch
            .into_iter()
            .chain(previous.into_iter().filter(|t| !batch_ids.contains(&t.id)))
            .collect();
        tracing::info!(moved, archived = self.state.archived.len(), "completed tasks archived");
        self.persist();
        moved
    }

    /// Permanently delete an archived task.
    pub fn remove_archived(&mut self, id: &str) -> Option<Task> {
        let idx = self.state.archived.iter().position(|t| t.id == id)?;
        let task = self.state.archived.remove(idx);
        tracing::info!(id, "archived task deleted");
        self.persist();
        Some(task)
    }

    /// Bring an archived task back to the front of the active collection.
    /// It keeps its completed status and its `archived_at` stamp.
    pub fn restore_archived(&mut self, id: &str) -> Option<&Task> {
        let idx = self.state.archived.iter().position(|t| t.id == id)?;
        let task = self.state.archived.remove(idx);
        self.state.todos.insert(0, task);
        tracing::info!(id, "archived task restored");
        self.persist();
        self.state.todos.first()
    }

    /// Install a reordered collection computed by the reorder engine.
    pub fn apply_order(&mut self, next: Vec<Task>) {
        self.state.todos = next;
        self.persist();
    }

    /// List-mode drop within the currently displayed subset.
    pub fn reorder_list(
        &mut self,
        displayed_ids: &[String],
        source: &str,
        target: Option<&str>,
        position: DropPosition,
    ) -> bool {
        match reorder::reorder_list(&self.state.todos, displayed_ids, source, target, position) {
            Some(next) => {
                tracing::debug!(source, ?target, ?position, "list reordered");
                self.apply_order(next);
                true
            }
            None => false,
        }
    }

    /// Board-mode drop, possibly into another status column.
    pub fn move_in_board(
        &mut self,
        source: &str,
        target_status: Option<Status>,
        target: Option<&str>,
        position: DropPosition,
    ) -> bool {
        let moved = reorder::move_in_board(
            &self.state.todos,
            source,
            target_status,
            target,
            position,
            Utc::now(),
        );
        match moved {
            Some(next) => {
                tracing::debug!(source, ?target_status, ?target, ?position, "board move");
                self.apply_order(next);
                true
            }
            None => false,
        }
    }
}

/// Resolve a task identifier (full id, unique id prefix, or exact title) to a task id.
/// Returns an error if the identifier matches several tasks.
pub fn resolve_task_identifier(identifier: &str, tasks: &[Task]) -> Result<String> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(Error::TaskNotFound(identifier.to_string()));
    }
    if let Some(task) = tasks.iter().find(|t| t.id == identifier) {
        return Ok(task.id.clone());
    }

    let by_prefix: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(identifier)).collect();
    if by_prefix.len() == 1 {
        return Ok(by_prefix[0].id.clone());
    }

    let lower = identifier.to_lowercase();
    let by_title: Vec<&Task> = tasks.iter().filter(|t| t.title.to_lowercase() == lower).collect();
    let matches = if by_title.is_empty() { by_prefix } else { by_title };

    match matches.len() {
        0 => Err(Error::TaskNotFound(identifier.to_string())),
        1 => Ok(matches[0].id.clone()),
        _ => Err(Error::AmbiguousTask {
            query: identifier.to_string(),
            candidates: matches
                .iter()
                .map(|t| format!("{} ({})", short_id(&t.id), t.title))
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// First eight characters of an id, enough to type back as a prefix.
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow"
/// - "monday".."sunday" and "next monday".."next sunday"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD" format
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Duration::try_days(days).and_then(|d| today.checked_add_signed(d));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Duration::try_weeks(weeks).and_then(|d| today.checked_add_signed(d));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
    ];
    let current_day = today.weekday().num_days_from_monday() as i64;
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {}", day_name) {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {}d", delta)
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}

/// Format a timestamp for display in local time.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".into(),
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
