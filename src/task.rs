//! Task data structure and its lifecycle rules.
//!
//! This module defines the core `Task` struct and the status transition that every
//! status change (checkbox, button, board drop) goes through, so that the
//! `activatedAt`/`completedAt` bookkeeping lives in exactly one place.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::*;

/// A unit of work.
///
/// `completed` mirrors `status == Completed` and is kept for records written by
/// older versions that only knew a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// Input collected by the composer for a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub categories: Vec<String>,
}

impl Task {
    /// Build a fresh backlog task from a validated draft.
    pub fn from_draft(draft: TaskDraft, now: DateTime<Utc>) -> Self {
        let mut categories: Vec<String> = Vec::with_capacity(draft.categories.len());
        for id in draft.categories {
            if !categories.contains(&id) {
                categories.push(id);
            }
        }
        Task {
            id: Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            status: Status::Backlog,
            priority: draft.priority,
            due_date: draft.due_date,
            categories,
            created_at: now,
            activated_at: None,
            completed_at: None,
            archived_at: None,
            completed: false,
        }
    }

    /// Move the task to `status`, applying the timestamp bookkeeping.
    ///
    /// Entering `Active` or `Completed` stamps `activated_at` if unset, entering
    /// `Completed` stamps `completed_at`, and returning to `Backlog` clears both.
    /// Returns `false` when the task is already in `status`.
    pub fn set_status(&mut self, status: Status, now: DateTime<Utc>) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        match status {
            Status::Backlog => {
                self.activated_at = None;
                self.completed_at = None;
            }
            Status::Active => {
                self.activated_at.get_or_insert(now);
                self.completed_at = None;
            }
            Status::Completed => {
                self.activated_at.get_or_insert(now);
                self.completed_at = Some(now);
            }
        }
        self.completed = status == Status::Completed;
        true
    }

    pub fn has_category(&self, category_id: &str) -> bool {
        self.categories.iter().any(|c| c == category_id)
    }

    /// Append a category reference, keeping insertion order. Returns `false` if already present.
    pub fn add_category(&mut self, category_id: &str) -> bool {
        if self.has_category(category_id) {
            return false;
        }
        self.categories.push(category_id.to_string());
        true
    }

    pub fn remove_category(&mut self, category_id: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c != category_id);
        self.categories.len() != before
    }

    /// Timestamp used to order the archive: archived, else completed, else created.
    pub fn recency_stamp(&self) -> DateTime<Utc> {
        self.archived_at
            .or(self.completed_at)
            .unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft { title: title.to_string(), ..Default::default() }
    }

    fn assert_status_invariant(task: &Task) {
        assert_eq!(task.completed_at.is_some(), task.status == Status::Completed);
        assert_eq!(task.completed, task.status == Status::Completed);
    }

    #[test]
    fn test_from_draft_defaults() {
        let now = Utc::now();
        let mut d = draft("  write docs  ");
        d.categories = vec!["a".into(), "b".into(), "a".into()];
        let task = Task::from_draft(d, now);
        assert_eq!(task.title, "write docs");
        assert_eq!(task.status, Status::Backlog);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.categories, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(task.created_at, now);
        assert!(task.activated_at.is_none());
        assert_status_invariant(&task);
    }

    #[test]
    fn test_status_transitions_keep_invariant() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);
        let t2 = t0 + Duration::minutes(10);
        let mut task = Task::from_draft(draft("a"), t0);

        assert!(task.set_status(Status::Active, t1));
        assert_eq!(task.activated_at, Some(t1));
        assert_status_invariant(&task);

        assert!(task.set_status(Status::Completed, t2));
        assert_eq!(task.activated_at, Some(t1));
        assert_eq!(task.completed_at, Some(t2));
        assert_status_invariant(&task);

        assert!(task.set_status(Status::Active, t2));
        assert!(task.completed_at.is_none());
        assert_status_invariant(&task);

        assert!(task.set_status(Status::Backlog, t2));
        assert!(task.activated_at.is_none());
        assert!(task.completed_at.is_none());
        assert_status_invariant(&task);
    }

    #[test]
    fn test_completing_from_backlog_stamps_activation() {
        let now = Utc::now();
        let mut task = Task::from_draft(draft("a"), now);
        task.set_status(Status::Completed, now);
        assert_eq!(task.activated_at, Some(now));
        assert_eq!(task.completed_at, Some(now));
    }

    #[test]
    fn test_same_status_is_noop() {
        let now = Utc::now();
        let mut task = Task::from_draft(draft("a"), now);
        assert!(!task.set_status(Status::Backlog, now));
    }

    #[test]
    fn test_recency_stamp_preference() {
        let t0 = Utc::now();
        let mut task = Task::from_draft(draft("a"), t0);
        assert_eq!(task.recency_stamp(), t0);
        let t1 = t0 + Duration::hours(1);
        task.set_status(Status::Completed, t1);
        assert_eq!(task.recency_stamp(), t1);
        let t2 = t0 + Duration::hours(2);
        task.archived_at = Some(t2);
        assert_eq!(task.recency_stamp(), t2);
    }
}
