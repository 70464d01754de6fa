//! Derived views over the task collection.
//!
//! Everything here is a pure function of a task slice. Callers recompute after
//! each mutation instead of caching.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::fields::*;
use crate::task::Task;

/// One board column: a status and its tasks in display order.
#[derive(Debug)]
pub struct BoardColumn<'a> {
    pub status: Status,
    pub label: &'static str,
    pub tasks: Vec<&'a Task>,
}

/// Calendar annotation for one day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DueHighlight {
    pub count: usize,
    /// Priorities of the tasks due that day, most severe first. Repeats are kept.
    pub priorities: Vec<Priority>,
}

/// Aggregate counts shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub backlog: usize,
    pub active: usize,
    pub completed: usize,
    pub remaining: usize,
}

/// Stable subsequence of tasks in `status`.
pub fn filter_by_status(tasks: &[Task], status: Status) -> Vec<&Task> {
    tasks.iter().filter(|t| t.status == status).collect()
}

/// Stable partition: tasks with the focus priority first, then the rest.
///
/// With no focus, or when nothing matches, the input comes back unchanged.
pub fn reorder_by_priority_focus<'a>(items: Vec<&'a Task>, focus: Option<Priority>) -> Vec<&'a Task> {
    let Some(focus) = focus else {
        return items;
    };
    let (matched, others): (Vec<&Task>, Vec<&Task>) = items.iter().partition(|t| t.priority == focus);
    if matched.is_empty() {
        return items;
    }
    matched.into_iter().chain(others).collect()
}

/// Focus from free text. Anything but the three priorities means no focus.
pub fn parse_focus(raw: &str) -> Option<Priority> {
    Priority::parse(raw)
}

/// Toggle a focus selection: choosing the current focus again clears it.
pub fn toggle_focus(current: Option<Priority>, chosen: Priority) -> Option<Priority> {
    if current == Some(chosen) {
        None
    } else {
        Some(chosen)
    }
}

/// The list view: one status, optionally priority-focused.
pub fn list_view(tasks: &[Task], status: Status, focus: Option<Priority>) -> Vec<&Task> {
    reorder_by_priority_focus(filter_by_status(tasks, status), focus)
}

/// One column per status in the fixed order, each priority-focused.
pub fn build_board_columns(tasks: &[Task], focus: Option<Priority>) -> Vec<BoardColumn<'_>> {
    Status::ALL
        .iter()
        .map(|&status| BoardColumn {
            status,
            label: status.column_label(),
            tasks: list_view(tasks, status, focus),
        })
        .collect()
}

/// Per-day counts and priorities of tasks with a due date.
pub fn due_date_highlights(tasks: &[Task]) -> BTreeMap<NaiveDate, DueHighlight> {
    let mut map: BTreeMap<NaiveDate, DueHighlight> = BTreeMap::new();
    for task in tasks {
        if let Some(due) = task.due_date {
            let entry = map.entry(due).or_default();
            entry.count += 1;
            entry.priorities.push(task.priority);
        }
    }
    for entry in map.values_mut() {
        entry.priorities.sort_by_key(|p| p.rank());
    }
    map
}

/// Archive sorted newest first by archived, completed, then created time.
pub fn sort_archived_by_recency(archived: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = archived.iter().collect();
    sorted.sort_by(|a, b| b.recency_stamp().cmp(&a.recency_stamp()));
    sorted
}

pub fn stats(tasks: &[Task]) -> Stats {
    let mut s = Stats { total: tasks.len(), ..Stats::default() };
    for task in tasks {
        match task.status {
            Status::Backlog => s.backlog += 1,
            Status::Active => s.active += 1,
            Status::Completed => s.completed += 1,
        }
    }
    s.remaining = s.total - s.completed;
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;
    use chrono::{Duration, Utc};

    fn task(title: &str, priority: Priority, status: Status) -> Task {
        let now = Utc::now();
        let mut t = Task::from_draft(
            TaskDraft { title: title.to_string(), priority, ..Default::default() },
            now,
        );
        t.set_status(status, now);
        t
    }

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_focus_scenario() {
        // Added high, low, medium in that order; new tasks go to the front.
        let mut todos = Vec::new();
        for (title, p) in [("high", Priority::High), ("low", Priority::Low), ("medium", Priority::Medium)] {
            todos.insert(0, task(title, p, Status::Backlog));
        }

        let shown = list_view(&todos, Status::Backlog, None);
        assert_eq!(titles(&shown), vec!["medium", "low", "high"]);

        let focus = toggle_focus(None, Priority::High);
        let shown = list_view(&todos, Status::Backlog, focus);
        assert_eq!(titles(&shown), vec!["high", "medium", "low"]);

        let focus = toggle_focus(focus, Priority::High);
        assert_eq!(focus, None);
        let shown = list_view(&todos, Status::Backlog, focus);
        assert_eq!(titles(&shown), vec!["medium", "low", "high"]);
    }

    #[test]
    fn test_priority_partition_is_stable() {
        let todos = vec![
            task("l1", Priority::Low, Status::Backlog),
            task("h1", Priority::High, Status::Backlog),
            task("m1", Priority::Medium, Status::Backlog),
            task("h2", Priority::High, Status::Backlog),
            task("l2", Priority::Low, Status::Backlog),
        ];
        let items: Vec<&Task> = todos.iter().collect();
        let focused = reorder_by_priority_focus(items.clone(), Some(Priority::High));
        assert_eq!(titles(&focused), vec!["h1", "h2", "l1", "m1", "l2"]);

        let focused = reorder_by_priority_focus(items.clone(), Some(Priority::Low));
        assert_eq!(titles(&focused), vec!["l1", "l2", "h1", "m1", "h2"]);

        assert_eq!(titles(&reorder_by_priority_focus(items.clone(), None)), titles(&items));
        assert_eq!(titles(&reorder_by_priority_focus(items.clone(), parse_focus("bogus"))), titles(&items));
    }

    #[test]
    fn test_focus_without_matches_is_identity() {
        let todos = vec![task("a", Priority::Low, Status::Backlog), task("b", Priority::Medium, Status::Backlog)];
        let items: Vec<&Task> = todos.iter().collect();
        let focused = reorder_by_priority_focus(items.clone(), Some(Priority::High));
        assert_eq!(titles(&focused), titles(&items));
    }

    #[test]
    fn test_board_columns() {
        let todos = vec![
            task("c", Priority::Low, Status::Completed),
            task("a1", Priority::Low, Status::Active),
            task("b", Priority::Medium, Status::Backlog),
            task("a2", Priority::High, Status::Active),
        ];
        let columns = build_board_columns(&todos, Some(Priority::High));
        let labels: Vec<&str> = columns.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["backlog", "active", "done"]);
        assert_eq!(titles(&columns[0].tasks), vec!["b"]);
        assert_eq!(titles(&columns[1].tasks), vec!["a2", "a1"]);
        assert_eq!(titles(&columns[2].tasks), vec!["c"]);
    }

    #[test]
    fn test_due_date_highlights() {
        let day = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut todos = vec![
            task("a", Priority::Low, Status::Backlog),
            task("b", Priority::High, Status::Active),
            task("c", Priority::Low, Status::Backlog),
            task("d", Priority::Medium, Status::Backlog),
        ];
        todos[0].due_date = Some(day);
        todos[1].due_date = Some(day);
        todos[2].due_date = Some(day);
        todos[3].due_date = day.succ_opt();

        let map = due_date_highlights(&todos);
        assert_eq!(map.len(), 2);
        let first = &map[&day];
        assert_eq!(first.count, 3);
        assert_eq!(first.priorities, vec![Priority::High, Priority::Low, Priority::Low]);
        assert_eq!(map[&day.succ_opt().unwrap()].priorities, vec![Priority::Medium]);
    }

    #[test]
    fn test_sort_archived_by_recency() {
        let t0 = Utc::now();
        let mut old = task("old", Priority::Medium, Status::Backlog);
        old.created_at = t0 - Duration::days(3);
        let mut done = task("done", Priority::Medium, Status::Backlog);
        done.set_status(Status::Completed, t0 - Duration::days(1));
        let mut archived = task("archived", Priority::Medium, Status::Backlog);
        archived.set_status(Status::Completed, t0 - Duration::days(5));
        archived.archived_at = Some(t0);

        let list = vec![old, done, archived];
        assert_eq!(titles(&sort_archived_by_recency(&list)), vec!["archived", "done", "old"]);
    }

    #[test]
    fn test_stats() {
        let todos = vec![
            task("a", Priority::Low, Status::Completed),
            task("b", Priority::Low, Status::Active),
            task("c", Priority::Low, Status::Backlog),
            task("d", Priority::Low, Status::Backlog),
        ];
        let s = stats(&todos);
        assert_eq!(s, Stats { total: 4, backlog: 2, active: 1, completed: 1, remaining: 3 });
    }
}
