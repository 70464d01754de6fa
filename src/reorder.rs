//! Drag-and-drop reordering.
//!
//! Both entry points are pure: they take the current collection plus the
//! gesture parameters and return the next collection, or `None` when the drop
//! changes nothing. Stale ids are treated as no-ops.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::fields::*;
use crate::task::Task;

/// Reorder within a flat, possibly filtered, view.
///
/// `displayed_ids` is the order the user currently sees. Only those slots of
/// `all` are rewritten: tasks outside the view keep their absolute positions.
pub fn reorder_list(
    all: &[Task],
    displayed_ids: &[String],
    source: &str,
    target: Option<&str>,
    position: DropPosition,
) -> Option<Vec<Task>> {
    if target == Some(source) {
        return None;
    }
    let source_index = displayed_ids.iter().position(|id| id == source)?;

    let mut working: Vec<&str> = displayed_ids.iter().map(String::as_str).collect();
    let moved = working.remove(source_index);

    let insertion = match target {
        None => working.len(),
        Some(target) => {
            let target_index = working.iter().position(|id| *id == target)?;
            match position {
                DropPosition::Before => target_index,
                DropPosition::After => target_index + 1,
            }
        }
    };
    working.insert(insertion, moved);

    if working.iter().zip(displayed_ids).all(|(a, b)| *a == b.as_str()) {
        return None;
    }

    let by_id: HashMap<&str, &Task> = all.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut queue = Vec::with_capacity(working.len());
    for id in &working {
        queue.push(*by_id.get(id)?);
    }

    let displayed: HashSet<&str> = displayed_ids.iter().map(String::as_str).collect();
    let mut queue = queue.into_iter();
    let mut next = Vec::with_capacity(all.len());
    for task in all {
        if !displayed.contains(task.id.as_str()) {
            next.push(task.clone());
        } else if let Some(replacement) = queue.next() {
            next.push(replacement.clone());
        }
    }
    Some(next)
}

/// Move a card on the board, possibly into another column.
///
/// A status change applies the same bookkeeping as `Task::set_status`. Without
/// a resolvable `target`, the card lands at the start or end of the target
/// column's run, or, for an empty column, just before the first card of a
/// later column so same-status cards stay contiguous.
pub fn move_in_board(
    all: &[Task],
    source: &str,
    target_status: Option<Status>,
    target: Option<&str>,
    position: DropPosition,
    now: DateTime<Utc>,
) -> Option<Vec<Task>> {
    let source_index = all.iter().position(|t| t.id == source)?;

    let mut remaining: Vec<Task> = all.to_vec();
    let mut moved = remaining.remove(source_index);
    let next_status = target_status.unwrap_or(moved.status);
    moved.set_status(next_status, now);

    let mut insertion = default_insertion(&remaining, next_status, position);
    if let Some(target) = target {
        if let Some(target_index) = remaining.iter().position(|t| t.id == target) {
            insertion = match position {
                DropPosition::Before => target_index,
                DropPosition::After => target_index + 1,
            };
        }
    }
    remaining.insert(insertion, moved);

    if remaining.as_slice() == all {
        return None;
    }
    Some(remaining)
}

fn default_insertion(remaining: &[Task], status: Status, position: DropPosition) -> usize {
    let matching: Vec<usize> = remaining
        .iter()
        .enumerate()
        .filter(|(_, t)| t.status == status)
        .map(|(i, _)| i)
        .collect();

    match (matching.first(), matching.last()) {
        (Some(&first), Some(&last)) => match position {
            DropPosition::Before => first,
            DropPosition::After => last + 1,
        },
        _ => {
            let column = status.column_index();
            remaining
                .iter()
                .position(|t| t.status.column_index() > column)
                .unwrap_or(remaining.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    fn task(id: &str, status: Status) -> Task {
        let now = Utc::now();
        let mut t = Task::from_draft(TaskDraft { title: id.to_string(), ..Default::default() }, now);
        t.id = id.to_string();
        t.set_status(status, now);
        t
    }

    fn ids(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn strings(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn abc() -> Vec<Task> {
        vec![task("A", Status::Backlog), task("B", Status::Backlog), task("C", Status::Backlog)]
    }

    #[test]
    fn test_drop_after_neighbour() {
        let all = abc();
        let next = reorder_list(&all, &strings(&["A", "B", "C"]), "A", Some("B"), DropPosition::After)
            .expect("order changes");
        assert_eq!(ids(&next), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_drop_on_empty_space_moves_to_end() {
        let all = abc();
        let next = reorder_list(&all, &strings(&["A", "B", "C"]), "A", None, DropPosition::After).unwrap();
        assert_eq!(ids(&next), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_list_noops() {
        let all = abc();
        let shown = strings(&["A", "B", "C"]);
        assert!(reorder_list(&all, &shown, "A", Some("A"), DropPosition::After).is_none());
        assert!(reorder_list(&all, &shown, "Z", Some("B"), DropPosition::After).is_none());
        assert!(reorder_list(&all, &shown, "A", Some("Z"), DropPosition::After).is_none());
        // Dropping A before B leaves the order as it was.
        assert!(reorder_list(&all, &shown, "A", Some("B"), DropPosition::Before).is_none());
        assert!(reorder_list(&all, &shown, "C", None, DropPosition::After).is_none());
    }

    #[test]
    fn test_filtered_reorder_keeps_hidden_slots() {
        let all = vec![
            task("h1", Status::Active),
            task("A", Status::Backlog),
            task("h2", Status::Completed),
            task("B", Status::Backlog),
            task("C", Status::Backlog),
            task("h3", Status::Active),
        ];
        let next = reorder_list(&all, &strings(&["A", "B", "C"]), "C", Some("A"), DropPosition::Before)
            .unwrap();
        assert_eq!(ids(&next), vec!["h1", "C", "h2", "A", "B", "h3"]);

        let hidden: Vec<&str> = ids(&next).into_iter().filter(|id| id.starts_with('h')).collect();
        assert_eq!(hidden, vec!["h1", "h2", "h3"]);
    }

    #[test]
    fn test_display_order_can_differ_from_storage_order() {
        // Priority focus can show B before A although A is stored first.
        let all = abc();
        let next = reorder_list(&all, &strings(&["B", "A", "C"]), "C", Some("B"), DropPosition::Before)
            .unwrap();
        assert_eq!(ids(&next), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_board_move_into_populated_column() {
        let all = vec![
            task("b1", Status::Backlog),
            task("a1", Status::Active),
            task("a2", Status::Active),
            task("c1", Status::Completed),
        ];
        let now = Utc::now();

        let next = move_in_board(&all, "b1", Some(Status::Active), None, DropPosition::After, now).unwrap();
        assert_eq!(ids(&next), vec!["a1", "a2", "b1", "c1"]);
        assert_eq!(next[2].status, Status::Active);
        assert!(next[2].activated_at.is_some());

        let next = move_in_board(&all, "b1", Some(Status::Active), None, DropPosition::Before, now).unwrap();
        assert_eq!(ids(&next), vec!["b1", "a1", "a2", "c1"]);
    }

    #[test]
    fn test_board_move_onto_specific_card() {
        let all = vec![
            task("b1", Status::Backlog),
            task("a1", Status::Active),
            task("a2", Status::Active),
        ];
        let now = Utc::now();
        let next = move_in_board(&all, "b1", Some(Status::Active), Some("a2"), DropPosition::Before, now)
            .unwrap();
        assert_eq!(ids(&next), vec!["a1", "b1", "a2"]);

        let next = move_in_board(&all, "a1", None, Some("a2"), DropPosition::After, now).unwrap();
        assert_eq!(ids(&next), vec!["b1", "a2", "a1"]);
        assert_eq!(next[2].status, Status::Active);
    }

    #[test]
    fn test_board_move_into_empty_column_keeps_column_order() {
        let all = vec![
            task("b1", Status::Backlog),
            task("c1", Status::Completed),
            task("b2", Status::Backlog),
            task("c2", Status::Completed),
        ];
        let now = Utc::now();
        let next = move_in_board(&all, "b2", Some(Status::Active), None, DropPosition::After, now).unwrap();
        assert_eq!(ids(&next), vec!["b1", "b2", "c1", "c2"]);
        assert_eq!(next[1].status, Status::Active);

        // Nothing sorts after the completed column: append.
        let all = vec![task("b1", Status::Backlog), task("a1", Status::Active)];
        let next = move_in_board(&all, "b1", Some(Status::Completed), None, DropPosition::After, now).unwrap();
        assert_eq!(ids(&next), vec!["a1", "b1"]);
        assert!(next[1].completed_at.is_some());
        assert!(next[1].completed);
    }

    #[test]
    fn test_board_move_back_to_backlog_clears_timestamps() {
        let all = vec![task("b1", Status::Backlog), task("c1", Status::Completed)];
        let next = move_in_board(&all, "c1", Some(Status::Backlog), Some("b1"), DropPosition::Before, Utc::now())
            .unwrap();
        assert_eq!(ids(&next), vec!["c1", "b1"]);
        assert_eq!(next[0].status, Status::Backlog);
        assert!(next[0].activated_at.is_none());
        assert!(next[0].completed_at.is_none());
    }

    #[test]
    fn test_board_noops() {
        let all = vec![task("b1", Status::Backlog), task("a1", Status::Active)];
        let now = Utc::now();
        assert!(move_in_board(&all, "zz", Some(Status::Active), None, DropPosition::After, now).is_none());
        assert!(move_in_board(&all, "a1", Some(Status::Active), None, DropPosition::After, now).is_none());
        // A stale target falls back to the column default.
        assert!(move_in_board(&all, "a1", None, Some("gone"), DropPosition::Before, now).is_none());
    }
}
