//! Enumerations and field types for tasks and views.
//!
//! This module defines the small closed sets the rest of the crate works with:
//! lifecycle status, priority, drop position, theme mode and view mode.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Backlog,
    Active,
    #[value(alias = "done")]
    Completed,
}

impl Status {
    /// Fixed board column order.
    pub const ALL: [Status; 3] = [Status::Backlog, Status::Active, Status::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::Active => "active",
            Status::Completed => "completed",
        }
    }

    /// Column heading used by the board view.
    pub fn column_label(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::Active => "active",
            Status::Completed => "done",
        }
    }

    /// Position of this status in the fixed column order.
    pub fn column_index(self) -> usize {
        match self {
            Status::Backlog => 0,
            Status::Active => 1,
            Status::Completed => 2,
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s.trim().to_lowercase().as_str() {
            "backlog" => Some(Status::Backlog),
            "active" => Some(Status::Active),
            "completed" | "done" => Some(Status::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority classification, ordered by severity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Severity rank: high sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    /// Next value in the badge cycle: high -> medium -> low -> high.
    pub fn next(self) -> Priority {
        match self {
            Priority::High => Priority::Medium,
            Priority::Medium => Priority::Low,
            Priority::Low => Priority::High,
        }
    }

    /// Parse a priority, returning `None` for anything outside the three values.
    pub fn parse(s: &str) -> Option<Priority> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a dragged item lands relative to its drop target.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum DropPosition {
    #[default]
    Before,
    After,
}

/// Stored theme preference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::System => "system",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<ThemeMode> {
        match s.trim() {
            "system" => Some(ThemeMode::System),
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }
}

/// Interactive view layout.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    List,
    Board,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_cycle() {
        assert_eq!(Priority::High.next(), Priority::Medium);
        assert_eq!(Priority::High.next().next(), Priority::Low);
        assert_eq!(Priority::Low.next(), Priority::High);
    }

    #[test]
    fn test_priority_parse_rejects_unknown() {
        assert_eq!(Priority::parse(" High "), Some(Priority::High));
        assert_eq!(Priority::parse("urgent"), None);
        assert_eq!(Priority::parse(""), None);
    }

    #[test]
    fn test_status_parse_and_labels() {
        assert_eq!(Status::parse("done"), Some(Status::Completed));
        assert_eq!(Status::parse("Active"), Some(Status::Active));
        assert_eq!(Status::parse("archived"), None);
        assert_eq!(Status::Completed.column_label(), "done");
        assert_eq!(Status::Completed.as_str(), "completed");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        let json = serde_json::to_string(&Priority::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
