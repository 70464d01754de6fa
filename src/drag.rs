//! Transient drag gesture state.
//!
//! These machines only track what the user is holding and where it hovers. A
//! drop hands back the parameters for the reorder engine and resets the state;
//! nothing here touches tasks.

use crate::fields::{DropPosition, Status};

/// Parameters of a finished list-mode drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDrop {
    pub source: String,
    /// `None` means the empty area after the last item.
    pub target: Option<String>,
    pub position: DropPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDrag {
    dragging: Option<String>,
    over: Option<String>,
    position: DropPosition,
}

impl ListDrag {
    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn over(&self) -> Option<&str> {
        self.over.as_deref()
    }

    pub fn position(&self) -> DropPosition {
        self.position
    }

    pub fn is_active(&self) -> bool {
        self.dragging.is_some()
    }

    /// Drop marker for `id`, if it is the current hover target.
    pub fn marker_for(&self, id: &str) -> Option<DropPosition> {
        match (&self.dragging, &self.over) {
            (Some(dragging), Some(over)) if over == id && dragging != id => Some(self.position),
            _ => None,
        }
    }

    pub fn start(&mut self, id: &str) {
        self.dragging = Some(id.to_string());
        self.over = Some(id.to_string());
        self.position = DropPosition::Before;
    }

    /// Hover over an item. Ignored while idle and over the dragged item itself.
    pub fn hover(&mut self, target: &str, position: DropPosition) {
        match &self.dragging {
            Some(dragging) if dragging != target => {
                self.over = Some(target.to_string());
                self.position = position;
            }
            _ => {}
        }
    }

    /// Hover over the empty container area.
    pub fn hover_container(&mut self) {
        if self.dragging.is_some() {
            self.over = None;
            self.position = DropPosition::After;
        }
    }

    pub fn drop(&mut self) -> Option<ListDrop> {
        let state = std::mem::take(self);
        let source = state.dragging?;
        Some(ListDrop { source, target: state.over, position: state.position })
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    /// The view stopped allowing drags (filter or mode change).
    pub fn disable(&mut self) {
        self.cancel();
    }
}

/// Parameters of a finished board-mode drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardDrop {
    pub source: String,
    pub column: Status,
    pub target: Option<String>,
    pub position: DropPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardDrag {
    dragging: Option<String>,
    over_column: Option<Status>,
    over_task: Option<String>,
    position: DropPosition,
}

impl BoardDrag {
    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn over_column(&self) -> Option<Status> {
        self.over_column
    }

    pub fn over_task(&self) -> Option<&str> {
        self.over_task.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn marker_for(&self, id: &str, column: Status) -> Option<DropPosition> {
        match (&self.dragging, &self.over_task) {
            (Some(dragging), Some(over))
                if over == id && dragging != id && self.over_column == Some(column) =>
            {
                Some(self.position)
            }
            _ => None,
        }
    }

    /// True when the column itself, not a card in it, is the drop target.
    pub fn column_targeted(&self, column: Status) -> bool {
        self.is_active()
            && self.over_column == Some(column)
            && (self.over_task.is_none() || self.over_task == self.dragging)
    }

    pub fn start(&mut self, id: &str, column: Status) {
        self.dragging = Some(id.to_string());
        self.over_column = Some(column);
        self.over_task = Some(id.to_string());
        self.position = DropPosition::Before;
    }

    pub fn hover_task(&mut self, target: &str, column: Status, position: DropPosition) {
        match &self.dragging {
            Some(dragging) if dragging != target => {
                self.over_column = Some(column);
                self.over_task = Some(target.to_string());
                self.position = position;
            }
            _ => {}
        }
    }

    pub fn hover_column(&mut self, column: Status) {
        if self.dragging.is_some() {
            self.over_column = Some(column);
            self.over_task = None;
            self.position = DropPosition::After;
        }
    }

    /// Finish the gesture. Dropping a card onto itself yields nothing.
    pub fn drop(&mut self) -> Option<BoardDrop> {
        let state = std::mem::take(self);
        let source = state.dragging?;
        if state.over_task.as_deref() == Some(source.as_str()) {
            return None;
        }
        let column = state.over_column?;
        Some(BoardDrop { source, column, target: state.over_task, position: state.position })
    }

    pub fn cancel(&mut self) {
        *self = Self::default();
    }

    pub fn disable(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_drag_lifecycle() {
        let mut drag = ListDrag::default();
        drag.hover("b", DropPosition::After);
        assert_eq!(drag, ListDrag::default());

        drag.start("a");
        assert_eq!(drag.over(), Some("a"));
        assert_eq!(drag.position(), DropPosition::Before);
        assert_eq!(drag.marker_for("a"), None);

        drag.hover("a", DropPosition::After);
        assert_eq!(drag.over(), Some("a"));

        drag.hover("b", DropPosition::After);
        assert_eq!(drag.marker_for("b"), Some(DropPosition::After));

        let dropped = drag.drop().unwrap();
        assert_eq!(
            dropped,
            ListDrop { source: "a".into(), target: Some("b".into()), position: DropPosition::After }
        );
        assert!(!drag.is_active());
        assert!(drag.drop().is_none());
    }

    #[test]
    fn test_list_container_hover() {
        let mut drag = ListDrag::default();
        drag.start("a");
        drag.hover_container();
        let dropped = drag.drop().unwrap();
        assert_eq!(dropped.target, None);
        assert_eq!(dropped.position, DropPosition::After);
    }

    #[test]
    fn test_list_disable_resets() {
        let mut drag = ListDrag::default();
        drag.start("a");
        drag.hover("b", DropPosition::Before);
        drag.disable();
        assert_eq!(drag, ListDrag::default());
        assert!(drag.drop().is_none());
    }

    #[test]
    fn test_board_drag_lifecycle() {
        let mut drag = BoardDrag::default();
        drag.start("a", Status::Backlog);
        assert!(drag.column_targeted(Status::Backlog));

        drag.hover_task("x", Status::Active, DropPosition::Before);
        assert_eq!(drag.marker_for("x", Status::Active), Some(DropPosition::Before));
        assert_eq!(drag.marker_for("x", Status::Backlog), None);
        assert!(!drag.column_targeted(Status::Active));

        drag.hover_column(Status::Completed);
        assert!(drag.column_targeted(Status::Completed));

        let dropped = drag.drop().unwrap();
        assert_eq!(
            dropped,
            BoardDrop {
                source: "a".into(),
                column: Status::Completed,
                target: None,
                position: DropPosition::After,
            }
        );
        assert!(!drag.is_active());
    }

    #[test]
    fn test_board_drop_on_self_is_ignored() {
        let mut drag = BoardDrag::default();
        drag.start("a", Status::Active);
        drag.hover_task("a", Status::Active, DropPosition::After);
        assert_eq!(drag.over_task(), Some("a"));
        assert!(drag.drop().is_none());
        assert!(!drag.is_active());
    }

    #[test]
    fn test_board_cancel() {
        let mut drag = BoardDrag::default();
        drag.hover_column(Status::Active);
        assert_eq!(drag.over_column(), None);
        drag.start("a", Status::Active);
        drag.cancel();
        assert_eq!(drag, BoardDrag::default());
    }
}
