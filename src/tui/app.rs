//! Interactive list and board application state.
//!
//! Key handling lives here; drawing lives in `tui::view`. A drag is a
//! keyboard gesture: space grabs the selected task, the arrow keys move the
//! drop marker, and space or enter drops it through the reorder engine.

use std::io;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{backend::Backend, Terminal};

use crate::db::{parse_due_input, short_id, Dismissal};
use crate::drag::{BoardDrag, ListDrag};
use crate::fields::*;
use crate::session::Session;
use crate::task::{Task, TaskDraft};
use crate::theme::{self, ResolvedTheme};
use crate::tui::input::InputField;
use crate::tui::view;
use crate::views;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Compose,
    Archive,
    Detail,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerField {
    Title,
    Description,
    Due,
    Categories,
    Priority,
}

impl ComposerField {
    const ORDER: [ComposerField; 5] = [
        ComposerField::Title,
        ComposerField::Description,
        ComposerField::Due,
        ComposerField::Categories,
        ComposerField::Priority,
    ];

    fn step(self, forward: bool) -> Self {
        let i = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let n = Self::ORDER.len();
        let next = if forward { (i + 1) % n } else { (i + n - 1) % n };
        Self::ORDER[next]
    }
}

/// New-task form state.
#[derive(Debug, Clone)]
pub struct Composer {
    pub field: ComposerField,
    pub title: InputField,
    pub description: InputField,
    pub due: InputField,
    pub categories: InputField,
    pub priority: Priority,
    pub error: Option<String>,
}

impl Default for Composer {
    fn default() -> Self {
        Composer {
            field: ComposerField::Title,
            title: InputField::new(),
            description: InputField::new(),
            due: InputField::new(),
            categories: InputField::new(),
            priority: Priority::Medium,
            error: None,
        }
    }
}

impl Composer {
    fn input_mut(&mut self) -> Option<&mut InputField> {
        match self.field {
            ComposerField::Title => Some(&mut self.title),
            ComposerField::Description => Some(&mut self.description),
            ComposerField::Due => Some(&mut self.due),
            ComposerField::Categories => Some(&mut self.categories),
            ComposerField::Priority => None,
        }
    }
}

pub struct App<'a> {
    pub session: &'a mut Session,
    pub view: ViewMode,
    pub filter: Status,
    pub focus: Option<Priority>,
    pub mode: Mode,
    pub list_cursor: usize,
    pub board_column: usize,
    pub board_card: usize,
    pub column_scroll: [usize; 3],
    pub list_drag: ListDrag,
    pub board_drag: BoardDrag,
    /// Drop marker slot while grabbing: an index into the hovered list or column,
    /// where `len` means the empty area after the last item.
    pub hover: usize,
    pub hover_column: usize,
    pub composer: Composer,
    pub archive_cursor: usize,
    pub theme: ThemeMode,
    pub prefers_dark: bool,
    pub status_message: String,
    pub quit: bool,
}

impl<'a> App<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        let view = session.config.default_view;
        let filter = session.config.default_filter;
        let theme = session.theme();
        App {
            session,
            view,
            filter,
            focus: None,
            mode: Mode::Browse,
            list_cursor: 0,
            board_column: 0,
            board_card: 0,
            column_scroll: [0; 3],
            list_drag: ListDrag::default(),
            board_drag: BoardDrag::default(),
            hover: 0,
            hover_column: 0,
            composer: Composer::default(),
            archive_cursor: 0,
            theme,
            prefers_dark: theme::system_prefers_dark(),
            status_message: String::new(),
            quit: false,
        }
    }

    pub fn resolved_theme(&self) -> ResolvedTheme {
        theme::resolve(self.theme, self.prefers_dark)
    }

    /// Tasks shown by the list view, in display order.
    pub fn list_tasks(&self) -> Vec<&Task> {
        views::list_view(self.session.tasks.todos(), self.filter, self.focus)
    }

    fn displayed_ids(&self) -> Vec<String> {
        self.list_tasks().iter().map(|t| t.id.clone()).collect()
    }

    fn column_ids(&self, column: usize) -> Vec<String> {
        views::build_board_columns(self.session.tasks.todos(), self.focus)
            .into_iter()
            .nth(column)
            .map(|c| c.tasks.iter().map(|t| t.id.clone()).collect())
            .unwrap_or_default()
    }

    pub fn selected_id(&self) -> Option<String> {
        match self.view {
            ViewMode::List => self.displayed_ids().get(self.list_cursor).cloned(),
            ViewMode::Board => self.column_ids(self.board_column).get(self.board_card).cloned(),
        }
    }

    fn clamp(&mut self) {
        let list_len = self.displayed_ids().len();
        self.list_cursor = self.list_cursor.min(list_len.saturating_sub(1));
        let column_len = self.column_ids(self.board_column).len();
        self.board_card = self.board_card.min(column_len.saturating_sub(1));
        let archived = self.session.tasks.archived().len();
        self.archive_cursor = self.archive_cursor.min(archived.saturating_sub(1));
    }

    /// Put the cursor on `id` if the current view shows it.
    fn follow(&mut self, id: &str) {
        match self.view {
            ViewMode::List => {
                if let Some(i) = self.displayed_ids().iter().position(|x| x == id) {
                    self.list_cursor = i;
                }
            }
            ViewMode::Board => {
                for column in 0..Status::ALL.len() {
                    if let Some(i) = self.column_ids(column).iter().position(|x| x == id) {
                        self.board_column = column;
                        self.board_card = i;
                    }
                }
            }
        }
        self.clamp();
    }

    fn set_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Drop any gesture in progress. Called on every view, filter or focus change.
    fn disable_drags(&mut self) {
        self.list_drag.disable();
        self.board_drag.disable();
    }

    pub fn is_grabbing(&self) -> bool {
        self.list_drag.is_active() || self.board_drag.is_active()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }
        match self.mode {
            Mode::Compose => self.handle_compose_key(key),
            Mode::Archive => self.handle_archive_key(key),
            Mode::Detail | Mode::Help => self.mode = Mode::Browse,
            Mode::Browse if self.is_grabbing() => self.handle_grab_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) {
        self.status_message.clear();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('?') => self.mode = Mode::Help,
            KeyCode::Tab | KeyCode::Char('v') => {
                self.disable_drags();
                self.view = match self.view {
                    ViewMode::List => ViewMode::Board,
                    ViewMode::Board => ViewMode::List,
                };
                self.clamp();
            }
            KeyCode::Char(c @ '1'..='3') => {
                self.disable_drags();
                let index = c as usize - '1' as usize;
                self.filter = Status::ALL[index];
                self.list_cursor = 0;
                if self.view == ViewMode::Board {
                    self.board_column = index;
                    self.board_card = 0;
                }
                self.clamp();
            }
            KeyCode::Char(c @ ('H' | 'M' | 'L')) => {
                self.disable_drags();
                let chosen = match c {
                    'H' => Priority::High,
                    'M' => Priority::Medium,
                    _ => Priority::Low,
                };
                let selected = self.selected_id();
                self.focus = views::toggle_focus(self.focus, chosen);
                match self.focus {
                    Some(p) => self.set_message(format!("Focus: {p} first")),
                    None => self.set_message("Focus off"),
                }
                if let Some(id) = selected {
                    self.follow(&id);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Left | KeyCode::Char('h') if self.view == ViewMode::Board => self.move_column(-1),
            KeyCode::Right | KeyCode::Char('l') if self.view == ViewMode::Board => self.move_column(1),
            KeyCode::Char(' ') => self.grab(),
            KeyCode::Char('s') => self.change_status(Status::Active),
            KeyCode::Char('d') => self.change_status(Status::Completed),
            KeyCode::Char('b') => self.change_status(Status::Backlog),
            KeyCode::Char('p') => {
                if let Some(id) = self.selected_id() {
                    if let Some(next) = self.session.tasks.cycle_priority(&id) {
                        self.set_message(format!("Priority: {next}"));
                        self.follow(&id);
                    }
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    match self.session.tasks.dismiss(&id) {
                        Some(Dismissal::Demoted) => self.set_message("Moved back to backlog"),
                        Some(Dismissal::Removed) => self.set_message("Task deleted"),
                        None => {}
                    }
                    self.clamp();
                }
            }
            KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    if self.session.tasks.remove(&id).is_some() {
                        self.set_message("Task deleted");
                    }
                    self.clamp();
                }
            }
            KeyCode::Char('a') => {
                let moved = self.session.tasks.archive_completed();
                self.set_message(format!("Archived {moved} task(s)"));
                self.clamp();
            }
            KeyCode::Char('A') => {
                self.archive_cursor = 0;
                self.mode = Mode::Archive;
            }
            KeyCode::Char('n') => {
                self.composer = Composer::default();
                self.mode = Mode::Compose;
            }
            KeyCode::Char('t') => {
                self.theme = match self.theme {
                    ThemeMode::System => ThemeMode::Light,
                    ThemeMode::Light => ThemeMode::Dark,
                    ThemeMode::Dark => ThemeMode::System,
                };
                self.session.set_theme(self.theme);
                self.set_message(format!("Theme: {}", self.theme.as_str()));
            }
            KeyCode::Enter => {
                if self.selected_id().is_some() {
                    self.mode = Mode::Detail;
                }
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let cursor = match self.view {
            ViewMode::List => &mut self.list_cursor,
            ViewMode::Board => &mut self.board_card,
        };
        *cursor = cursor.saturating_add_signed(delta);
        self.clamp();
    }

    fn move_column(&mut self, delta: isize) {
        let last = Status::ALL.len() - 1;
        self.board_column = self.board_column.saturating_add_signed(delta).min(last);
        self.clamp();
    }

    fn change_status(&mut self, status: Status) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if self.session.tasks.set_status(&id, status) {
            self.set_message(format!("{} is now {}", short_id(&id), status));
        }
        self.follow(&id);
    }

    fn grab(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        match self.view {
            ViewMode::List => {
                self.list_drag.start(&id);
                self.hover = self.list_cursor;
            }
            ViewMode::Board => {
                self.board_drag.start(&id, Status::ALL[self.board_column]);
                self.hover_column = self.board_column;
                self.hover = self.board_card;
            }
        }
        self.set_message("Moving: arrows to aim, space to drop, esc to cancel");
    }

    fn handle_grab_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.disable_drags();
                self.set_message("Move cancelled");
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.drop_grabbed(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.hover = self.hover.saturating_sub(1);
                self.aim();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.hover += 1;
                self.aim();
            }
            KeyCode::Left | KeyCode::Char('h') if self.view == ViewMode::Board => {
                self.hover_column = self.hover_column.saturating_sub(1);
                self.hover = usize::MAX;
                self.aim();
            }
            KeyCode::Right | KeyCode::Char('l') if self.view == ViewMode::Board => {
                self.hover_column = (self.hover_column + 1).min(Status::ALL.len() - 1);
                self.hover = usize::MAX;
                self.aim();
            }
            _ => {}
        }
    }

    /// Translate the hover slot into a hover on the drag state.
    fn aim(&mut self) {
        match self.view {
            ViewMode::List => {
                let Some(source) = self.list_drag.dragging().map(str::to_string) else {
                    return;
                };
                let ids = self.displayed_ids();
                self.hover = self.hover.min(ids.len());
                let source_index = ids.iter().position(|id| *id == source);
                if self.hover == ids.len() {
                    self.list_drag.hover_container();
                } else if Some(self.hover) == source_index {
                    self.list_drag.start(&source);
                } else {
                    let position = match source_index {
                        Some(s) if self.hover > s => DropPosition::After,
                        _ => DropPosition::Before,
                    };
                    self.list_drag.hover(&ids[self.hover], position);
                }
            }
            ViewMode::Board => {
                let Some(source) = self.board_drag.dragging().map(str::to_string) else {
                    return;
                };
                let status = Status::ALL[self.hover_column];
                let ids = self.column_ids(self.hover_column);
                self.hover = self.hover.min(ids.len());
                let source_index = ids.iter().position(|id| *id == source);
                if self.hover == ids.len() {
                    self.board_drag.hover_column(status);
                } else if Some(self.hover) == source_index {
                    self.board_drag.start(&source, status);
                } else {
                    let position = match source_index {
                        Some(s) if self.hover > s => DropPosition::After,
                        _ => DropPosition::Before,
                    };
                    self.board_drag.hover_task(&ids[self.hover], status, position);
                }
            }
        }
    }

    fn drop_grabbed(&mut self) {
        match self.view {
            ViewMode::List => {
                let ids = self.displayed_ids();
                let Some(drop) = self.list_drag.drop() else {
                    return;
                };
                let moved = self.session.tasks.reorder_list(&ids, &drop.source, drop.target.as_deref(), drop.position);
                self.set_message(if moved { "Moved" } else { "No change" });
                self.follow(&drop.source);
            }
            ViewMode::Board => {
                let Some(drop) = self.board_drag.drop() else {
                    self.set_message("No change");
                    return;
                };
                let moved = self.session.tasks.move_in_board(
                    &drop.source,
                    Some(drop.column),
                    drop.target.as_deref(),
                    drop.position,
                );
                self.set_message(if moved {
                    format!("Moved to {}", drop.column.column_label())
                } else {
                    "No change".to_string()
                });
                self.follow(&drop.source);
            }
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        let composer = &mut self.composer;
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                return;
            }
            KeyCode::Enter => {
                self.submit_composer();
                return;
            }
            KeyCode::Tab | KeyCode::Down => composer.field = composer.field.step(true),
            KeyCode::BackTab | KeyCode::Up => composer.field = composer.field.step(false),
            _ if composer.field == ComposerField::Priority => match key.code {
                KeyCode::Left => {
                    // Two steps forward is one step back in the three-value cycle.
                    composer.priority = composer.priority.next().next();
                }
                KeyCode::Right | KeyCode::Char(' ') => composer.priority = composer.priority.next(),
                _ => {}
            },
            code => {
                if let Some(input) = composer.input_mut() {
                    match code {
                        KeyCode::Char(c) => input.insert(c),
                        KeyCode::Backspace => input.backspace(),
                        KeyCode::Delete => input.delete(),
                        KeyCode::Left => input.left(),
                        KeyCode::Right => input.right(),
                        _ => {}
                    }
                }
            }
        }
    }

    fn submit_composer(&mut self) {
        let today = Local::now().date_naive();
        let title = self.composer.title.value.trim().to_string();
        let due_raw = self.composer.due.value.trim().to_string();
        let due_date = if due_raw.is_empty() || title.is_empty() {
            None
        } else {
            match parse_due_input(&due_raw, today) {
                Some(d) => Some(d),
                None => {
                    self.composer.error = Some(format!("could not read due date '{due_raw}'."));
                    return;
                }
            }
        };
        let mut draft = TaskDraft {
            title,
            description: self.composer.description.value.clone(),
            priority: self.composer.priority,
            due_date,
            categories: Vec::new(),
        };
        if let Err(e) = self.session.tasks.validate(&draft) {
            self.composer.error = Some(e.to_string());
            return;
        }

        for label in self.composer.categories.value.split(',') {
            if label.trim().is_empty() {
                continue;
            }
            let existing = self.session.categories.resolve(label).ok().cloned();
            if let Some(category) = existing.or_else(|| self.session.categories.add(label)) {
                draft.categories.push(category.id);
            }
        }

        match self.session.tasks.create(draft) {
            Ok(id) => {
                self.mode = Mode::Browse;
                self.composer = Composer::default();
                self.set_message(format!("Added {}", short_id(&id)));
                self.follow(&id);
            }
            Err(e) => self.composer.error = Some(e.to_string()),
        }
    }

    /// Archive entries in display order.
    pub fn archive_tasks(&self) -> Vec<&Task> {
        views::sort_archived_by_recency(self.session.tasks.archived())
    }

    fn handle_archive_key(&mut self, key: KeyEvent) {
        let selected = self.archive_tasks().get(self.archive_cursor).map(|t| t.id.clone());
        match key.code {
            KeyCode::Esc | KeyCode::Char('A') | KeyCode::Char('q') => self.mode = Mode::Browse,
            KeyCode::Up | KeyCode::Char('k') => self.archive_cursor = self.archive_cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.archive_cursor += 1,
            KeyCode::Char('r') => {
                if let Some(id) = selected {
                    if self.session.tasks.restore_archived(&id).is_some() {
                        self.set_message("Restored from archive");
                    }
                }
            }
            KeyCode::Delete | KeyCode::Char('x') => {
                if let Some(id) = selected {
                    if self.session.tasks.remove_archived(&id).is_some() {
                        self.set_message("Archived task deleted");
                    }
                }
            }
            _ => {}
        }
        self.clamp();
    }

    /// Main event loop.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        while !self.quit {
            terminal.draw(|f| view::render(f, self))?;
            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
        }
        Ok(())
    }
}
