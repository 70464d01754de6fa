//! Drawing for the list view, the board and the popups.

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::category::Category;
use crate::db::{format_due_relative, format_timestamp, short_id, truncate};
use crate::fields::*;
use crate::task::Task;
use crate::tui::app::{App, ComposerField, Mode};
use crate::tui::colors::{hex_color, priority_color, Palette};
use crate::views;

const CARD_HEIGHT: usize = 4;

pub fn render(f: &mut Frame, app: &mut App) {
    let palette = Palette::for_theme(app.resolved_theme());
    f.render_widget(Block::default().style(Style::default().bg(palette.bg).fg(palette.fg)), f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    render_header(f, chunks[0], app, &palette);
    match app.view {
        ViewMode::List => render_list(f, chunks[1], app, &palette),
        ViewMode::Board => render_board(f, chunks[1], app, &palette),
    }
    render_status_bar(f, chunks[2], app, &palette);

    match app.mode {
        Mode::Compose => render_composer(f, app, &palette),
        Mode::Archive => render_archive(f, app, &palette),
        Mode::Detail => render_detail(f, app, &palette),
        Mode::Help => render_help(f, &palette),
        Mode::Browse => {}
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let view = match app.view {
        ViewMode::List => format!("list: {}", app.filter),
        ViewMode::Board => "board".to_string(),
    };
    let focus = app.focus.map(|p| format!("  focus: {p}")).unwrap_or_default();
    let line = Line::from(vec![
        Span::styled("DECK", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            format!("{view}{focus}  theme: {}", app.theme.as_str()),
            Style::default().fg(palette.accent).add_modifier(Modifier::ITALIC),
        ),
    ]);
    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(palette.muted)))
        .alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn priority_badge(priority: Priority) -> Span<'static> {
    Span::styled(
        format!("[{:<6}]", priority.as_str()),
        Style::default().fg(priority_color(priority)).add_modifier(Modifier::BOLD),
    )
}

fn category_spans(task: &Task, categories: &[Category]) -> Vec<Span<'static>> {
    task.categories
        .iter()
        .filter_map(|id| categories.iter().find(|c| &c.id == id))
        .map(|c| Span::styled(format!(" #{}", c.label), Style::default().fg(hex_color(&c.color))))
        .collect()
}

fn marker_span(marker: Option<DropPosition>) -> Span<'static> {
    match marker {
        Some(DropPosition::Before) => Span::raw("▲ "),
        Some(DropPosition::After) => Span::raw("▼ "),
        None => Span::raw("  "),
    }
}

fn render_list(f: &mut Frame, area: Rect, app: &mut App, palette: &Palette) {
    let today = Local::now().date_naive();
    let categories = app.session.categories.all();
    let tasks = app.list_tasks();
    let dragging = app.list_drag.dragging();

    let mut items: Vec<ListItem> = tasks
        .iter()
        .map(|t| {
            let grabbed = dragging == Some(t.id.as_str());
            let mut spans = vec![
                if grabbed { Span::raw("» ") } else { marker_span(app.list_drag.marker_for(&t.id)) },
                priority_badge(t.priority),
                Span::raw(" "),
                Span::styled(
                    t.title.clone(),
                    if grabbed {
                        Style::default().add_modifier(Modifier::ITALIC)
                    } else {
                        Style::default()
                    },
                ),
            ];
            if t.due_date.is_some() {
                spans.push(Span::styled(
                    format!("  due {}", format_due_relative(t.due_date, today)),
                    Style::default().fg(palette.muted),
                ));
            }
            spans.extend(category_spans(t, categories));
            ListItem::new(Line::from(spans))
        })
        .collect();

    if app.list_drag.is_active() && app.list_drag.over().is_none() {
        items.push(ListItem::new(Line::from(Span::styled(
            "▼ drop at end",
            Style::default().fg(palette.accent),
        ))));
    }

    let title = format!(" {} ({}) ", app.filter, tasks.len());
    let empty = tasks.is_empty();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(palette.accent)),
        )
        .highlight_style(Style::default().bg(palette.accent).fg(palette.selected_fg));

    let mut state = ListState::default();
    if !empty {
        let selected = if app.list_drag.is_active() { app.hover } else { app.list_cursor };
        state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_board(f: &mut Frame, area: Rect, app: &mut App, palette: &Palette) {
    let columns_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(area);

    for (i, &column_area) in columns_layout.iter().enumerate() {
        render_column(f, column_area, app, i, palette);
    }
}

fn render_column(f: &mut Frame, area: Rect, app: &mut App, column_index: usize, palette: &Palette) {
    let status = Status::ALL[column_index];
    let is_selected = column_index == app.board_column;
    let targeted = app.board_drag.column_targeted(status) && app.hover_column == column_index;

    let ids: Vec<String> = views::build_board_columns(app.session.tasks.todos(), app.focus)
        .get(column_index)
        .map(|c| c.tasks.iter().map(|t| t.id.clone()).collect())
        .unwrap_or_default();

    let border_style = if targeted {
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else if is_selected {
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.muted)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ({}) ", status.column_label(), ids.len()))
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if ids.is_empty() {
        app.column_scroll[column_index] = 0;
        return;
    }

    let focus_index = if app.board_drag.is_active() && app.hover_column == column_index {
        Some(app.hover.min(ids.len() - 1))
    } else if is_selected {
        Some(app.board_card)
    } else {
        None
    };

    let available_height = inner.height as usize;
    let visible_cards = (available_height / CARD_HEIGHT).max(1);
    // The column may have shrunk since it was last scrolled.
    let mut offset = app.column_scroll[column_index].min(ids.len() - 1);
    if let Some(i) = focus_index {
        if i < offset {
            offset = i;
        } else if i >= offset + visible_cards {
            offset = i + 1 - visible_cards;
        }
    }
    app.column_scroll[column_index] = offset;

    let mut current_y = 0;
    let mut rendered = 0;
    for (card_index, id) in ids.iter().enumerate().skip(offset) {
        if current_y + CARD_HEIGHT > available_height {
            break;
        }
        let Some(task) = app.session.tasks.get(id) else {
            continue;
        };
        let card_area = Rect {
            x: inner.x,
            y: inner.y + current_y as u16,
            width: inner.width,
            height: CARD_HEIGHT as u16,
        };
        let selected = is_selected && !app.board_drag.is_active() && card_index == app.board_card;
        render_card(f, card_area, app, task, status, selected, palette);
        current_y += CARD_HEIGHT;
        rendered += 1;
    }

    let remaining = ids.len().saturating_sub(offset + rendered);
    if remaining > 0 && inner.height > 0 {
        let indicator = Paragraph::new(format!("▼ +{} below", remaining)).style(Style::default().fg(palette.accent));
        f.render_widget(indicator, Rect { x: inner.x, y: inner.y + inner.height - 1, width: inner.width, height: 1 });
    }
}

fn render_card(
    f: &mut Frame,
    area: Rect,
    app: &App,
    task: &Task,
    column: Status,
    selected: bool,
    palette: &Palette,
) {
    let grabbed = app.board_drag.dragging() == Some(task.id.as_str());
    let style = if selected || grabbed {
        Style::default().bg(palette.accent).fg(palette.selected_fg).add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(palette.card)
    };

    let today = Local::now().date_naive();
    let width = area.width.saturating_sub(4) as usize;
    let mut first = vec![marker_span(app.board_drag.marker_for(&task.id, column)), priority_badge(task.priority)];
    first.push(Span::raw(format!(" {}", short_id(&task.id))));
    let mut second = vec![Span::raw(truncate(&task.title, width.max(1)))];
    if grabbed {
        second.insert(0, Span::raw("» "));
    }
    let mut third = Vec::new();
    if task.due_date.is_some() {
        third.push(Span::raw(format!("due {}", format_due_relative(task.due_date, today))));
    }
    third.extend(category_spans(task, app.session.categories.all()));

    let card = Paragraph::new(vec![Line::from(first), Line::from(second), Line::from(third)])
        .block(Block::default().borders(Borders::LEFT | Borders::BOTTOM))
        .style(style);
    f.render_widget(card, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let text = if !app.status_message.is_empty() {
        app.status_message.clone()
    } else {
        let s = views::stats(app.session.tasks.todos());
        format!(
            "{} total | {} backlog | {} active | {} done | {} remaining | n: new  space: move  ?: help",
            s.total, s.backlog, s.active, s.completed, s.remaining
        )
    };
    let bar = Paragraph::new(text).style(Style::default().bg(palette.accent).fg(palette.selected_fg));
    f.render_widget(bar, area);
}

/// Centered popup covering the given share of the screen.
fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect::new(area.x + (area.width - width) / 2, area.y + (area.height - height) / 2, width, height)
}

fn popup_block(title: &str, palette: &Palette) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .title_alignment(Alignment::Center)
        .border_style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(palette.bg).fg(palette.fg))
}

fn render_composer(f: &mut Frame, app: &App, palette: &Palette) {
    let area = popup_area(f.area(), 70, 50);
    f.render_widget(Clear, area);

    let c = &app.composer;
    let field_line = |label: &str, field: ComposerField, value: String| {
        let active = c.field == field;
        let style = if active {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![Span::styled(format!("{:<12}", label), style), Span::raw(value)])
    };
    let with_cursor = |input: &crate::tui::input::InputField, field: ComposerField| {
        if c.field != field {
            return input.value.clone();
        }
        let mut s: String = input.value.chars().take(input.cursor()).collect();
        s.push('│');
        s.extend(input.value.chars().skip(input.cursor()));
        s
    };

    let mut lines = vec![
        field_line("Title", ComposerField::Title, with_cursor(&c.title, ComposerField::Title)),
        field_line("Description", ComposerField::Description, with_cursor(&c.description, ComposerField::Description)),
        field_line("Due", ComposerField::Due, with_cursor(&c.due, ComposerField::Due)),
        field_line("Categories", ComposerField::Categories, with_cursor(&c.categories, ComposerField::Categories)),
        field_line("Priority", ComposerField::Priority, format!("< {} >", c.priority)),
        Line::from(""),
    ];
    let labels: Vec<&str> = app.session.categories.all().iter().map(|c| c.label.as_str()).collect();
    lines.push(Line::from(Span::styled(
        format!("categories: {}", labels.join(", ")),
        Style::default().fg(palette.muted),
    )));
    if app.session.config.require_due_date {
        lines.push(Line::from(Span::styled("a due date is required", Style::default().fg(palette.muted))));
    }
    if let Some(error) = &c.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(priority_color(Priority::High)))));
    }

    let form = Paragraph::new(lines)
        .block(popup_block(" New task (tab: next field, enter: add, esc: cancel) ", palette))
        .wrap(Wrap { trim: false });
    f.render_widget(form, area);
}

fn render_archive(f: &mut Frame, app: &App, palette: &Palette) {
    let area = popup_area(f.area(), 80, 70);
    f.render_widget(Clear, area);

    let tasks = app.archive_tasks();
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|t| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<17}", format_timestamp(t.archived_at)), Style::default().fg(palette.muted)),
                priority_badge(t.priority),
                Span::raw(format!(" {}", t.title)),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(popup_block(
            &format!(" Archive ({}) r: restore  x: delete  esc: close ", tasks.len()),
            palette,
        ))
        .highlight_style(Style::default().bg(palette.accent).fg(palette.selected_fg));
    let mut state = ListState::default();
    if !tasks.is_empty() {
        state.select(Some(app.archive_cursor));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_detail(f: &mut Frame, app: &App, palette: &Palette) {
    let Some(id) = app.selected_id() else {
        return;
    };
    let Some(task) = app.session.tasks.get(&id) else {
        return;
    };
    let area = popup_area(f.area(), 80, 80);
    f.render_widget(Clear, area);

    let today = Local::now().date_naive();
    let labels: Vec<String> = category_spans(task, app.session.categories.all())
        .into_iter()
        .map(|s| s.content.trim().to_string())
        .collect();
    let lines = vec![
        Line::from(Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(format!("ID:           {}", task.id)),
        Line::from(format!("Status:       {}", task.status)),
        Line::from(vec![Span::raw("Priority:     "), priority_badge(task.priority)]),
        Line::from(format!(
            "Due:          {}",
            task.due_date
                .map(|d| format!("{d} ({})", format_due_relative(Some(d), today)))
                .unwrap_or_else(|| "-".into())
        )),
        Line::from(format!("Categories:   {}", if labels.is_empty() { "-".into() } else { labels.join(" ") })),
        Line::from(format!("Created:      {}", format_timestamp(Some(task.created_at)))),
        Line::from(format!("Activated:    {}", format_timestamp(task.activated_at))),
        Line::from(format!("Completed:    {}", format_timestamp(task.completed_at))),
        Line::from(""),
        Line::from("Description:"),
        Line::from(if task.description.is_empty() { "-".to_string() } else { task.description.clone() }),
    ];
    let detail = Paragraph::new(lines)
        .block(popup_block(" Task details (any key to close) ", palette))
        .wrap(Wrap { trim: true });
    f.render_widget(detail, area);
}

fn render_help(f: &mut Frame, palette: &Palette) {
    let area = popup_area(f.area(), 60, 70);
    f.render_widget(Clear, area);
    let rows = [
        ("j/k, arrows", "move the cursor"),
        ("tab, v", "switch list / board"),
        ("1 2 3", "show backlog / active / completed"),
        ("H M L", "toggle priority focus"),
        ("space", "grab, then aim with arrows and drop with space"),
        ("s d b", "mark active / completed / backlog"),
        ("p", "cycle priority"),
        ("x", "dismiss (active goes back to backlog)"),
        ("del", "delete"),
        ("a", "archive completed tasks"),
        ("A", "open the archive"),
        ("n", "new task"),
        ("t", "cycle theme"),
        ("enter", "details"),
        ("q, esc", "quit"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(k, v)| Line::from(vec![Span::styled(format!("{:<14}", k), Style::default().fg(palette.accent)), Span::raw(*v)]))
        .collect();
    f.render_widget(Paragraph::new(lines).block(popup_block(" Keys ", palette)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::task::TaskDraft;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal.backend().buffer().content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_board_column_shrinks_below_its_scroll() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(dir.path());
        let mut ids = Vec::new();
        for i in 0..8 {
            let id = session
                .tasks
                .create(TaskDraft { title: format!("task {i}"), ..Default::default() })
                .unwrap();
            session.tasks.set_status(&id, Status::Completed);
            ids.push(id);
        }

        let mut app = App::new(&mut session);
        app.view = ViewMode::Board;
        app.board_column = 2;
        app.board_card = 7;
        let mut terminal = Terminal::new(TestBackend::new(120, 16)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert_eq!(app.column_scroll[2], 6);

        app.board_column = 0;
        app.board_card = 0;
        for id in &ids[..7] {
            app.session.tasks.set_status(id, Status::Backlog);
        }
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert_eq!(app.column_scroll[2], 0);
        let text = screen(&terminal);
        assert!(text.contains(" done (1) "));
        assert!(text.contains("+5 below"));
        assert_eq!(text.matches("below").count(), 1);
    }
}
