//! Command implementations for the CLI interface.
//!
//! Each subcommand resolves its task or category arguments against the
//! session, calls one store operation and prints a one-line outcome. Listing
//! commands render the derived views as plain tables.

use clap::{Subcommand, ValueEnum};
use clap_complete::{generate, Shell};

use chrono::Local;

use crate::category::{delete_category_cascading, Category};
use crate::db::*;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::session::Session;
use crate::task::{Task, TaskDraft};
use crate::theme;
use crate::tui::run::run_tui;
use crate::views;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive list/board interface (default).
    Ui,

    /// Add a new task to the top of the backlog.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Priority: high | medium | low.
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "in Nw" or a weekday.
        #[arg(long)]
        due: Option<String>,
        /// Category label or id. May be repeated; unknown labels are created.
        #[arg(long = "category", short = 'c')]
        categories: Vec<String>,
    },

    /// List tasks in one status.
    List {
        /// Status to show. Defaults to `default_filter` from config.toml.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Bring tasks of this priority to the top. Unknown values are ignored.
        #[arg(long)]
        focus: Option<String>,
    },

    /// Show all three columns.
    Board {
        #[arg(long)]
        focus: Option<String>,
    },

    /// View a single task by id, id prefix or title.
    View { task: String },

    /// Mark a task active.
    Start { task: String },

    /// Mark a task completed.
    Done { task: String },

    /// Send a task back to the backlog.
    Backlog { task: String },

    /// Set a task's priority (high | medium | low).
    Priority { task: String, value: String },

    /// Advance a task's priority: high -> medium -> low -> high.
    Cycle { task: String },

    /// Attach a category to a task.
    Tag { task: String, category: String },

    /// Detach a category from a task.
    Untag { task: String, category: String },

    /// Demote an active task to the backlog, or delete any other task.
    Dismiss { task: String },

    /// Delete a task permanently.
    Rm { task: String },

    /// Reorder a task within the list view.
    Move {
        task: String,
        /// Place before this task.
        #[arg(long, conflicts_with = "after")]
        before: Option<String>,
        /// Place after this task. Without --before/--after the task goes to the end.
        #[arg(long)]
        after: Option<String>,
        /// List to reorder in. Defaults to the task's own status.
        #[arg(long, value_enum)]
        status: Option<Status>,
        /// Priority focus the list is shown with.
        #[arg(long)]
        focus: Option<String>,
    },

    /// Move a task on the board, possibly into another column.
    Shift {
        task: String,
        /// Target column: backlog | active | completed (or done).
        #[arg(value_enum)]
        status: Status,
        #[arg(long, conflicts_with = "after")]
        before: Option<String>,
        #[arg(long)]
        after: Option<String>,
    },

    /// Move every completed task into the archive.
    Archive,

    /// Inspect the archive.
    Archived {
        #[command(subcommand)]
        action: Option<ArchivedAction>,
    },

    /// Manage categories.
    Categories {
        #[command(subcommand)]
        action: Option<CategoryAction>,
    },

    /// Show or set the theme preference.
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },

    /// Show due dates with their task counts and priorities.
    Calendar,

    /// Show task counts per status.
    Stats,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ArchivedAction {
    /// List archived tasks, newest first.
    List,
    /// Delete an archived task permanently.
    Rm { task: String },
    /// Move an archived task back to the active list.
    Restore { task: String },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    List,
    /// Add a custom category.
    Add { label: String },
    /// Delete a category and remove it from every task.
    Rm { category: String },
}

#[derive(Subcommand)]
pub enum ThemeAction {
    Show,
    Set {
        #[arg(value_enum)]
        mode: ThemeMode,
    },
}

/// Dispatch a parsed subcommand against an open session.
pub fn run(session: &mut Session, command: Commands) -> Result<()> {
    match command {
        Commands::Ui => cmd_ui(session),
        Commands::Add { title, desc, priority, due, categories } =>
            cmd_add(session, title, desc, priority, due, categories),
        Commands::List { status, focus } => {
            let status = status.unwrap_or(session.config.default_filter);
            cmd_list(session, status, focus.as_deref().and_then(views::parse_focus));
            Ok(())
        }
        Commands::Board { focus } => {
            cmd_board(session, focus.as_deref().and_then(views::parse_focus));
            Ok(())
        }
        Commands::View { task } => cmd_view(session, &task),
        Commands::Start { task } => cmd_set_status(session, &task, Status::Active),
        Commands::Done { task } => cmd_set_status(session, &task, Status::Completed),
        Commands::Backlog { task } => cmd_set_status(session, &task, Status::Backlog),
        Commands::Priority { task, value } => cmd_priority(session, &task, &value),
        Commands::Cycle { task } => cmd_cycle(session, &task),
        Commands::Tag { task, category } => cmd_tag(session, &task, &category),
        Commands::Untag { task, category } => cmd_untag(session, &task, &category),
        Commands::Dismiss { task } => cmd_dismiss(session, &task),
        Commands::Rm { task } => cmd_rm(session, &task),
        Commands::Move { task, before, after, status, focus } =>
            cmd_move(session, &task, before, after, status, focus.as_deref().and_then(views::parse_focus)),
        Commands::Shift { task, status, before, after } =>
            cmd_shift(session, &task, status, before, after),
        Commands::Archive => {
            cmd_archive(session);
            Ok(())
        }
        Commands::Archived { action } => cmd_archived(session, action.unwrap_or(ArchivedAction::List)),
        Commands::Categories { action } => cmd_categories(session, action.unwrap_or(CategoryAction::List)),
        Commands::Theme { action } => {
            cmd_theme(session, action.unwrap_or(ThemeAction::Show));
            Ok(())
        }
        Commands::Calendar => {
            cmd_calendar(session);
            Ok(())
        }
        Commands::Stats => {
            cmd_stats(session);
            Ok(())
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

pub fn cmd_ui(session: &mut Session) -> Result<()> {
    run_tui(session)?;
    Ok(())
}

pub fn cmd_add(
    session: &mut Session,
    title: String,
    desc: Option<String>,
    priority: Priority,
    due: Option<String>,
    categories: Vec<String>,
) -> Result<()> {
    let today = Local::now().date_naive();
    let due_date = match due.as_deref() {
        Some(raw) => Some(
            parse_due_input(raw, today)
                .ok_or_else(|| Error::InvalidArgument(format!("could not read due date '{raw}'")))?,
        ),
        None => None,
    };

    let mut draft = TaskDraft {
        title,
        description: desc.unwrap_or_default(),
        priority,
        due_date,
        categories: Vec::new(),
    };
    // Unknown labels become categories only once the task itself is acceptable.
    session.tasks.validate(&draft)?;

    for label in split_labels(&categories) {
        let category = match session.categories.resolve(&label) {
            Ok(c) => c.clone(),
            Err(_) => session
                .categories
                .add(&label)
                .ok_or_else(|| Error::InvalidArgument(format!("invalid category '{label}'")))?,
        };
        draft.categories.push(category.id);
    }

    let id = session.tasks.create(draft)?;
    println!("Added {}", short_id(&id));
    Ok(())
}

/// Split comma-separated category arguments, dropping blanks.
fn split_labels(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|s| s.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn cmd_list(session: &Session, status: Status, focus: Option<Priority>) {
    let tasks = views::list_view(session.tasks.todos(), status, focus);
    if tasks.is_empty() {
        println!("No {} tasks.", status);
        return;
    }
    print_table(&tasks, session.categories.all());
}

pub fn cmd_board(session: &Session, focus: Option<Priority>) {
    for column in views::build_board_columns(session.tasks.todos(), focus) {
        println!("== {} ({}) ==", column.label, column.tasks.len());
        for t in &column.tasks {
            println!("  {:<8} {:<6} {}", short_id(&t.id), t.priority, t.title);
        }
        println!();
    }
}

pub fn cmd_view(session: &Session, query: &str) -> Result<()> {
    let id = resolve_task_identifier(query, session.tasks.todos())?;
    let task = session.tasks.get(&id).ok_or_else(|| Error::TaskNotFound(id.clone()))?;
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", task.status);
    println!("Priority:     {}", task.priority);
    println!("Due:          {}", match task.due_date {
        Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
        None => "-".into(),
    });
    println!("Categories:   {}", category_labels(task, session.categories.all()).unwrap_or_else(|| "-".into()));
    println!("Created:      {}", format_timestamp(Some(task.created_at)));
    println!("Activated:    {}", format_timestamp(task.activated_at));
    println!("Completed:    {}", format_timestamp(task.completed_at));
    println!("Description:\n{}", if task.description.is_empty() { "-" } else { task.description.as_str() });
    Ok(())
}

pub fn cmd_set_status(session: &mut Session, query: &str, status: Status) -> Result<()> {
    let id = resolve_task_identifier(query, session.tasks.todos())?;
    if session.tasks.set_status(&id, status) {
        println!("{} is now {}", short_id(&id), status);
    } else {
        println!("{} is already {}", short_id(&id), status);
    }
    Ok(())
}

pub fn cmd_priority(session: &mut Session, query: &str, value: &str) -> Result<()> {
    let id = resolve_task_identifier(query, session.tasks.todos())?;
    if Priority::parse(value).is_none() {
        let valid: Vec<String> = Priority::value_variants()
            .iter()
            .filter_map(|p| p.to_possible_value().map(|v| v.get_name().to_string()))
            .collect();
        println!("Ignoring unknown priority '{}' (expected {})", value, valid.join(" | "));
        return Ok(());
    }
    session.tasks.set_priority_value(&id, value);
    let current = session.tasks.get(&id).map(|t| t.priority).unwrap_or_default();
    println!("{} priority: {}", short_id(&id), current);
    Ok(())
}

pub fn cmd_cycle(session: &mut Session, query: &str) -> Result<()> {
    let id = resolve_task_identifier(query, session.tasks.todos())?;
    if let Some(next) = session.tasks.cycle_priority(&id) {
        println!("{} priority: {}", short_id(&id), next);
    }
    Ok(())
}

pub fn cmd_tag(session: &mut Session, query: &str, category: &str) -> Result<()> {
    let id = resolve_task_identifier(query, session.tasks.todos())?;
    let category = session.categories.resolve(category)?;
    if session.tasks.assign_category(&id, category) {
        println!("Tagged {} with {}", short_id(&id), category.label);
    } else {
        println!("{} already has {}", short_id(&id), category.label);
    }
    Ok(())
}

pub fn cmd_untag(session: &mut Session, query: &str, category: &str) -> Result<()> {
    let id = resolve_task_identifier(query, session.tasks.todos())?;
    // A deleted category can still be stripped by its raw id.
    let category_id = session
        .categories
        .resolve(category)
        .map(|c| c.id.clone())
        .unwrap_or_else(|_| category.trim().to_string());
    if session.tasks.unassign_category_from_task(&id, &category_id) {
        println!("Removed {} from {}", category, short_id(&id));
    } else {
        println!("{} does not have {}", short_id(&id), category);
    }
    Ok(())
}

pub fn cmd_dismiss(session: &mut Session, query: &str) -> Result<()> {
    let id = resolve_task_identifier(query, session.tasks.todos())?;
    match session.tasks.dismiss(&id) {
        Some(Dismissal::Demoted) => println!("Moved {} back to the backlog", short_id(&id)),
        Some(Dismissal::Removed) => println!("Deleted {}", short_id(&id)),
        None => return Err(Error::TaskNotFound(query.to_string())),
    }
    Ok(())
}

pub fn cmd_rm(session: &mut Session, query: &str) -> Result<()> {
    let id = resolve_task_identifier(query, session.tasks.todos())?;
    let task = session.tasks.remove(&id).ok_or_else(|| Error::TaskNotFound(query.to_string()))?;
    println!("Deleted {} ({})", short_id(&task.id), task.title);
    Ok(())
}

/// Turn `--before`/`--after` into a drop target and position.
fn drop_target(
    before: Option<String>,
    after: Option<String>,
    tasks: &[Task],
) -> Result<(Option<String>, DropPosition)> {
    match (before, after) {
        (Some(q), _) => Ok((Some(resolve_task_identifier(&q, tasks)?), DropPosition::Before)),
        (None, Some(q)) => Ok((Some(resolve_task_identifier(&q, tasks)?), DropPosition::After)),
        (None, None) => Ok((None, DropPosition::After)),
    }
}

pub fn cmd_move(
    session: &mut Session,
    query: &str,
    before: Option<String>,
    after: Option<String>,
    status: Option<Status>,
    focus: Option<Priority>,
) -> Result<()> {
    let todos = session.tasks.todos();
    let id = resolve_task_identifier(query, todos)?;
    let (target, position) = drop_target(before, after, todos)?;
    let status = match status {
        Some(s) => s,
        None => session.tasks.get(&id).map(|t| t.status).unwrap_or(session.config.default_filter),
    };
    let displayed: Vec<String> = views::list_view(todos, status, focus).iter().map(|t| t.id.clone()).collect();

    if session.tasks.reorder_list(&displayed, &id, target.as_deref(), position) {
        println!("Moved {}", short_id(&id));
        cmd_list(session, status, focus);
    } else {
        println!("Nothing to move.");
    }
    Ok(())
}

pub fn cmd_shift(
    session: &mut Session,
    query: &str,
    status: Status,
    before: Option<String>,
    after: Option<String>,
) -> Result<()> {
    let todos = session.tasks.todos();
    let id = resolve_task_identifier(query, todos)?;
    let (target, position) = drop_target(before, after, todos)?;
    if target.as_deref() == Some(id.as_str()) {
        println!("Nothing to move.");
        return Ok(());
    }
    if session.tasks.move_in_board(&id, Some(status), target.as_deref(), position) {
        println!("Moved {} to {}", short_id(&id), status.column_label());
    } else {
        println!("Nothing to move.");
    }
    Ok(())
}

pub fn cmd_archive(session: &mut Session) {
    match session.tasks.archive_completed() {
        0 => println!("No completed tasks to archive."),
        n => println!("Archived {} task(s).", n),
    }
}

pub fn cmd_archived(session: &mut Session, action: ArchivedAction) -> Result<()> {
    match action {
        ArchivedAction::List => {
            let sorted = views::sort_archived_by_recency(session.tasks.archived());
            if sorted.is_empty() {
                println!("Archive is empty.");
                return Ok(());
            }
            println!("{:<8} {:<16} {:<6} {}", "ID", "Archived", "Pri", "Title");
            for t in sorted {
                println!(
                    "{:<8} {:<16} {:<6} {}",
                    short_id(&t.id),
                    format_timestamp(t.archived_at),
                    t.priority,
                    t.title
                );
            }
        }
        ArchivedAction::Rm { task } => {
            let id = resolve_task_identifier(&task, session.tasks.archived())?;
            if let Some(t) = session.tasks.remove_archived(&id) {
                println!("Deleted archived {} ({})", short_id(&t.id), t.title);
            }
        }
        ArchivedAction::Restore { task } => {
            let id = resolve_task_identifier(&task, session.tasks.archived())?;
            if let Some(t) = session.tasks.restore_archived(&id) {
                println!("Restored {} ({})", short_id(&t.id), t.title);
            }
        }
    }
    Ok(())
}

pub fn cmd_categories(session: &mut Session, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::List => {
            println!("{:<18} {:<12} {:<8} {}", "ID", "Label", "Color", "Kind");
            for c in session.categories.all() {
                let kind = if c.is_default { "default" } else { "custom" };
                println!("{:<18} {:<12} {:<8} {}", truncate(&c.id, 18), c.label, c.color, kind);
            }
        }
        CategoryAction::Add { label } => {
            let category = session
                .categories
                .add(&label)
                .ok_or_else(|| Error::InvalidArgument("category label is empty".into()))?;
            println!("Category {} ({})", category.label, category.color);
        }
        CategoryAction::Rm { category } => {
            let id = session.categories.resolve(&category)?.id.clone();
            if let Some((removed, touched)) =
                delete_category_cascading(&mut session.categories, &mut session.tasks, &id)
            {
                println!("Deleted category {} (removed from {} task(s))", removed.label, touched);
            }
        }
    }
    Ok(())
}

pub fn cmd_theme(session: &mut Session, action: ThemeAction) {
    match action {
        ThemeAction::Show => {
            let mode = session.theme();
            let resolved = theme::resolve(mode, theme::system_prefers_dark());
            println!("{} (resolved: {:?})", mode.as_str(), resolved);
        }
        ThemeAction::Set { mode } => {
            session.set_theme(mode);
            println!("Theme set to {}", mode.as_str());
        }
    }
}

pub fn cmd_calendar(session: &Session) {
    let highlights = views::due_date_highlights(session.tasks.todos());
    if highlights.is_empty() {
        println!("No due dates.");
        return;
    }
    let today = Local::now().date_naive();
    for (day, entry) in highlights {
        let priorities: Vec<&str> = entry.priorities.iter().map(|p| p.as_str()).collect();
        println!(
            "{}  {:<10} {} task(s)  [{}]",
            day,
            format_due_relative(Some(day), today),
            entry.count,
            priorities.join(",")
        );
    }
}

pub fn cmd_stats(session: &Session) {
    let s = views::stats(session.tasks.todos());
    println!("Total:      {}", s.total);
    println!("Backlog:    {}", s.backlog);
    println!("Active:     {}", s.active);
    println!("Completed:  {}", s.completed);
    println!("Remaining:  {}", s.remaining);
    println!("Archived:   {}", session.tasks.archived().len());
}

pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Comma-joined labels of a task's categories. Dangling ids are skipped.
pub fn category_labels(task: &Task, categories: &[Category]) -> Option<String> {
    let labels: Vec<&str> = task
        .categories
        .iter()
        .filter_map(|id| categories.iter().find(|c| &c.id == id))
        .map(|c| c.label.as_str())
        .collect();
    if labels.is_empty() {
        None
    } else {
        Some(labels.join(","))
    }
}

pub fn print_table(tasks: &[&Task], categories: &[Category]) {
    println!("{:<8} {:<10} {:<6} {:<10} {}", "ID", "Status", "Pri", "Due", "Title [categories]");
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = category_labels(t, categories)
            .map(|labels| format!(" [{labels}]"))
            .unwrap_or_default();
        println!(
            "{:<8} {:<10} {:<6} {:<10} {}{}",
            short_id(&t.id),
            t.status,
            t.priority,
            format_due_relative(t.due_date, today),
            truncate(&t.title, 60),
            tags
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComposeError;

    #[test]
    fn test_split_labels() {
        let raw = vec!["work, errands".to_string(), " ".to_string(), "gym".to_string()];
        assert_eq!(split_labels(&raw), vec!["work", "errands", "gym"]);
    }

    #[test]
    fn test_rejected_add_leaves_categories_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::open(dir.path());
        let before = session.categories.all().len();

        let result = cmd_add(&mut session, "   ".into(), None, Priority::Medium, None, vec!["garden".into()]);
        assert!(matches!(result, Err(Error::Compose(ComposeError::EmptyTitle))));
        assert_eq!(session.categories.all().len(), before);
        assert!(session.tasks.todos().is_empty());

        let reopened = Session::open(dir.path());
        assert!(reopened.categories.resolve("garden").is_err());
    }

    #[test]
    fn test_rejected_add_without_required_due_date() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(crate::config::CONFIG_FILE), "require_due_date = true\n").unwrap();
        let mut session = Session::open(dir.path());

        let result = cmd_add(&mut session, "Plant".into(), None, Priority::Low, None, vec!["garden".into()]);
        assert!(matches!(result, Err(Error::Compose(ComposeError::MissingDueDate))));
        assert!(session.categories.resolve("garden").is_err());

        cmd_add(&mut session, "Plant".into(), None, Priority::Low, Some("tomorrow".into()), vec!["garden".into()])
            .unwrap();
        let garden = session.categories.resolve("garden").unwrap().id.clone();
        assert_eq!(session.tasks.todos()[0].categories, vec![garden]);
    }

    #[test]
    fn test_category_labels_skip_dangling() {
        let cats = Category::default_set();
        let mut task = Task::from_draft(TaskDraft { title: "t".into(), ..Default::default() }, chrono::Utc::now());
        assert_eq!(category_labels(&task, &cats), None);
        task.categories = vec!["category-work".into(), "gone".into(), "category-learning".into()];
        assert_eq!(category_labels(&task, &cats).as_deref(), Some("work,learning"));
    }
}
