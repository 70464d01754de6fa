//! # deck - todo list and kanban board for the terminal
//!
//! Tasks move through `backlog`, `active` and `completed`, carry a priority,
//! an optional due date and category tags, and can be reordered by hand in a
//! filtered list or across the columns of a board. Completed work is swept into
//! an archive.
//!
//! ## Quick Start
//!
//! ```bash
//! # Open the interactive view
//! deck
//!
//! # Add a task
//! deck add "Write release notes" --priority high --due friday -c work
//!
//! # Reorder, then start it
//! deck move "write release notes" --before 3f2a
//! deck start "write release notes"
//!
//! # Sweep completed tasks into the archive
//! deck archive
//! ```
//!
//! Data is stored in `~/.deck/` as one JSON file per record (`todos.json`,
//! `categories.json`, `theme.json`) next to an optional `config.toml`.
//! Set `RUST_LOG=deck=debug` to trace store operations on stderr.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod category;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod drag;
pub mod error;
pub mod fields;
pub mod migrate;
pub mod reorder;
pub mod session;
pub mod storage;
pub mod task;
pub mod theme;
pub mod views;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod input;
    pub mod run;
    pub mod view;
}

use cli::Cli;
use cmd::Commands;
use session::Session;

fn main() {
    // Logging is opt-in via RUST_LOG and goes to stderr, away from the TUI.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        cmd::cmd_completions(*shell);
        return;
    }

    let dir = config::data_dir(cli.dir.as_deref());
    let mut session = Session::open(&dir);
    let command = cli.command.unwrap_or(Commands::Ui);

    if let Err(err) = cmd::run(&mut session, command) {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
