use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Todo list and kanban board for the terminal.
/// Data lives in ~/.deck unless --dir points elsewhere.
#[derive(Parser)]
#[command(name = "deck", version, about = "Todo list and kanban board for the terminal")]
pub struct Cli {
    /// Data directory holding todos, categories, theme and config.toml.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
