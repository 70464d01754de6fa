//! Error types for deck.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Operation failed (I/O, serialization)
//! - 2: User error (unknown or ambiguous task, bad input)

use thiserror::Error;

/// Exit codes for the deck CLI.
pub mod exit_codes {
    pub const OPERATION_FAILED: i32 = 1;
    pub const USER_ERROR: i32 = 2;
}

/// Reasons the composer refuses a new task. These are reported inline and
/// never interrupt the interaction loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("a task needs a title.")]
    EmptyTitle,

    #[error("pick a due date before adding the task.")]
    MissingDueDate,
}

/// Main error type for deck operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No task found matching '{0}'")]
    TaskNotFound(String),

    #[error("Multiple tasks match '{query}': {candidates}. Use the id instead.")]
    AmbiguousTask { query: String, candidates: String },

    #[error("No category found matching '{0}'")]
    CategoryNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TaskNotFound(_)
            | Error::AmbiguousTask { .. }
            | Error::CategoryNotFound(_)
            | Error::InvalidArgument(_)
            | Error::Compose(_) => exit_codes::USER_ERROR,
            Error::Io(_) | Error::Json(_) | Error::TomlParse(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for deck operations.
pub type Result<T> = std::result::Result<T, Error>;
