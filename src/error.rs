//! Error types for the CLI.

use backlog_db::DbError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Error type for CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Repository or pipeline failure.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Failed to render `--json` output.
    #[error("Failed to encode JSON output: {0}")]
    Json(#[from] serde_json::Error),

    /// A command argument was rejected before touching the database.
    #[error("{0}")]
    InvalidInput(String),

    /// Id generation gave up after repeated collisions.
    #[error("Failed to generate a unique {0} after maximum retries")]
    IdExhausted(&'static str),
}

impl CliError {
    /// Full message including nested storage error details.
    pub fn full_message(&self) -> String {
        match self {
            CliError::Database(err) => err.full_message(),
            other => other.to_string(),
        }
    }
}
