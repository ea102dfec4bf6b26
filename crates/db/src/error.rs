use std::path::PathBuf;
use thiserror::Error;

/// Database error types for Backlog
#[derive(Error, Debug)]
pub enum DbError {
    /// Error establishing connection to the database
    #[error("Failed to connect to database at {path}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: Box<surrealdb::Error>,
    },

    /// Error during schema initialization
    #[error("Failed to initialize database schema: {0}")]
    Schema(#[source] Box<surrealdb::Error>),

    /// The storage engine rejected or failed a read/write
    #[error("Storage unavailable")]
    StorageUnavailable(#[source] Box<surrealdb::Error>),

    /// Error creating database directory
    #[error("Failed to create database directory at {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Paging parameters (or other call arguments) are out of range
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A requested record does not exist or is soft-deleted
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// A record with the same identifier already exists
    #[error("{entity} '{id}' already exists")]
    AlreadyExists { entity: &'static str, id: String },

    /// The record changed since the caller read it
    #[error("{entity} '{id}' was modified concurrently (expected revision {expected})")]
    Conflict {
        entity: &'static str,
        id: String,
        expected: u64,
    },

    /// Error for invalid input or validation failure
    #[error("{message}")]
    ValidationError { message: String },
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        DbError::StorageUnavailable(Box::new(err))
    }
}

impl DbError {
    /// Shorthand for an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DbError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Get the full error message including nested SurrealDB error details.
    ///
    /// This is useful for displaying detailed error information to users.
    pub fn full_message(&self) -> String {
        match self {
            DbError::StorageUnavailable(err) => format!("Storage unavailable: {}", err),
            other => other.to_string(),
        }
    }
}

/// Result type alias for database operations
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_directory_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = DbError::CreateDirectory {
            path: PathBuf::from("/root/backlog"),
            source: io_err,
        };
        assert_eq!(
            err.to_string(),
            "Failed to create database directory at /root/backlog: access denied"
        );
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = DbError::invalid_argument("page size must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid argument: page size must be at least 1"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = DbError::not_found("Project", "abc123");
        assert_eq!(err.to_string(), "Project 'abc123' not found");
    }

    #[test]
    fn test_already_exists_display() {
        let err = DbError::AlreadyExists {
            entity: "Task",
            id: "t1".to_string(),
        };
        assert_eq!(err.to_string(), "Task 't1' already exists");
    }

    #[test]
    fn test_conflict_display() {
        let err = DbError::Conflict {
            entity: "Project",
            id: "p1".to_string(),
            expected: 3,
        };
        assert_eq!(
            err.to_string(),
            "Project 'p1' was modified concurrently (expected revision 3)"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = DbError::ValidationError {
            message: "Project name cannot be empty".to_string(),
        };
        assert_eq!(err.to_string(), "Project name cannot be empty");
    }

    #[test]
    fn test_full_message_passes_through_non_storage_errors() {
        let err = DbError::not_found("User", "u1");
        assert_eq!(err.full_message(), "User 'u1' not found");
    }

    #[test]
    fn test_not_found_debug() {
        let err = DbError::not_found("Task", "xyz789");
        let debug_str = format!("{:?}", err);
        assert!(
            debug_str.contains("NotFound") && debug_str.contains("xyz789"),
            "Debug output should contain NotFound and id"
        );
    }
}
