//! Database module for Backlog
//!
//! Provides SurrealDB connection management with an embedded SurrealKV
//! backend, schema initialization, data models, repositories, and the
//! paginated query pipeline shared by every list operation.

pub mod error;
pub mod listing;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod schema;

pub use error::{DbError, DbResult};
pub use listing::{Listable, MemberSort, ProjectSort, SortKey, StoredListable, TaskSort};
pub use models::{
    AttributeKind, Deletable, MembershipType, Organization, Project, ProjectMember,
    ProjectMemberView, Task, TaskAttribute, UserProfile,
};
pub use pagination::{
    DEFAULT_PAGE_SIZE, PageRequest, PageResult, paginate, paginate_projected, total_pages,
};
pub use repository::{
    AttributeRepository, AttributeUpdate, MemberRepository, OrganizationRepository,
    ProjectRepository, ProjectUpdate, TaskRepository, TaskUpdate, UserRepository,
};

use std::path::{Path, PathBuf};
use std::process::Command;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, SurrealKv};

/// Default database path relative to project root or current working directory
pub const DEFAULT_DB_PATH: &str = ".backlog/data";

/// Database wrapper providing connection management for SurrealDB
pub struct Database {
    /// The underlying SurrealDB client
    client: Surreal<Db>,
    /// Path where the database is stored
    path: PathBuf,
}

impl Database {
    /// Connect to a SurrealDB database at the specified path.
    ///
    /// Creates the database directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DbError::CreateDirectory` if directory creation fails.
    /// Returns `DbError::Connection` if database connection fails.
    pub async fn connect(path: &Path) -> DbResult<Self> {
        let path = Self::prepare_path(path)?;

        let client =
            Surreal::new::<SurrealKv>(path.clone())
                .await
                .map_err(|e| DbError::Connection {
                    path: path.clone(),
                    source: Box::new(e),
                })?;

        Ok(Self { client, path })
    }

    /// Initialize the database schema.
    ///
    /// Selects the Backlog namespace and database, then defines every table.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Schema` if schema initialization fails.
    pub async fn init(&self) -> DbResult<()> {
        self.client
            .use_ns("backlog")
            .use_db("main")
            .await
            .map_err(|e| DbError::Schema(Box::new(e)))?;

        schema::init_schema(&self.client).await?;

        Ok(())
    }

    /// Get a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Db> {
        &self.client
    }

    /// Get the path where the database is stored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn organizations(&self) -> OrganizationRepository<'_> {
        OrganizationRepository::new(&self.client)
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.client)
    }

    pub fn projects(&self) -> ProjectRepository<'_> {
        ProjectRepository::new(&self.client)
    }

    pub fn members(&self) -> MemberRepository<'_> {
        MemberRepository::new(&self.client)
    }

    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository::new(&self.client)
    }

    pub fn attributes(&self) -> AttributeRepository<'_> {
        AttributeRepository::new(&self.client)
    }

    /// Get the default database path.
    ///
    /// Uses `git rev-parse --show-toplevel` to find the project root and
    /// returns `<project_root>/.backlog/data`. Outside a git repository it
    /// falls back to the user's local data directory, and finally to
    /// `.backlog/data` relative to the current working directory.
    pub fn default_path() -> PathBuf {
        if let Some(root) = find_project_root() {
            return root.join(DEFAULT_DB_PATH);
        }
        match dirs::data_local_dir() {
            Some(data_dir) => data_dir.join("backlog").join("data"),
            None => PathBuf::from(DEFAULT_DB_PATH),
        }
    }

    /// Prepare the database path by creating missing directories.
    fn prepare_path(path: &Path) -> DbResult<PathBuf> {
        let path = path.to_path_buf();

        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|e| DbError::CreateDirectory {
                path: path.clone(),
                source: e,
            })?;
        }

        Ok(path)
    }
}

// Ensure Database is Send + Sync for async compatibility
static_assertions::assert_impl_all!(Database: Send, Sync);

/// Find the project root by running `git rev-parse --show-toplevel`.
///
/// Returns `None` if not in a git repository or the command fails.
pub fn find_project_root() -> Option<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;

    if output.status.success() {
        let path_str = String::from_utf8(output.stdout).ok()?;
        Some(PathBuf::from(path_str.trim()))
    } else {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_path_ends_with_data_dir() {
        let path = Database::default_path();
        assert!(
            path.ends_with(".backlog/data") || path.ends_with("backlog/data"),
            "Path should end with backlog data dir, got: {:?}",
            path
        );
    }

    #[test]
    fn test_default_db_path_constant() {
        assert_eq!(DEFAULT_DB_PATH, ".backlog/data");
    }

    #[tokio::test]
    async fn test_connect_and_init() {
        let temp_dir = env::temp_dir().join(format!("backlog-test-{}", std::process::id()));

        let db = Database::connect(&temp_dir).await;
        assert!(db.is_ok(), "Failed to connect: {:?}", db.err());
        let db = db.unwrap();

        assert_eq!(db.path(), temp_dir);

        let init_result = db.init().await;
        assert!(
            init_result.is_ok(),
            "Failed to init: {:?}",
            init_result.err()
        );

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn test_prepare_path_creates_directories() {
        let temp_dir =
            env::temp_dir().join(format!("backlog-test-prepare-{}/sub/dir", std::process::id()));

        let _ = std::fs::remove_dir_all(temp_dir.parent().unwrap().parent().unwrap());

        let result = Database::prepare_path(&temp_dir);
        assert!(result.is_ok());
        assert!(temp_dir.exists());

        let _ = std::fs::remove_dir_all(temp_dir.parent().unwrap().parent().unwrap());
    }

    #[test]
    fn test_prepare_path_existing_directory() {
        let temp_dir = env::temp_dir();
        let result = Database::prepare_path(&temp_dir);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), temp_dir);
    }
}
