//! Task repository for CRUD operations on tasks
//!
//! Provides a repository pattern implementation for task operations,
//! encapsulating SurrealDB queries and providing a clean API.

use super::{ProjectRepository, fetch_page, record_key, to_rfc3339};
use crate::error::{DbError, DbResult};
use crate::listing::is_live;
use crate::models::Task;
use crate::pagination::{PageRequest, PageResult};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace};

/// Repository for task CRUD operations
///
/// Encapsulates database queries for tasks, providing a clean API
/// that hides the underlying SurrealDB implementation details.
pub struct TaskRepository<'a> {
    client: &'a Surreal<Db>,
}

/// Update structure for partial task updates
///
/// Optional fields use `Some(None)` to clear the stored value.
#[derive(Debug, Default, Clone)]
pub struct TaskUpdate {
    /// New title (if Some)
    pub title: Option<String>,
    /// New description
    pub description: Option<Option<String>>,
    /// New status attribute id
    pub status_id: Option<Option<String>>,
    /// New assignee user id
    pub assignee_id: Option<Option<String>>,
}

impl TaskUpdate {
    /// Create a new empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a new title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Some(description.into()));
        self
    }

    pub fn clear_description(mut self) -> Self {
        self.description = Some(None);
        self
    }

    pub fn with_status(mut self, status_id: impl Into<String>) -> Self {
        self.status_id = Some(Some(status_id.into()));
        self
    }

    pub fn clear_status(mut self) -> Self {
        self.status_id = Some(None);
        self
    }

    pub fn with_assignee(mut self, assignee_id: impl Into<String>) -> Self {
        self.assignee_id = Some(Some(assignee_id.into()));
        self
    }

    /// Unassign the task
    pub fn clear_assignee(mut self) -> Self {
        self.assignee_id = Some(None);
        self
    }

    /// Check if any updates are specified
    pub fn has_updates(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.status_id.is_some()
            || self.assignee_id.is_some()
    }

    fn set_clauses(&self) -> Vec<&'static str> {
        let mut clauses = Vec::new();
        if self.title.is_some() {
            clauses.push("title = $title");
        }
        for (value, set, clear) in [
            (&self.description, "description = $description", "description = NONE"),
            (&self.status_id, "status_id = $status_id", "status_id = NONE"),
            (&self.assignee_id, "assignee_id = $assignee_id", "assignee_id = NONE"),
        ] {
            match value {
                Some(Some(_)) => clauses.push(set),
                Some(None) => clauses.push(clear),
                None => {}
            }
        }
        clauses
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskRow {
    id: surrealdb::sql::Thing,
    project_id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status_id: Option<String>,
    #[serde(default)]
    assignee_id: Option<String>,
    #[serde(default)]
    revision: u64,
    created_at: surrealdb::sql::Datetime,
    #[serde(default)]
    updated_at: Option<surrealdb::sql::Datetime>,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    deleted_at: Option<surrealdb::sql::Datetime>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: record_key(&row.id),
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            status_id: row.status_id,
            assignee_id: row.assignee_id,
            revision: row.revision,
            created_at: row.created_at.0,
            updated_at: row.updated_at.map(|d| d.0),
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at.map(|d| d.0),
        }
    }
}

impl<'a> TaskRepository<'a> {
    /// Create a new TaskRepository with the given database client
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// List the live tasks of a project.
    ///
    /// Keyword matches the task id, title or description; sort keys are
    /// `created` (default), `title` and `updated`.
    pub async fn list(&self, project_id: &str, request: &PageRequest) -> DbResult<PageResult<Task>> {
        fetch_page::<Task, TaskRow>(self.client, project_id, request).await
    }

    /// Get a task by ID.
    ///
    /// # Returns
    ///
    /// `Some(Task)` if found and not deleted, `None` otherwise.
    pub async fn get(&self, id: &str) -> DbResult<Option<Task>> {
        debug!("Fetching task: {}", id);
        let row: Option<TaskRow> = self.client.select(("task", id)).await?;
        let task = row.map(Task::from).filter(is_live);
        if task.is_none() {
            debug!("Task not found: {}", id);
        }
        Ok(task)
    }

    /// Check if a live task with the given ID exists.
    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Create a new task.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the project is missing or deleted, and
    /// `DbError::AlreadyExists` if the task id is taken.
    pub async fn create(&self, task: &Task) -> DbResult<()> {
        debug!("Creating task: {} with title: {}", task.id, task.title);
        trace!("Task data: {:?}", task);

        if !ProjectRepository::new(self.client)
            .exists(&task.project_id)
            .await?
        {
            return Err(DbError::not_found("Project", task.project_id.as_str()));
        }

        let existing: Option<TaskRow> = self.client.select(("task", task.id.as_str())).await?;
        if existing.is_some() {
            return Err(DbError::AlreadyExists {
                entity: "Task",
                id: task.id.clone(),
            });
        }

        self.client
            .query(
                r#"CREATE type::thing("task", $id) SET
                    project_id = $project_id,
                    title = $title,
                    description = $description,
                    status_id = $status_id,
                    assignee_id = $assignee_id,
                    created_at = <datetime> $created_at"#,
            )
            .bind(("id", task.id.clone()))
            .bind(("project_id", task.project_id.clone()))
            .bind(("title", task.title.clone()))
            .bind(("description", task.description.clone()))
            .bind(("status_id", task.status_id.clone()))
            .bind(("assignee_id", task.assignee_id.clone()))
            .bind(("created_at", to_rfc3339(&task.created_at)))
            .await?
            .check()?;
        Ok(())
    }

    /// Update a task if the stored revision still matches.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task is missing or deleted, and
    /// `DbError::Conflict` if its revision is no longer `expected_revision`.
    pub async fn update(
        &self,
        id: &str,
        expected_revision: u64,
        updates: &TaskUpdate,
    ) -> DbResult<Task> {
        debug!("Updating task: {} at revision {}", id, expected_revision);
        trace!("Updates: {:?}", updates);

        if !updates.has_updates() {
            debug!("No updates specified for task: {}", id);
            let task = self
                .get(id)
                .await?
                .ok_or_else(|| DbError::not_found("Task", id))?;
            if task.revision != expected_revision {
                return Err(conflict(id, expected_revision));
            }
            return Ok(task);
        }

        let mut clauses = updates.set_clauses();
        clauses.push("revision += 1");
        clauses.push("updated_at = time::now()");
        let query = format!(
            r#"UPDATE type::thing("task", $id) SET {}
                WHERE revision = $expected AND is_deleted = false
                RETURN AFTER"#,
            clauses.join(", ")
        );
        trace!("Query: {}", query);

        let mut response = self
            .client
            .query(&query)
            .bind(("id", id.to_string()))
            .bind(("expected", expected_revision))
            .bind(("title", updates.title.clone().unwrap_or_default()))
            .bind(("description", updates.description.clone().flatten()))
            .bind(("status_id", updates.status_id.clone().flatten()))
            .bind(("assignee_id", updates.assignee_id.clone().flatten()))
            .await?;
        let updated: Vec<TaskRow> = response.take(0)?;

        match updated.into_iter().next() {
            Some(row) => {
                debug!("Updated task: {}", id);
                Ok(row.into())
            }
            None => match self.get(id).await? {
                None => Err(DbError::not_found("Task", id)),
                Some(_) => Err(conflict(id, expected_revision)),
            },
        }
    }

    /// Soft-delete a task.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the task is missing or already deleted.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!("Deleting task: {}", id);
        let mut response = self
            .client
            .query(
                r#"UPDATE type::thing("task", $id)
                    SET is_deleted = true, deleted_at = time::now()
                    WHERE is_deleted = false
                    RETURN AFTER"#,
            )
            .bind(("id", id.to_string()))
            .await?;
        let deleted: Vec<TaskRow> = response.take(0)?;
        if deleted.is_empty() {
            return Err(DbError::not_found("Task", id));
        }
        Ok(())
    }
}

fn conflict(id: &str, expected: u64) -> DbError {
    DbError::Conflict {
        entity: "Task",
        id: id.to_string(),
        expected,
    }
}
