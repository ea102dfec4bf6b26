//! Project repository for CRUD operations on projects
//!
//! Listing goes through the store-backed pagination pipeline; updates are
//! checked against the caller's expected revision.

use super::{CountRow, fetch_page, record_key, to_rfc3339};
use crate::error::{DbError, DbResult};
use crate::listing::is_live;
use crate::models::Project;
use crate::pagination::{PageRequest, PageResult};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace};

/// Repository for project operations
pub struct ProjectRepository<'a> {
    client: &'a Surreal<Db>,
}

/// Partial update of a project
#[derive(Debug, Default, Clone)]
pub struct ProjectUpdate {
    /// New name (if Some)
    pub name: Option<String>,
    /// New description; `Some(None)` clears it
    pub description: Option<Option<String>>,
    /// New display order (if Some)
    pub display_order: Option<i64>,
}

impl ProjectUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
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

    pub fn with_display_order(mut self, display_order: i64) -> Self {
        self.display_order = Some(display_order);
        self
    }

    /// Check if any field is set
    pub fn has_updates(&self) -> bool {
        self.name.is_some() || self.description.is_some() || self.display_order.is_some()
    }

    fn set_clauses(&self) -> Vec<&'static str> {
        let mut clauses = Vec::new();
        if self.name.is_some() {
            clauses.push("name = $name");
        }
        match &self.description {
            Some(Some(_)) => clauses.push("description = $description"),
            Some(None) => clauses.push("description = NONE"),
            None => {}
        }
        if self.display_order.is_some() {
            clauses.push("display_order = $display_order");
        }
        clauses
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectRow {
    id: surrealdb::sql::Thing,
    owner_id: String,
    perma_name: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    display_order: i64,
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

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: record_key(&row.id),
            owner_id: row.owner_id,
            perma_name: row.perma_name,
            name: row.name,
            description: row.description,
            display_order: row.display_order,
            revision: row.revision,
            created_at: row.created_at.0,
            updated_at: row.updated_at.map(|d| d.0),
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at.map(|d| d.0),
        }
    }
}

impl<'a> ProjectRepository<'a> {
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// List the live projects of an organization, one page at a time.
    ///
    /// Keyword matches the project id or name; sort keys are `name`
    /// (default), `created` and `display_order`.
    pub async fn list(
        &self,
        organization_id: &str,
        request: &PageRequest,
    ) -> DbResult<PageResult<Project>> {
        fetch_page::<Project, ProjectRow>(self.client, organization_id, request).await
    }

    /// Get a live project by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Project>> {
        debug!("Fetching project: {}", id);
        let row: Option<ProjectRow> = self.client.select(("project", id)).await?;
        Ok(row.map(Project::from).filter(is_live))
    }

    /// Check whether a live project with the given id exists.
    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns `DbError::AlreadyExists` if the id is taken, even by a
    /// deleted project.
    pub async fn create(&self, project: &Project) -> DbResult<()> {
        debug!("Creating project: {} ({})", project.id, project.name);
        trace!("Project data: {:?}", project);

        let existing: Option<ProjectRow> = self.client.select(("project", project.id.as_str())).await?;
        if existing.is_some() {
            return Err(DbError::AlreadyExists {
                entity: "Project",
                id: project.id.clone(),
            });
        }

        self.client
            .query(
                r#"CREATE type::thing("project", $id) SET
                    owner_id = $owner_id,
                    perma_name = $perma_name,
                    name = $name,
                    description = $description,
                    display_order = $display_order,
                    created_at = <datetime> $created_at"#,
            )
            .bind(("id", project.id.clone()))
            .bind(("owner_id", project.owner_id.clone()))
            .bind(("perma_name", project.perma_name.clone()))
            .bind(("name", project.name.clone()))
            .bind(("description", project.description.clone()))
            .bind(("display_order", project.display_order))
            .bind(("created_at", to_rfc3339(&project.created_at)))
            .await?
            .check()?;
        Ok(())
    }

    /// Whether no project of the organization, deleted or not, uses this perma name.
    pub async fn is_perma_name_unique(
        &self,
        organization_id: &str,
        perma_name: &str,
    ) -> DbResult<bool> {
        let mut response = self
            .client
            .query(
                r#"SELECT count() AS total FROM project
                    WHERE owner_id = $owner_id AND perma_name = $perma_name
                    GROUP ALL"#,
            )
            .bind(("owner_id", organization_id.to_string()))
            .bind(("perma_name", perma_name.to_string()))
            .await?;
        let count: Option<CountRow> = response.take(0)?;
        Ok(count.map(|c| c.total).unwrap_or(0) == 0)
    }

    /// Apply a partial update if the stored revision still matches.
    ///
    /// Returns the updated project. An update with no fields set only
    /// performs the checks.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the project is missing or deleted, and
    /// `DbError::Conflict` if its revision is no longer `expected_revision`.
    pub async fn update(
        &self,
        id: &str,
        expected_revision: u64,
        updates: &ProjectUpdate,
    ) -> DbResult<Project> {
        debug!("Updating project: {} at revision {}", id, expected_revision);
        trace!("Updates: {:?}", updates);

        if !updates.has_updates() {
            let project = self
                .get(id)
                .await?
                .ok_or_else(|| DbError::not_found("Project", id))?;
            if project.revision != expected_revision {
                return Err(conflict(id, expected_revision));
            }
            return Ok(project);
        }

        let mut clauses = updates.set_clauses();
        clauses.push("revision += 1");
        clauses.push("updated_at = time::now()");
        let query = format!(
            r#"UPDATE type::thing("project", $id) SET {}
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
            .bind(("name", updates.name.clone().unwrap_or_default()))
            .bind(("description", updates.description.clone().flatten()))
            .bind(("display_order", updates.display_order.unwrap_or_default()))
            .await?;
        let updated: Vec<ProjectRow> = response.take(0)?;

        match updated.into_iter().next() {
            Some(row) => Ok(row.into()),
            None => match self.get(id).await? {
                None => Err(DbError::not_found("Project", id)),
                Some(_) => Err(conflict(id, expected_revision)),
            },
        }
    }

    /// Soft-delete a project.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the project is missing or already deleted.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!("Deleting project: {}", id);
        let mut response = self
            .client
            .query(
                r#"UPDATE type::thing("project", $id)
                    SET is_deleted = true, deleted_at = time::now()
                    WHERE is_deleted = false
                    RETURN AFTER"#,
            )
            .bind(("id", id.to_string()))
            .await?;
        let deleted: Vec<ProjectRow> = response.take(0)?;
        if deleted.is_empty() {
            return Err(DbError::not_found("Project", id));
        }
        Ok(())
    }
}

fn conflict(id: &str, expected: u64) -> DbError {
    DbError::Conflict {
        entity: "Project",
        id: id.to_string(),
        expected,
    }
}
