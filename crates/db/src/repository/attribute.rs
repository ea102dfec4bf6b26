//! Task attribute repository
//!
//! Statuses, types, categories, milestones and versions of a project live in
//! one table, told apart by `kind`. Attribute lists are short and are not
//! paginated.

use super::{record_key, to_rfc3339};
use crate::error::{DbError, DbResult};
use crate::listing::is_live;
use crate::models::{AttributeKind, TaskAttribute};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::debug;

pub struct AttributeRepository<'a> {
    client: &'a Surreal<Db>,
}

/// Full replacement of an attribute's editable fields
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUpdate {
    pub name: String,
    pub display_order: i64,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttributeRow {
    id: surrealdb::sql::Thing,
    project_id: String,
    kind: AttributeKind,
    name: String,
    #[serde(default)]
    display_order: i64,
    #[serde(default)]
    color: Option<String>,
    created_at: surrealdb::sql::Datetime,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    deleted_at: Option<surrealdb::sql::Datetime>,
}

impl From<AttributeRow> for TaskAttribute {
    fn from(row: AttributeRow) -> Self {
        TaskAttribute {
            id: record_key(&row.id),
            project_id: row.project_id,
            kind: row.kind,
            name: row.name,
            display_order: row.display_order,
            color: row.color,
            created_at: row.created_at.0,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at.map(|d| d.0),
        }
    }
}

impl<'a> AttributeRepository<'a> {
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// Live attributes of one kind, ordered by display order, name, then id.
    pub async fn list(&self, project_id: &str, kind: AttributeKind) -> DbResult<Vec<TaskAttribute>> {
        debug!("Listing {} attributes of project {}", kind, project_id);
        let mut response = self
            .client
            .query(
                r#"SELECT * FROM task_attribute
                    WHERE project_id = $project_id AND kind = $kind AND is_deleted = false
                    ORDER BY display_order ASC, name ASC, id ASC"#,
            )
            .bind(("project_id", project_id.to_string()))
            .bind(("kind", kind.as_str()))
            .await?;
        let rows: Vec<AttributeRow> = response.take(0)?;
        Ok(rows.into_iter().map(TaskAttribute::from).collect())
    }

    /// Get a live attribute by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<TaskAttribute>> {
        let row: Option<AttributeRow> = self.client.select(("task_attribute", id)).await?;
        Ok(row.map(TaskAttribute::from).filter(is_live))
    }

    /// Create an attribute.
    ///
    /// # Errors
    ///
    /// Returns `DbError::AlreadyExists` if the id is taken.
    pub async fn create(&self, attribute: &TaskAttribute) -> DbResult<()> {
        debug!(
            "Creating {} attribute {} ({})",
            attribute.kind, attribute.id, attribute.name
        );

        let existing: Option<AttributeRow> = self
            .client
            .select(("task_attribute", attribute.id.as_str()))
            .await?;
        if existing.is_some() {
            return Err(DbError::AlreadyExists {
                entity: "Task attribute",
                id: attribute.id.clone(),
            });
        }

        self.client
            .query(
                r#"CREATE type::thing("task_attribute", $id) SET
                    project_id = $project_id,
                    kind = $kind,
                    name = $name,
                    display_order = $display_order,
                    color = $color,
                    created_at = <datetime> $created_at"#,
            )
            .bind(("id", attribute.id.clone()))
            .bind(("project_id", attribute.project_id.clone()))
            .bind(("kind", attribute.kind.as_str()))
            .bind(("name", attribute.name.clone()))
            .bind(("display_order", attribute.display_order))
            .bind(("color", attribute.color.clone()))
            .bind(("created_at", to_rfc3339(&attribute.created_at)))
            .await?
            .check()?;
        Ok(())
    }

    /// Replace an attribute's name, display order and color.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the attribute is missing or deleted.
    pub async fn update(&self, id: &str, update: &AttributeUpdate) -> DbResult<TaskAttribute> {
        debug!("Updating attribute: {}", id);
        let mut response = self
            .client
            .query(
                r#"UPDATE type::thing("task_attribute", $id)
                    SET name = $name, display_order = $display_order, color = $color
                    WHERE is_deleted = false
                    RETURN AFTER"#,
            )
            .bind(("id", id.to_string()))
            .bind(("name", update.name.clone()))
            .bind(("display_order", update.display_order))
            .bind(("color", update.color.clone()))
            .await?;
        let updated: Vec<AttributeRow> = response.take(0)?;
        updated
            .into_iter()
            .next()
            .map(TaskAttribute::from)
            .ok_or_else(|| DbError::not_found("Task attribute", id))
    }

    /// Soft-delete an attribute.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the attribute is missing or already deleted.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!("Deleting attribute: {}", id);
        let mut response = self
            .client
            .query(
                r#"UPDATE type::thing("task_attribute", $id)
                    SET is_deleted = true, deleted_at = time::now()
                    WHERE is_deleted = false
                    RETURN AFTER"#,
            )
            .bind(("id", id.to_string()))
            .await?;
        let deleted: Vec<AttributeRow> = response.take(0)?;
        if deleted.is_empty() {
            return Err(DbError::not_found("Task attribute", id));
        }
        Ok(())
    }
}
