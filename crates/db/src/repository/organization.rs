//! Organization repository

use super::{record_key, to_rfc3339};
use crate::error::{DbError, DbResult};
use crate::listing::is_live;
use crate::models::Organization;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::debug;

pub struct OrganizationRepository<'a> {
    client: &'a Surreal<Db>,
}

#[derive(Debug, Deserialize)]
struct OrganizationRow {
    id: surrealdb::sql::Thing,
    name: String,
    created_at: surrealdb::sql::Datetime,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    deleted_at: Option<surrealdb::sql::Datetime>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: record_key(&row.id),
            name: row.name,
            created_at: row.created_at.0,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at.map(|d| d.0),
        }
    }
}

impl<'a> OrganizationRepository<'a> {
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// Create an organization with the given id.
    ///
    /// # Errors
    ///
    /// Returns `DbError::AlreadyExists` if the id is taken.
    pub async fn create(&self, id: &str, organization: &Organization) -> DbResult<()> {
        debug!("Creating organization: {}", id);

        let existing: Option<OrganizationRow> = self.client.select(("organization", id)).await?;
        if existing.is_some() {
            return Err(DbError::AlreadyExists {
                entity: "Organization",
                id: id.to_string(),
            });
        }

        self.client
            .query(
                r#"CREATE type::thing("organization", $id) SET
                    name = $name,
                    created_at = <datetime> $created_at"#,
            )
            .bind(("id", id.to_string()))
            .bind(("name", organization.name.clone()))
            .bind(("created_at", to_rfc3339(&organization.created_at)))
            .await?
            .check()?;
        Ok(())
    }

    /// Get a live organization by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Organization>> {
        let row: Option<OrganizationRow> = self.client.select(("organization", id)).await?;
        Ok(row.map(Organization::from).filter(is_live))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{cleanup, create_test_db};

    #[tokio::test]
    async fn test_create_and_get() {
        let (db, temp_dir) = create_test_db("org-repo").await;
        let repo = db.organizations();

        repo.create("acme", &Organization::new("", "Acme Corp"))
            .await
            .unwrap();

        let org = repo.get("acme").await.unwrap().expect("organization should exist");
        assert_eq!(org.id, "acme");
        assert_eq!(org.name, "Acme Corp");
        assert!(!org.is_deleted);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let (db, temp_dir) = create_test_db("org-repo").await;

        let org = db.organizations().get("nope").await.unwrap();
        assert!(org.is_none());

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_create_duplicate_id_fails() {
        let (db, temp_dir) = create_test_db("org-repo").await;
        let repo = db.organizations();

        repo.create("acme", &Organization::new("acme", "Acme"))
            .await
            .unwrap();
        let err = repo
            .create("acme", &Organization::new("acme", "Acme again"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists { .. }));

        cleanup(&temp_dir);
    }
}
