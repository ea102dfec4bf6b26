//! User profile repository
//!
//! A minimal stand-in for the identity store. Member listings use
//! [`UserRepository::get_many`] to resolve profiles in one round-trip.

use super::{record_key, to_rfc3339};
use crate::error::{DbError, DbResult};
use crate::listing::is_live;
use crate::models::UserProfile;
use serde::Deserialize;
use std::collections::HashMap;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace};

pub struct UserRepository<'a> {
    client: &'a Surreal<Db>,
}

#[derive(Debug, Deserialize)]
struct UserRow {
    id: surrealdb::sql::Thing,
    display_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    is_suspended: bool,
    created_at: surrealdb::sql::Datetime,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    deleted_at: Option<surrealdb::sql::Datetime>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: record_key(&row.id),
            display_name: row.display_name,
            email: row.email,
            is_suspended: row.is_suspended,
            created_at: row.created_at.0,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at.map(|d| d.0),
        }
    }
}

impl<'a> UserRepository<'a> {
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// Create a user profile with the given id.
    ///
    /// # Errors
    ///
    /// Returns `DbError::AlreadyExists` if the id is taken.
    pub async fn create(&self, id: &str, user: &UserProfile) -> DbResult<()> {
        debug!("Creating user profile: {}", id);

        let existing: Option<UserRow> = self.client.select(("user_profile", id)).await?;
        if existing.is_some() {
            return Err(DbError::AlreadyExists {
                entity: "User",
                id: id.to_string(),
            });
        }

        self.client
            .query(
                r#"CREATE type::thing("user_profile", $id) SET
                    display_name = $display_name,
                    email = $email,
                    is_suspended = $is_suspended,
                    created_at = <datetime> $created_at"#,
            )
            .bind(("id", id.to_string()))
            .bind(("display_name", user.display_name.clone()))
            .bind(("email", user.email.clone()))
            .bind(("is_suspended", user.is_suspended))
            .bind(("created_at", to_rfc3339(&user.created_at)))
            .await?
            .check()?;
        Ok(())
    }

    /// Get a live user profile by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<UserProfile>> {
        let row: Option<UserRow> = self.client.select(("user_profile", id)).await?;
        Ok(row.map(UserProfile::from).filter(is_live))
    }

    /// Fetch the live profiles for a set of ids, keyed by id.
    ///
    /// Unknown and deleted ids are simply absent from the map.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<HashMap<String, UserProfile>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        trace!("Resolving {} user profiles", ids.len());

        let mut response = self
            .client
            .query(
                r#"SELECT * FROM user_profile
                    WHERE record::id(id) IN $ids AND is_deleted = false"#,
            )
            .bind(("ids", ids.to_vec()))
            .await?;
        let rows: Vec<UserRow> = response.take(0)?;

        Ok(rows
            .into_iter()
            .map(UserProfile::from)
            .map(|user| (user.id.clone(), user))
            .collect())
    }

    /// Suspend or reinstate a user.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the user does not exist or is deleted.
    pub async fn set_suspended(&self, id: &str, suspended: bool) -> DbResult<()> {
        debug!("Setting suspended={} for user: {}", suspended, id);
        let mut response = self
            .client
            .query(
                r#"UPDATE type::thing("user_profile", $id)
                    SET is_suspended = $suspended
                    WHERE is_deleted = false
                    RETURN AFTER"#,
            )
            .bind(("id", id.to_string()))
            .bind(("suspended", suspended))
            .await?;
        let updated: Vec<UserRow> = response.take(0)?;
        if updated.is_empty() {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }
}
