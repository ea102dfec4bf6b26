//! Project membership repository
//!
//! Provides the raw membership listing (store-backed pipeline) and the
//! joined member view, which resolves user profiles and pages in memory.

use super::{ProjectRepository, UserRepository, fetch_page, record_key, to_rfc3339};
use crate::error::{DbError, DbResult};
use crate::listing::is_live;
use crate::models::{MembershipType, ProjectMember, ProjectMemberView};
use crate::pagination::{PageRequest, PageResult, paginate_projected};
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{debug, trace};

pub struct MemberRepository<'a> {
    client: &'a Surreal<Db>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberRow {
    id: surrealdb::sql::Thing,
    project_id: String,
    user_id: String,
    membership_type: MembershipType,
    #[serde(default)]
    revision: u64,
    created_at: surrealdb::sql::Datetime,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    deleted_at: Option<surrealdb::sql::Datetime>,
}

impl From<MemberRow> for ProjectMember {
    fn from(row: MemberRow) -> Self {
        ProjectMember {
            id: record_key(&row.id),
            project_id: row.project_id,
            user_id: row.user_id,
            membership_type: row.membership_type,
            revision: row.revision,
            created_at: row.created_at.0,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at.map(|d| d.0),
        }
    }
}

impl<'a> MemberRepository<'a> {
    pub fn new(client: &'a Surreal<Db>) -> Self {
        Self { client }
    }

    /// List the live memberships of a project.
    ///
    /// Keyword matches the user id or membership type; sort keys are
    /// `created` (default) and `membership_type`.
    pub async fn list(
        &self,
        project_id: &str,
        request: &PageRequest,
    ) -> DbResult<PageResult<ProjectMember>> {
        fetch_page::<ProjectMember, MemberRow>(self.client, project_id, request).await
    }

    /// List the live memberships of a project joined with user profiles.
    ///
    /// Keyword matches the user id, display name or email. A member whose
    /// profile is missing or deleted is still listed, with `user = None`.
    pub async fn list_view(
        &self,
        project_id: &str,
        request: &PageRequest,
    ) -> DbResult<PageResult<ProjectMemberView>> {
        request.validate()?;

        let members = self.live_members(project_id).await?;
        let user_ids: Vec<String> = members.iter().map(|m| m.user_id.clone()).collect();
        let profiles = UserRepository::new(self.client).get_many(&user_ids).await?;
        debug!(
            "Joining {} members of project {} with {} profiles",
            members.len(),
            project_id,
            profiles.len()
        );

        paginate_projected(members, project_id, request, |member| {
            let user = profiles.get(&member.user_id).cloned();
            ProjectMemberView::new(member, user)
        })
    }

    /// Get a live membership by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<ProjectMember>> {
        let row: Option<MemberRow> = self.client.select(("project_member", id)).await?;
        Ok(row.map(ProjectMember::from).filter(is_live))
    }

    /// Add a user to a project.
    ///
    /// If the user already holds a live membership it is returned unchanged,
    /// whatever `membership_type` was requested.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the user or the project is missing or
    /// deleted, `DbError::ValidationError` if the user is suspended, and
    /// `DbError::AlreadyExists` if another membership already uses `id`.
    pub async fn add(
        &self,
        id: &str,
        project_id: &str,
        user_id: &str,
        membership_type: MembershipType,
    ) -> DbResult<ProjectMember> {
        debug!(
            "Adding user {} to project {} as {}",
            user_id, project_id, membership_type
        );

        if let Some(existing) = self.find_membership(project_id, user_id).await? {
            debug!("User {} is already member {}", user_id, existing.id);
            return Ok(existing);
        }

        let user = UserRepository::new(self.client)
            .get(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))?;
        if user.is_suspended {
            return Err(DbError::ValidationError {
                message: format!("User '{}' is suspended", user_id),
            });
        }

        let project_live = ProjectRepository::new(self.client)
            .exists(project_id)
            .await?;
        if !project_live {
            return Err(DbError::not_found("Project", project_id));
        }

        let taken: Option<MemberRow> = self.client.select(("project_member", id)).await?;
        if taken.is_some() {
            return Err(DbError::AlreadyExists {
                entity: "Project member",
                id: id.to_string(),
            });
        }

        let member = ProjectMember::new(id, project_id, user_id, membership_type);
        self.client
            .query(
                r#"CREATE type::thing("project_member", $id) SET
                    project_id = $project_id,
                    user_id = $user_id,
                    membership_type = $membership_type,
                    created_at = <datetime> $created_at"#,
            )
            .bind(("id", member.id.clone()))
            .bind(("project_id", member.project_id.clone()))
            .bind(("user_id", member.user_id.clone()))
            .bind(("membership_type", membership_type.as_str()))
            .bind(("created_at", to_rfc3339(&member.created_at)))
            .await?
            .check()?;

        Ok(member)
    }

    /// Soft-delete a membership.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the membership is missing or already removed.
    pub async fn remove(&self, id: &str) -> DbResult<()> {
        debug!("Removing member: {}", id);
        let mut response = self
            .client
            .query(
                r#"UPDATE type::thing("project_member", $id)
                    SET is_deleted = true, deleted_at = time::now()
                    WHERE is_deleted = false
                    RETURN AFTER"#,
            )
            .bind(("id", id.to_string()))
            .await?;
        let removed: Vec<MemberRow> = response.take(0)?;
        if removed.is_empty() {
            return Err(DbError::not_found("Project member", id));
        }
        Ok(())
    }

    /// Change a member's role if the stored revision still matches.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the membership is missing or removed, and
    /// `DbError::Conflict` if its revision is no longer `expected_revision`.
    pub async fn update_type(
        &self,
        id: &str,
        expected_revision: u64,
        membership_type: MembershipType,
    ) -> DbResult<ProjectMember> {
        debug!(
            "Setting member {} to {} at revision {}",
            id, membership_type, expected_revision
        );
        let mut response = self
            .client
            .query(
                r#"UPDATE type::thing("project_member", $id)
                    SET membership_type = $membership_type, revision += 1
                    WHERE revision = $expected AND is_deleted = false
                    RETURN AFTER"#,
            )
            .bind(("id", id.to_string()))
            .bind(("membership_type", membership_type.as_str()))
            .bind(("expected", expected_revision))
            .await?;
        let updated: Vec<MemberRow> = response.take(0)?;

        match updated.into_iter().next() {
            Some(row) => Ok(row.into()),
            None => match self.get(id).await? {
                None => Err(DbError::not_found("Project member", id)),
                Some(_) => Err(DbError::Conflict {
                    entity: "Project member",
                    id: id.to_string(),
                    expected: expected_revision,
                }),
            },
        }
    }

    async fn live_members(&self, project_id: &str) -> DbResult<Vec<ProjectMember>> {
        let mut response = self
            .client
            .query("SELECT * FROM project_member WHERE project_id = $project_id AND is_deleted = false")
            .bind(("project_id", project_id.to_string()))
            .await?;
        let rows: Vec<MemberRow> = response.take(0)?;
        trace!("Fetched {} live members of {}", rows.len(), project_id);
        Ok(rows.into_iter().map(ProjectMember::from).collect())
    }

    async fn find_membership(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> DbResult<Option<ProjectMember>> {
        let mut response = self
            .client
            .query(
                r#"SELECT * FROM project_member
                    WHERE project_id = $project_id AND user_id = $user_id AND is_deleted = false
                    LIMIT 1"#,
            )
            .bind(("project_id", project_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await?;
        let rows: Vec<MemberRow> = response.take(0)?;
        Ok(rows.into_iter().next().map(ProjectMember::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::models::{Project, UserProfile};
    use crate::test_utils::{cleanup, create_test_db};

    async fn seed_project(db: &Database, id: &str) {
        db.projects()
            .create(&Project::new(id, "org1", format!("PN{:0>6}", id), id))
            .await
            .unwrap();
    }

    async fn seed_user(db: &Database, id: &str, name: &str, email: Option<&str>) {
        let mut user = UserProfile::new(id, name);
        if let Some(email) = email {
            user = user.with_email(email);
        }
        db.users().create(id, &user).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let (db, temp_dir) = create_test_db("member-repo").await;
        seed_project(&db, "p1").await;
        seed_user(&db, "u1", "Ada", None).await;
        seed_user(&db, "u2", "Grace", None).await;

        let repo = db.members();
        repo.add("m1", "p1", "u1", MembershipType::Manager).await.unwrap();
        repo.add("m2", "p1", "u2", MembershipType::Guest).await.unwrap();

        let page = repo.list("p1", &PageRequest::default()).await.unwrap();
        let ids: Vec<&str> = page.items.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(page.total_items, 2);

        let by_type = repo
            .list("p1", &PageRequest::default().with_sort("membership_type"))
            .await
            .unwrap();
        let types: Vec<MembershipType> = by_type.items.iter().map(|m| m.membership_type).collect();
        assert_eq!(types, vec![MembershipType::Guest, MembershipType::Manager]);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_list_keyword_matches_user_id_substring() {
        let (db, temp_dir) = create_test_db("member-repo").await;
        seed_project(&db, "p1").await;
        for user in ["u1", "u10", "u2"] {
            seed_user(&db, user, user, None).await;
        }

        let repo = db.members();
        repo.add("m1", "p1", "u1", MembershipType::Member).await.unwrap();
        repo.add("m2", "p1", "u10", MembershipType::Member).await.unwrap();
        repo.add("m3", "p1", "u2", MembershipType::Member).await.unwrap();

        let page = repo
            .list("p1", &PageRequest::default().with_keyword("U1"))
            .await
            .unwrap();
        let users: Vec<&str> = page.items.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(users, vec!["u1", "u10"]);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_add_is_idempotent_per_user() {
        let (db, temp_dir) = create_test_db("member-repo").await;
        seed_project(&db, "p1").await;
        seed_user(&db, "u1", "Ada", None).await;

        let repo = db.members();
        let first = repo.add("m1", "p1", "u1", MembershipType::Member).await.unwrap();
        let second = repo.add("m2", "p1", "u1", MembershipType::Manager).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.membership_type, MembershipType::Member);

        let page = repo.list("p1", &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_items, 1);

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_add_rejects_missing_suspended_user_and_missing_project() {
        let (db, temp_dir) = create_test_db("member-repo").await;
        seed_project(&db, "p1").await;
        seed_user(&db, "u1", "Ada", None).await;
        db.users().set_suspended("u1", true).await.unwrap();
        seed_user(&db, "u2", "Grace", None).await;

        let repo = db.members();
        let err = repo
            .add("m1", "p1", "ghost", MembershipType::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "User", .. }));

        let err = repo
            .add("m1", "p1", "u1", MembershipType::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ValidationError { .. }));

        let err = repo
            .add("m1", "nowhere", "u2", MembershipType::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { entity: "Project", .. }));

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_remove_hides_member_and_allows_rejoin() {
        let (db, temp_dir) = create_test_db("member-repo").await;
        seed_project(&db, "p1").await;
        seed_user(&db, "u1", "Ada", None).await;

        let repo = db.members();
        repo.add("m1", "p1", "u1", MembershipType::Member).await.unwrap();
        repo.remove("m1").await.unwrap();

        assert!(repo.get("m1").await.unwrap().is_none());
        let page = repo.list("p1", &PageRequest::default()).await.unwrap();
        assert!(page.is_empty());

        let rejoined = repo.add("m2", "p1", "u1", MembershipType::Guest).await.unwrap();
        assert_eq!(rejoined.id, "m2");

        let err = repo.remove("m1").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_update_type_is_revision_checked() {
        let (db, temp_dir) = create_test_db("member-repo").await;
        seed_project(&db, "p1").await;
        seed_user(&db, "u1", "Ada", None).await;

        let repo = db.members();
        repo.add("m1", "p1", "u1", MembershipType::Member).await.unwrap();

        let promoted = repo
            .update_type("m1", 0, MembershipType::Manager)
            .await
            .unwrap();
        assert_eq!(promoted.membership_type, MembershipType::Manager);
        assert_eq!(promoted.revision, 1);

        let err = repo
            .update_type("m1", 0, MembershipType::Guest)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { expected: 0, .. }));
        assert_eq!(
            repo.get("m1").await.unwrap().unwrap().membership_type,
            MembershipType::Manager
        );

        let err = repo
            .update_type("ghost", 0, MembershipType::Guest)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_view_joins_profiles_and_filters_on_them() {
        let (db, temp_dir) = create_test_db("member-repo").await;
        seed_project(&db, "p1").await;
        seed_user(&db, "u1", "Ada Lovelace", Some("ada@engine.org")).await;
        seed_user(&db, "u2", "Grace Hopper", Some("grace@navy.mil")).await;

        let repo = db.members();
        repo.add("m1", "p1", "u1", MembershipType::Member).await.unwrap();
        repo.add("m2", "p1", "u2", MembershipType::Member).await.unwrap();

        let page = repo.list_view("p1", &PageRequest::default()).await.unwrap();
        let names: Vec<&str> = page.items.iter().map(|v| v.display_name()).collect();
        assert_eq!(names, vec!["Ada Lovelace", "Grace Hopper"]);

        let navy = repo
            .list_view("p1", &PageRequest::default().with_keyword("NAVY"))
            .await
            .unwrap();
        assert_eq!(navy.total_items, 1);
        assert_eq!(navy.items[0].user_id, "u2");

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_view_keeps_member_with_missing_profile() {
        let (db, temp_dir) = create_test_db("member-repo").await;
        seed_project(&db, "p1").await;
        seed_user(&db, "u1", "Ada", None).await;

        let repo = db.members();
        repo.add("m1", "p1", "u1", MembershipType::Member).await.unwrap();
        // The profile disappears after the membership was created
        db.client()
            .query(r#"UPDATE user_profile:u1 SET is_deleted = true, deleted_at = time::now()"#)
            .await
            .unwrap()
            .check()
            .unwrap();

        let page = repo.list_view("p1", &PageRequest::default()).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert!(page.items[0].user.is_none());
        assert_eq!(page.items[0].display_name(), "u1");

        cleanup(&temp_dir);
    }

    #[tokio::test]
    async fn test_view_rejects_invalid_page() {
        let (db, temp_dir) = create_test_db("member-repo").await;

        let err = db
            .members()
            .list_view("p1", &PageRequest::new(0, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidArgument { .. }));

        cleanup(&temp_dir);
    }
}
