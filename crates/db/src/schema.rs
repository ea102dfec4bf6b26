//! Database schema initialization for Backlog
//!
//! Defines the SurrealDB tables for organizations, user profiles, projects,
//! project memberships, tasks and task attributes. Every table carries the
//! soft-delete pair `is_deleted` / `deleted_at`.

use crate::error::DbError;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// SQL statements for schema initialization
mod sql {
    pub const DEFINE_ORGANIZATION_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS organization SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS name ON organization TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON organization TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS is_deleted ON organization TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS deleted_at ON organization TYPE option<datetime>;
    "#;

    pub const DEFINE_USER_PROFILE_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS user_profile SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS display_name ON user_profile TYPE string;
        DEFINE FIELD IF NOT EXISTS email ON user_profile TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS is_suspended ON user_profile TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS created_at ON user_profile TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS is_deleted ON user_profile TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS deleted_at ON user_profile TYPE option<datetime>;
    "#;

    pub const DEFINE_PROJECT_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS project SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS owner_id ON project TYPE string;
        DEFINE FIELD IF NOT EXISTS perma_name ON project TYPE string;
        DEFINE FIELD IF NOT EXISTS name ON project TYPE string;
        DEFINE FIELD IF NOT EXISTS description ON project TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS display_order ON project TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS revision ON project TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS created_at ON project TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS updated_at ON project TYPE option<datetime>;
        DEFINE FIELD IF NOT EXISTS is_deleted ON project TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS deleted_at ON project TYPE option<datetime>;

        DEFINE INDEX IF NOT EXISTS project_owner ON project FIELDS owner_id, is_deleted;
        DEFINE INDEX IF NOT EXISTS project_perma_name ON project FIELDS owner_id, perma_name;
    "#;

    pub const DEFINE_PROJECT_MEMBER_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS project_member SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS project_id ON project_member TYPE string;
        DEFINE FIELD IF NOT EXISTS user_id ON project_member TYPE string;
        DEFINE FIELD IF NOT EXISTS membership_type ON project_member TYPE string
            ASSERT $value IN ["manager", "member", "guest"];
        DEFINE FIELD IF NOT EXISTS revision ON project_member TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS created_at ON project_member TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS is_deleted ON project_member TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS deleted_at ON project_member TYPE option<datetime>;

        DEFINE INDEX IF NOT EXISTS project_member_project ON project_member FIELDS project_id, is_deleted;
    "#;

    pub const DEFINE_TASK_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS task SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS project_id ON task TYPE string;
        DEFINE FIELD IF NOT EXISTS title ON task TYPE string;
        DEFINE FIELD IF NOT EXISTS description ON task TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS status_id ON task TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS assignee_id ON task TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS revision ON task TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS created_at ON task TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS updated_at ON task TYPE option<datetime>;
        DEFINE FIELD IF NOT EXISTS is_deleted ON task TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS deleted_at ON task TYPE option<datetime>;

        DEFINE INDEX IF NOT EXISTS task_project ON task FIELDS project_id, is_deleted;
    "#;

    pub const DEFINE_TASK_ATTRIBUTE_TABLE: &str = r#"
        DEFINE TABLE IF NOT EXISTS task_attribute SCHEMAFULL;

        DEFINE FIELD IF NOT EXISTS project_id ON task_attribute TYPE string;
        DEFINE FIELD IF NOT EXISTS kind ON task_attribute TYPE string
            ASSERT $value IN ["status", "type", "category", "milestone", "version"];
        DEFINE FIELD IF NOT EXISTS name ON task_attribute TYPE string;
        DEFINE FIELD IF NOT EXISTS display_order ON task_attribute TYPE int DEFAULT 0;
        DEFINE FIELD IF NOT EXISTS color ON task_attribute TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS created_at ON task_attribute TYPE datetime DEFAULT time::now();
        DEFINE FIELD IF NOT EXISTS is_deleted ON task_attribute TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS deleted_at ON task_attribute TYPE option<datetime>;

        DEFINE INDEX IF NOT EXISTS task_attribute_project ON task_attribute FIELDS project_id, kind;
    "#;

    /// Every table definition, in creation order
    pub const ALL: [&str; 6] = [
        DEFINE_ORGANIZATION_TABLE,
        DEFINE_USER_PROFILE_TABLE,
        DEFINE_PROJECT_TABLE,
        DEFINE_PROJECT_MEMBER_TABLE,
        DEFINE_TASK_TABLE,
        DEFINE_TASK_ATTRIBUTE_TABLE,
    ];
}

/// Initialize the database schema.
///
/// This function is idempotent - it can be called multiple times safely
/// as it uses `IF NOT EXISTS` clauses.
///
/// # Errors
///
/// Returns `DbError::Schema` if any schema definition fails.
pub async fn init_schema(client: &Surreal<Db>) -> Result<(), DbError> {
    for statement in sql::ALL {
        client
            .query(statement)
            .await
            .and_then(|response| response.check())
            .map_err(|e| DbError::Schema(Box::new(e)))?;
    }

    Ok(())
}
