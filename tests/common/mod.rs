//! Test infrastructure for integration tests
//!
//! Provides isolated database setup/teardown and command builder helpers.
//! Each test gets its own database instance so no state is shared.

use backlog::commands::{
    MemberAddCommand, OrgAddCommand, PageArgs, ProjectAddCommand, TaskAddCommand,
    UserAddCommand,
};
use backlog_db::{Database, MembershipType};
use std::path::PathBuf;

/// Test context containing an isolated database and temp directory
pub struct TestContext {
    pub db: Database,
    pub temp_dir: PathBuf,
}

impl TestContext {
    /// Create a new test context with an isolated database.
    ///
    /// The directory name combines the process id, thread id and a
    /// nanosecond timestamp.
    pub async fn new() -> Self {
        let temp_dir = std::env::temp_dir().join(format!(
            "bkl-integration-test-{}-{:?}-{}",
            std::process::id(),
            std::thread::current().id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        let db = Database::connect(&temp_dir).await.unwrap();
        db.init().await.unwrap();

        Self { db, temp_dir }
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.temp_dir);
    }
}

// =============================================================================
// Command Builder Helpers
// =============================================================================

/// Paging flags for a given page and page size
pub fn paging(page: u64, page_size: u64) -> PageArgs {
    PageArgs {
        page,
        page_size,
        ..PageArgs::default()
    }
}

/// Paging flags selecting JSON output
#[allow(dead_code)]
pub fn json_paging() -> PageArgs {
    PageArgs {
        json: true,
        ..PageArgs::default()
    }
}

/// Create an organization and return its id
pub async fn add_org(db: &Database, name: &str) -> String {
    OrgAddCommand {
        name: name.to_string(),
    }
    .execute(db)
    .await
    .unwrap()
}

/// Create a user profile and return its id
pub async fn add_user(db: &Database, display_name: &str, email: Option<&str>) -> String {
    UserAddCommand {
        display_name: display_name.to_string(),
        email: email.map(str::to_string),
    }
    .execute(db)
    .await
    .unwrap()
}

/// Create a project with default optional fields and return its id
pub async fn add_project(db: &Database, org: &str, name: &str) -> String {
    add_project_cmd(org, name).execute(db).await.unwrap()
}

pub fn add_project_cmd(org: &str, name: &str) -> ProjectAddCommand {
    ProjectAddCommand {
        org: org.to_string(),
        name: name.to_string(),
        description: None,
        display_order: None,
    }
}

/// Add a user to a project and return the membership id
#[allow(dead_code)]
pub async fn add_member(
    db: &Database,
    project: &str,
    user: &str,
    membership_type: MembershipType,
) -> String {
    MemberAddCommand {
        project: project.to_string(),
        user: user.to_string(),
        membership_type,
    }
    .execute(db)
    .await
    .unwrap()
}

/// Create a task with default optional fields and return its id
#[allow(dead_code)]
pub async fn add_task(db: &Database, project: &str, title: &str) -> String {
    TaskAddCommand {
        project: project.to_string(),
        title: title.to_string(),
        description: None,
        status: None,
        assignee: None,
    }
    .execute(db)
    .await
    .unwrap()
}

/// Organization plus one project, the usual starting point
pub async fn org_with_project(db: &Database) -> (String, String) {
    let org = add_org(db, "Acme").await;
    let project = add_project(db, &org, "Alpha").await;
    (org, project)
}
