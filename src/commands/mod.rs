//! CLI commands for Backlog
//!
//! This module contains all subcommand implementations for the bkl CLI.
//! Every command takes its context (organization or project id) explicitly
//! and returns the text to print.

pub mod attribute;
pub mod member;
pub mod org;
pub mod project;
pub mod task;
pub mod user;

pub use attribute::{
    AttrAddCommand, AttrCommand, AttrDeleteCommand, AttrListCommand, AttrUpdateCommand,
};
pub use member::{
    MemberAddCommand, MemberCommand, MemberListCommand, MemberRemoveCommand,
    MemberSetTypeCommand,
};
pub use org::{OrgAddCommand, OrgCommand};
pub use project::{
    ProjectAddCommand, ProjectCommand, ProjectDeleteCommand, ProjectListCommand,
    ProjectShowCommand, ProjectUpdateCommand,
};
pub use task::{
    TaskAddCommand, TaskCommand, TaskDeleteCommand, TaskListCommand, TaskUpdateCommand,
};
pub use user::{UserAddCommand, UserCommand};

use crate::error::{CliError, CliResult};
use backlog_db::{AttributeKind, DEFAULT_PAGE_SIZE, Database, MembershipType, PageRequest};
use clap::{Args, Subcommand};

/// Environment variable holding the default page size
pub const PAGE_SIZE_ENV: &str = "BKL_PAGE_SIZE";

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage organizations
    #[command(subcommand)]
    Org(OrgCommand),

    /// Manage user profiles
    #[command(subcommand)]
    User(UserCommand),

    /// Manage projects of an organization
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage project members
    #[command(subcommand)]
    Member(MemberCommand),

    /// Manage tasks of a project
    #[command(subcommand)]
    Task(TaskCommand),

    /// Manage task attributes (statuses, types, categories, milestones, versions)
    #[command(subcommand)]
    Attr(AttrCommand),
}

impl Command {
    /// Execute the command with the given database connection.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if the command execution fails.
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        match self {
            Command::Org(cmd) => cmd.execute(db).await,
            Command::User(cmd) => cmd.execute(db).await,
            Command::Project(cmd) => cmd.execute(db).await,
            Command::Member(cmd) => cmd.execute(db).await,
            Command::Task(cmd) => cmd.execute(db).await,
            Command::Attr(cmd) => cmd.execute(db).await,
        }
    }
}

/// Paging flags shared by every list command
#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// Only list records containing this text (case-insensitive)
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Sort key; unknown keys fall back to the default order
    #[arg(short, long)]
    pub sort: Option<String>,

    /// 1-based page number
    #[arg(short, long, default_value_t = 1)]
    pub page: u64,

    /// Items per page
    #[arg(long, env = PAGE_SIZE_ENV, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// Print the page as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for PageArgs {
    fn default() -> Self {
        Self {
            keyword: None,
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            json: false,
        }
    }
}

impl PageArgs {
    /// Build the pipeline request from the flags
    pub fn to_request(&self) -> PageRequest {
        PageRequest {
            keyword: self.keyword.clone(),
            sort: self.sort.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Reject empty or whitespace-only text arguments
pub(crate) fn require_text(value: &str, field: &str) -> CliResult<()> {
    if value.trim().is_empty() {
        return Err(CliError::InvalidInput(format!("{} required", field)));
    }
    Ok(())
}

/// Parse a membership type argument
pub(crate) fn parse_membership_type(s: &str) -> Result<MembershipType, String> {
    MembershipType::parse(&s.to_lowercase()).ok_or_else(|| {
        format!(
            "invalid membership type '{}'. Valid values: manager, member, guest",
            s
        )
    })
}

/// Parse an attribute kind argument
pub(crate) fn parse_attribute_kind(s: &str) -> Result<AttributeKind, String> {
    AttributeKind::parse(&s.to_lowercase()).ok_or_else(|| {
        format!(
            "invalid attribute kind '{}'. Valid values: status, type, category, milestone, version",
            s
        )
    })
}
