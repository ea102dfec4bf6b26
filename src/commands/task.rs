//! Task commands
//!
//! Implements `bkl task list|add|update|delete`.

use super::{PageArgs, require_text};
use crate::error::{CliError, CliResult};
use crate::id::IdGenerator;
use crate::output::{format_task_page, to_json};
use backlog_db::{Database, DbError, Task, TaskUpdate};
use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List the tasks of a project
    List(TaskListCommand),
    /// Create a task
    Add(TaskAddCommand),
    /// Update a task
    Update(TaskUpdateCommand),
    /// Delete a task
    Delete(TaskDeleteCommand),
}

impl TaskCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        match self {
            TaskCommand::List(cmd) => cmd.execute(db).await,
            TaskCommand::Add(cmd) => cmd.execute(db).await,
            TaskCommand::Update(cmd) => cmd.execute(db).await,
            TaskCommand::Delete(cmd) => cmd.execute(db).await,
        }
    }
}

/// List tasks page by page.
///
/// Sort keys: `created` (default), `title`, `updated`.
#[derive(Debug, Args)]
pub struct TaskListCommand {
    /// Project id
    #[arg(long)]
    pub project: String,

    #[command(flatten)]
    pub paging: PageArgs,
}

impl TaskListCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let page = db.tasks().list(&self.project, &self.paging.to_request()).await?;
        if self.paging.json {
            to_json(&page)
        } else {
            Ok(format_task_page(&page))
        }
    }
}

/// Create a task and print its id
#[derive(Debug, Args)]
pub struct TaskAddCommand {
    /// Project id
    #[arg(long)]
    pub project: String,

    /// Title of the task
    pub title: String,

    /// Detailed description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Status attribute id
    #[arg(long)]
    pub status: Option<String>,

    /// Assigned user id
    #[arg(long)]
    pub assignee: Option<String>,
}

impl TaskAddCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        require_text(&self.title, "title")?;

        let mut generator = IdGenerator::new(&self.title);
        while let Some(id) = generator.next_id() {
            let mut task = Task::new(id.as_str(), self.project.as_str(), self.title.trim());
            if let Some(description) = &self.description {
                task = task.with_description(description.clone());
            }
            if let Some(status) = &self.status {
                task = task.with_status(status.clone());
            }
            if let Some(assignee) = &self.assignee {
                task = task.with_assignee(assignee.clone());
            }

            match db.tasks().create(&task).await {
                Err(DbError::AlreadyExists { .. }) => continue,
                Err(e) => return Err(e.into()),
                Ok(()) => return Ok(id),
            }
        }

        Err(CliError::IdExhausted("task id"))
    }
}

/// Update a task.
///
/// Empty strings clear the description, status or assignee.
#[derive(Debug, Args)]
pub struct TaskUpdateCommand {
    /// Task id
    pub id: String,

    /// Revision the update is based on
    #[arg(long)]
    pub revision: Option<u64>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub assignee: Option<String>,
}

impl TaskUpdateCommand {
    fn to_update(&self) -> CliResult<TaskUpdate> {
        let mut update = TaskUpdate::new();
        if let Some(title) = &self.title {
            require_text(title, "title")?;
            update = update.with_title(title.trim());
        }
        match self.description.as_deref() {
            Some("") => update = update.clear_description(),
            Some(description) => update = update.with_description(description),
            None => {}
        }
        match self.status.as_deref() {
            Some("") => update = update.clear_status(),
            Some(status) => update = update.with_status(status),
            None => {}
        }
        match self.assignee.as_deref() {
            Some("") => update = update.clear_assignee(),
            Some(assignee) => update = update.with_assignee(assignee),
            None => {}
        }
        if !update.has_updates() {
            return Err(CliError::InvalidInput("no updates specified".to_string()));
        }
        Ok(update)
    }

    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let update = self.to_update()?;

        let revision = match self.revision {
            Some(revision) => revision,
            None => {
                db.tasks()
                    .get(&self.id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Task", self.id.as_str()))?
                    .revision
            }
        };

        let task = db.tasks().update(&self.id, revision, &update).await?;
        Ok(format!("Updated task {} (revision {})", task.id, task.revision))
    }
}

/// Delete a task
#[derive(Debug, Args)]
pub struct TaskDeleteCommand {
    /// Task id
    pub id: String,
}

impl TaskDeleteCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        db.tasks().delete(&self.id).await?;
        Ok(format!("Deleted task {}", self.id))
    }
}
