//! Project commands
//!
//! Implements `bkl project list|add|show|update|delete`.

use super::{PageArgs, require_text};
use crate::error::{CliError, CliResult};
use crate::id::{IdGenerator, PermaNameGenerator};
use crate::output::{format_project_details, format_project_page, to_json};
use backlog_db::{Database, DbError, Project, ProjectUpdate};
use clap::{Args, Subcommand};
use tracing::debug;

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// List the projects of an organization
    List(ProjectListCommand),
    /// Create a project
    Add(ProjectAddCommand),
    /// Show one project
    Show(ProjectShowCommand),
    /// Update a project's name, description or display order
    Update(ProjectUpdateCommand),
    /// Delete a project
    Delete(ProjectDeleteCommand),
}

impl ProjectCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        match self {
            ProjectCommand::List(cmd) => cmd.execute(db).await,
            ProjectCommand::Add(cmd) => cmd.execute(db).await,
            ProjectCommand::Show(cmd) => cmd.execute(db).await,
            ProjectCommand::Update(cmd) => cmd.execute(db).await,
            ProjectCommand::Delete(cmd) => cmd.execute(db).await,
        }
    }
}

/// List projects page by page.
///
/// Sort keys: `name` (default), `created`, `display_order`.
#[derive(Debug, Args)]
pub struct ProjectListCommand {
    /// Organization id
    #[arg(long)]
    pub org: String,

    #[command(flatten)]
    pub paging: PageArgs,
}

impl ProjectListCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let page = db.projects().list(&self.org, &self.paging.to_request()).await?;
        if self.paging.json {
            to_json(&page)
        } else {
            Ok(format_project_page(&page))
        }
    }
}

/// Create a project and print its id
#[derive(Debug, Args)]
pub struct ProjectAddCommand {
    /// Owning organization id
    #[arg(long)]
    pub org: String,

    /// Project name
    pub name: String,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub display_order: Option<i64>,
}

impl ProjectAddCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        require_text(&self.name, "name")?;

        if db.organizations().get(&self.org).await?.is_none() {
            return Err(DbError::not_found("Organization", self.org.as_str()).into());
        }

        let perma_name = self.generate_perma_name(db).await?;
        debug!("Using perma name {} for project {}", perma_name, self.name);

        let mut generator = IdGenerator::new(&self.name);
        while let Some(id) = generator.next_id() {
            let mut project = Project::new(
                id.as_str(),
                self.org.as_str(),
                perma_name.as_str(),
                self.name.trim(),
            );
            if let Some(description) = &self.description {
                project = project.with_description(description.clone());
            }
            if let Some(order) = self.display_order {
                project = project.with_display_order(order);
            }

            match db.projects().create(&project).await {
                Err(DbError::AlreadyExists { .. }) => continue,
                Err(e) => return Err(e.into()),
                Ok(()) => return Ok(id),
            }
        }

        Err(CliError::IdExhausted("project id"))
    }

    async fn generate_perma_name(&self, db: &Database) -> CliResult<String> {
        let mut generator = PermaNameGenerator::new();
        while let Some(candidate) = generator.next_name() {
            if db
                .projects()
                .is_perma_name_unique(&self.org, &candidate)
                .await?
            {
                return Ok(candidate);
            }
        }
        Err(CliError::IdExhausted("perma name"))
    }
}

/// Show a project
#[derive(Debug, Args)]
pub struct ProjectShowCommand {
    /// Project id
    pub id: String,

    /// Print the project as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProjectShowCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let project = db
            .projects()
            .get(&self.id)
            .await?
            .ok_or_else(|| DbError::not_found("Project", self.id.as_str()))?;
        if self.json {
            to_json(&project)
        } else {
            Ok(format_project_details(&project))
        }
    }
}

/// Update a project.
///
/// Without `--revision` the current revision is read first, so a concurrent
/// change between the read and the write still fails with a conflict.
#[derive(Debug, Args)]
pub struct ProjectUpdateCommand {
    /// Project id
    pub id: String,

    /// Revision the update is based on
    #[arg(long)]
    pub revision: Option<u64>,

    #[arg(long)]
    pub name: Option<String>,

    /// New description; an empty string clears it
    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub display_order: Option<i64>,
}

impl ProjectUpdateCommand {
    fn to_update(&self) -> CliResult<ProjectUpdate> {
        let mut update = ProjectUpdate::new();
        if let Some(name) = &self.name {
            require_text(name, "name")?;
            update = update.with_name(name.trim());
        }
        match self.description.as_deref() {
            Some("") => update = update.clear_description(),
            Some(description) => update = update.with_description(description),
            None => {}
        }
        if let Some(order) = self.display_order {
            update = update.with_display_order(order);
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
                db.projects()
                    .get(&self.id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Project", self.id.as_str()))?
                    .revision
            }
        };

        let project = db.projects().update(&self.id, revision, &update).await?;
        Ok(format!(
            "Updated project {} (revision {})",
            project.id, project.revision
        ))
    }
}

/// Delete a project
#[derive(Debug, Args)]
pub struct ProjectDeleteCommand {
    /// Project id
    pub id: String,
}

impl ProjectDeleteCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        db.projects().delete(&self.id).await?;
        Ok(format!("Deleted project {}", self.id))
    }
}
