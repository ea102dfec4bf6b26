//! Organization commands
//!
//! Implements `bkl org add`.

use super::require_text;
use crate::error::{CliError, CliResult};
use crate::id::IdGenerator;
use backlog_db::{Database, DbError, Organization};
use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum OrgCommand {
    /// Create an organization
    Add(OrgAddCommand),
}

impl OrgCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        match self {
            OrgCommand::Add(cmd) => cmd.execute(db).await,
        }
    }
}

/// Create an organization and print its id
#[derive(Debug, Args)]
pub struct OrgAddCommand {
    /// Organization name
    pub name: String,
}

impl OrgAddCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        require_text(&self.name, "name")?;

        let repo = db.organizations();
        let mut generator = IdGenerator::new(&self.name);
        while let Some(id) = generator.next_id() {
            let organization = Organization::new(id.as_str(), self.name.trim());
            match repo.create(&id, &organization).await {
                Err(DbError::AlreadyExists { .. }) => continue,
                Err(e) => return Err(e.into()),
                Ok(()) => return Ok(id),
            }
        }

        Err(CliError::IdExhausted("organization id"))
    }
}
