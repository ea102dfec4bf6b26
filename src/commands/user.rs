//! User profile commands
//!
//! Implements `bkl user add`. Profiles normally come from the identity
//! store; this command seeds them locally.

use super::require_text;
use crate::error::{CliError, CliResult};
use crate::id::IdGenerator;
use backlog_db::{Database, DbError, UserProfile};
use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user profile
    Add(UserAddCommand),
}

impl UserCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        match self {
            UserCommand::Add(cmd) => cmd.execute(db).await,
        }
    }
}

/// Create a user profile and print its id
#[derive(Debug, Args)]
pub struct UserAddCommand {
    /// Name shown in member listings
    pub display_name: String,

    /// Email address
    #[arg(short, long)]
    pub email: Option<String>,
}

impl UserAddCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        require_text(&self.display_name, "display name")?;

        let repo = db.users();
        let mut generator = IdGenerator::new(&self.display_name);
        while let Some(id) = generator.next_id() {
            let mut user = UserProfile::new(id.as_str(), self.display_name.trim());
            if let Some(email) = &self.email {
                user = user.with_email(email.clone());
            }
            match repo.create(&id, &user).await {
                Err(DbError::AlreadyExists { .. }) => continue,
                Err(e) => return Err(e.into()),
                Ok(()) => return Ok(id),
            }
        }

        Err(CliError::IdExhausted("user id"))
    }
}
