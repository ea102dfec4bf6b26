//! Project member commands
//!
//! Implements `bkl member list|add|remove|set-type`.

use super::{PageArgs, parse_membership_type};
use crate::error::{CliError, CliResult};
use crate::id::IdGenerator;
use crate::output::{format_member_page, format_member_view_page, to_json};
use backlog_db::{Database, DbError, MembershipType};
use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum MemberCommand {
    /// List the members of a project
    List(MemberListCommand),
    /// Add a user to a project
    Add(MemberAddCommand),
    /// Remove a member from a project
    Remove(MemberRemoveCommand),
    /// Change a member's role
    SetType(MemberSetTypeCommand),
}

impl MemberCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        match self {
            MemberCommand::List(cmd) => cmd.execute(db).await,
            MemberCommand::Add(cmd) => cmd.execute(db).await,
            MemberCommand::Remove(cmd) => cmd.execute(db).await,
            MemberCommand::SetType(cmd) => cmd.execute(db).await,
        }
    }
}

/// List members page by page.
///
/// Sort keys: `created` (default), `membership_type`. With `--profiles`
/// each member is joined with its user profile and the keyword also
/// matches display names and emails.
#[derive(Debug, Args)]
pub struct MemberListCommand {
    /// Project id
    #[arg(long)]
    pub project: String,

    /// Join user profiles
    #[arg(long)]
    pub profiles: bool,

    #[command(flatten)]
    pub paging: PageArgs,
}

impl MemberListCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let request = self.paging.to_request();
        if self.profiles {
            let page = db.members().list_view(&self.project, &request).await?;
            if self.paging.json {
                return to_json(&page);
            }
            return Ok(format_member_view_page(&page));
        }

        let page = db.members().list(&self.project, &request).await?;
        if self.paging.json {
            to_json(&page)
        } else {
            Ok(format_member_page(&page))
        }
    }
}

/// Add a user to a project and print the membership id
#[derive(Debug, Args)]
pub struct MemberAddCommand {
    /// Project id
    #[arg(long)]
    pub project: String,

    /// User id
    #[arg(long)]
    pub user: String,

    /// Role in the project (manager, member, guest)
    #[arg(long = "type", value_parser = parse_membership_type, default_value = "member")]
    pub membership_type: MembershipType,
}

impl MemberAddCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let seed = format!("{}:{}", self.project, self.user);
        let mut generator = IdGenerator::new(seed);
        while let Some(id) = generator.next_id() {
            match db
                .members()
                .add(&id, &self.project, &self.user, self.membership_type)
                .await
            {
                Err(DbError::AlreadyExists { .. }) => continue,
                Err(e) => return Err(e.into()),
                Ok(member) => return Ok(member.id),
            }
        }

        Err(CliError::IdExhausted("membership id"))
    }
}

/// Remove a member
#[derive(Debug, Args)]
pub struct MemberRemoveCommand {
    /// Membership id
    pub id: String,
}

impl MemberRemoveCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        db.members().remove(&self.id).await?;
        Ok(format!("Removed member {}", self.id))
    }
}

/// Change a member's role
#[derive(Debug, Args)]
pub struct MemberSetTypeCommand {
    /// Membership id
    pub id: String,

    /// New role (manager, member, guest)
    #[arg(value_parser = parse_membership_type)]
    pub membership_type: MembershipType,

    /// Revision the change is based on
    #[arg(long)]
    pub revision: Option<u64>,
}

impl MemberSetTypeCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let revision = match self.revision {
            Some(revision) => revision,
            None => {
                db.members()
                    .get(&self.id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Project member", self.id.as_str()))?
                    .revision
            }
        };

        let member = db
            .members()
            .update_type(&self.id, revision, self.membership_type)
            .await?;
        Ok(format!(
            "Member {} is now {} (revision {})",
            member.id, member.membership_type, member.revision
        ))
    }
}
