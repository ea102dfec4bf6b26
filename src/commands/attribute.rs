//! Task attribute commands
//!
//! Implements `bkl attr list|add|update|delete`.

use super::{parse_attribute_kind, require_text};
use crate::error::{CliError, CliResult};
use crate::id::IdGenerator;
use crate::output::{format_attribute_table, to_json};
use backlog_db::{AttributeKind, AttributeUpdate, Database, DbError, TaskAttribute};
use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum AttrCommand {
    /// List the attributes of one kind
    List(AttrListCommand),
    /// Create an attribute
    Add(AttrAddCommand),
    /// Rename, reorder or recolor an attribute
    Update(AttrUpdateCommand),
    /// Delete an attribute
    Delete(AttrDeleteCommand),
}

impl AttrCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        match self {
            AttrCommand::List(cmd) => cmd.execute(db).await,
            AttrCommand::Add(cmd) => cmd.execute(db).await,
            AttrCommand::Update(cmd) => cmd.execute(db).await,
            AttrCommand::Delete(cmd) => cmd.execute(db).await,
        }
    }
}

/// List attributes ordered by display order, then name
#[derive(Debug, Args)]
pub struct AttrListCommand {
    /// Project id
    #[arg(long)]
    pub project: String,

    /// status, type, category, milestone or version
    #[arg(long, value_parser = parse_attribute_kind)]
    pub kind: AttributeKind,

    /// Print the attributes as JSON
    #[arg(long)]
    pub json: bool,
}

impl AttrListCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let attributes = db.attributes().list(&self.project, self.kind).await?;
        if self.json {
            to_json(&attributes)
        } else {
            Ok(format_attribute_table(&attributes))
        }
    }
}

/// Create an attribute and print its id
#[derive(Debug, Args)]
pub struct AttrAddCommand {
    /// Project id
    #[arg(long)]
    pub project: String,

    /// status, type, category, milestone or version
    #[arg(long, value_parser = parse_attribute_kind)]
    pub kind: AttributeKind,

    /// Attribute name
    pub name: String,

    #[arg(long, default_value_t = 0)]
    pub display_order: i64,

    /// Display color, e.g. `#ff8800`
    #[arg(long)]
    pub color: Option<String>,
}

impl AttrAddCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        require_text(&self.name, "name")?;

        if !db.projects().exists(&self.project).await? {
            return Err(DbError::not_found("Project", self.project.as_str()).into());
        }

        let mut generator = IdGenerator::new(&self.name);
        while let Some(id) = generator.next_id() {
            let mut attribute =
                TaskAttribute::new(id.as_str(), self.project.as_str(), self.kind, self.name.trim())
                    .with_display_order(self.display_order);
            if let Some(color) = &self.color {
                attribute = attribute.with_color(color.clone());
            }

            match db.attributes().create(&attribute).await {
                Err(DbError::AlreadyExists { .. }) => continue,
                Err(e) => return Err(e.into()),
                Ok(()) => return Ok(id),
            }
        }

        Err(CliError::IdExhausted("attribute id"))
    }
}

/// Update an attribute.
///
/// Omitted fields keep their stored value; an empty `--color` clears it.
#[derive(Debug, Args)]
pub struct AttrUpdateCommand {
    /// Attribute id
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub display_order: Option<i64>,

    #[arg(long)]
    pub color: Option<String>,
}

impl AttrUpdateCommand {
    fn merge(&self, current: &TaskAttribute) -> CliResult<AttributeUpdate> {
        if self.name.is_none() && self.display_order.is_none() && self.color.is_none() {
            return Err(CliError::InvalidInput("no updates specified".to_string()));
        }
        let name = match &self.name {
            Some(name) => {
                require_text(name, "name")?;
                name.trim().to_string()
            }
            None => current.name.clone(),
        };
        let color = match self.color.as_deref() {
            Some("") => None,
            Some(color) => Some(color.to_string()),
            None => current.color.clone(),
        };
        Ok(AttributeUpdate {
            name,
            display_order: self.display_order.unwrap_or(current.display_order),
            color,
        })
    }

    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        let current = db
            .attributes()
            .get(&self.id)
            .await?
            .ok_or_else(|| DbError::not_found("Task attribute", self.id.as_str()))?;
        let update = self.merge(&current)?;

        let attribute = db.attributes().update(&self.id, &update).await?;
        Ok(format!("Updated {} {}", attribute.kind, attribute.id))
    }
}

/// Delete an attribute
#[derive(Debug, Args)]
pub struct AttrDeleteCommand {
    /// Attribute id
    pub id: String,
}

impl AttrDeleteCommand {
    pub async fn execute(&self, db: &Database) -> CliResult<String> {
        db.attributes().delete(&self.id).await?;
        Ok(format!("Deleted attribute {}", self.id))
    }
}
