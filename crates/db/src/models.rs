//! Data models for Backlog project tracking
//!
//! Defines Rust types that map to the SurrealDB schema for organizations,
//! user profiles, projects, memberships, tasks and task attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Soft-delete capability shared by every stored record.
///
/// Records are never physically removed; a deleted record keeps its data and
/// is hidden from every query by [`crate::listing::is_live`].
pub trait Deletable {
    /// Whether the record has been soft-deleted
    fn is_deleted(&self) -> bool;

    /// When the record was soft-deleted, if it was
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
}

macro_rules! impl_deletable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Deletable for $ty {
                fn is_deleted(&self) -> bool {
                    self.is_deleted
                }

                fn deleted_at(&self) -> Option<DateTime<Utc>> {
                    self.deleted_at
                }
            }
        )+
    };
}

impl_deletable!(
    Organization,
    UserProfile,
    Project,
    ProjectMember,
    Task,
    TaskAttribute
);

/// Role a user holds inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipType {
    Manager,
    Member,
    Guest,
}

impl MembershipType {
    /// All membership types, in the order they are offered to users
    pub const ALL: [MembershipType; 3] = [
        MembershipType::Manager,
        MembershipType::Member,
        MembershipType::Guest,
    ];

    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Manager => "manager",
            MembershipType::Member => "member",
            MembershipType::Guest => "guest",
        }
    }

    /// Parse a stored membership type string
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for MembershipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of per-project task metadata
///
/// Statuses, types, categories, milestones and versions share one shape
/// (name, display order, optional color) and one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Status,
    Type,
    Category,
    Milestone,
    Version,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 5] = [
        AttributeKind::Status,
        AttributeKind::Type,
        AttributeKind::Category,
        AttributeKind::Milestone,
        AttributeKind::Version,
    ];

    /// Returns the string representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Status => "status",
            AttributeKind::Type => "type",
            AttributeKind::Category => "category",
            AttributeKind::Milestone => "milestone",
            AttributeKind::Version => "version",
        }
    }

    /// Parse a stored attribute kind string
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level tenant owning projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Organization {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_at: Utc::now(),
            is_deleted: false,
            deleted_at: None,
        }
    }
}

/// Profile of a user as known to the identity store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: None,
            is_suspended: false,
            created_at: Utc::now(),
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Set the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Mark the user as suspended
    pub fn suspended(mut self) -> Self {
        self.is_suspended = true;
        self
    }
}

/// A project owned by one organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: String,

    /// Owning organization id
    pub owner_id: String,

    /// Short handle, unique within the owning organization
    pub perma_name: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub display_order: i64,

    /// Optimistic concurrency counter, bumped on every update
    #[serde(default)]
    pub revision: u64,

    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_deleted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create a new project with required fields
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        perma_name: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            perma_name: perma_name.into(),
            name: name.into(),
            description: None,
            display_order: 0,
            revision: 0,
            created_at: Utc::now(),
            updated_at: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_display_order(mut self, display_order: i64) -> Self {
        self.display_order = display_order;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Membership of a user in a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub membership_type: MembershipType,
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProjectMember {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        membership_type: MembershipType,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            membership_type,
            revision: 0,
            created_at: Utc::now(),
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// A membership joined with the member's user profile.
///
/// `user` is `None` when the profile could not be resolved; the membership
/// itself is still listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMemberView {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub user: Option<UserProfile>,
    pub membership_type: MembershipType,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProjectMemberView {
    /// Join a membership with its (possibly missing) user profile
    pub fn new(member: ProjectMember, user: Option<UserProfile>) -> Self {
        Self {
            id: member.id,
            project_id: member.project_id,
            user_id: member.user_id,
            user,
            membership_type: member.membership_type,
            created_at: member.created_at,
            is_deleted: member.is_deleted,
            deleted_at: member.deleted_at,
        }
    }

    /// Display name of the member, falling back to the raw user id
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.display_name.as_str())
            .unwrap_or(&self.user_id)
    }
}

impl_deletable!(ProjectMemberView);

/// A task inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Id of a `status` task attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_id: Option<String>,
    /// Id of the assigned user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task with required fields
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            title: title.into(),
            description: None,
            status_id: None,
            assignee_id: None,
            revision: 0,
            created_at: Utc::now(),
            updated_at: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status_id: impl Into<String>) -> Self {
        self.status_id = Some(status_id.into());
        self
    }

    pub fn with_assignee(mut self, assignee_id: impl Into<String>) -> Self {
        self.assignee_id = Some(assignee_id.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Per-project task metadata entry (status, type, category, milestone, version)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAttribute {
    pub id: String,
    pub project_id: String,
    pub kind: AttributeKind,
    pub name: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TaskAttribute {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        kind: AttributeKind,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            kind,
            name: name.into(),
            display_order: 0,
            color: None,
            created_at: Utc::now(),
            is_deleted: false,
            deleted_at: None,
        }
    }

    pub fn with_display_order(mut self, display_order: i64) -> Self {
        self.display_order = display_order;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}
