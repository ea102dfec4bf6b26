//! Per-entity listing rules for the paginated query pipeline
//!
//! Each listable entity declares its parent scope, the string fields a
//! keyword is matched against, and a closed set of sort keys with a default.
//! Stored entities additionally describe how those rules map onto SurrealQL.

use crate::models::{Deletable, Project, ProjectMember, ProjectMemberView, Task};
use std::cmp::Ordering;
use std::fmt::Debug;
use tracing::debug;

/// A closed enumeration of the sort keys an entity recognizes.
///
/// Every key sorts ascending. `Default` is the entity's default sort and is
/// used whenever the requested key is absent or unrecognized.
pub trait SortKey: Copy + Default + Debug + PartialEq + 'static {
    /// Every recognized key
    const ALL: &'static [Self];

    /// Canonical name of the key as accepted from callers
    fn as_str(&self) -> &'static str;

    /// Field the key orders by in the store
    fn column(&self) -> &'static str;

    /// Parse a key, ignoring case, `_` and `-`.
    fn parse(raw: &str) -> Option<Self> {
        let wanted = normalize_sort_key(raw);
        Self::ALL
            .iter()
            .copied()
            .find(|key| normalize_sort_key(key.as_str()) == wanted)
    }

    /// Resolve an optional raw key, falling back to the default.
    fn resolve(raw: Option<&str>) -> Self {
        match raw.filter(|r| !r.is_empty()) {
            None => Self::default(),
            Some(r) => Self::parse(r).unwrap_or_else(|| {
                debug!("Unrecognized sort key '{}', using default", r);
                Self::default()
            }),
        }
    }
}

fn normalize_sort_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// An entity that can be listed through the pipeline
pub trait Listable: Deletable {
    type Sort: SortKey;

    /// Identifier used as the final tie-break of every sort
    fn id(&self) -> &str;

    /// Identifier of the owning parent (organization or project)
    fn scope_id(&self) -> &str;

    /// String fields a keyword is matched against (logical OR)
    fn keyword_fields(&self) -> Vec<&str>;

    /// Compare two records by the given key, without the id tie-break
    fn compare_by(&self, other: &Self, sort: Self::Sort) -> Ordering;
}

/// A listable entity backed by a table in the store
pub trait StoredListable: Listable {
    /// Table name
    const TABLE: &'static str;

    /// Field holding the parent scope id
    const SCOPE_FIELD: &'static str;

    /// SurrealQL expressions yielding the lowercased keyword fields
    const KEYWORD_COLUMNS: &'static [&'static str];

    /// Entity name used in error messages
    const ENTITY: &'static str;
}

/// Shared soft-delete predicate
pub fn is_live<T: Deletable + ?Sized>(record: &T) -> bool {
    !record.is_deleted()
}

/// Scope filter and soft-delete filter combined
pub fn in_scope<T: Listable>(record: &T, scope_id: &str) -> bool {
    record.scope_id() == scope_id && is_live(record)
}

/// Fold a keyword (or field) for case-insensitive matching
pub fn fold_case(raw: &str) -> String {
    raw.to_lowercase()
}

/// Whether any keyword field contains the already-folded needle
pub fn matches_keyword<T: Listable>(record: &T, folded_needle: &str) -> bool {
    record
        .keyword_fields()
        .into_iter()
        .any(|field| fold_case(field).contains(folded_needle))
}

/// Total order used by the pipeline: the requested key, then id
pub fn compare<T: Listable>(a: &T, b: &T, sort: T::Sort) -> Ordering {
    a.compare_by(b, sort).then_with(|| a.id().cmp(b.id()))
}

/// Sort keys for projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectSort {
    #[default]
    Name,
    Created,
    DisplayOrder,
}

impl SortKey for ProjectSort {
    const ALL: &'static [Self] = &[Self::Name, Self::Created, Self::DisplayOrder];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Created => "created",
            Self::DisplayOrder => "display_order",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Created => "created_at",
            Self::DisplayOrder => "display_order",
        }
    }
}

/// Sort keys for project members (raw and joined)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberSort {
    #[default]
    Created,
    MembershipType,
}

impl SortKey for MemberSort {
    const ALL: &'static [Self] = &[Self::Created, Self::MembershipType];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::MembershipType => "membership_type",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Created => "created_at",
            Self::MembershipType => "membership_type",
        }
    }
}

/// Sort keys for tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskSort {
    #[default]
    Created,
    Title,
    Updated,
}

impl SortKey for TaskSort {
    const ALL: &'static [Self] = &[Self::Created, Self::Title, Self::Updated];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Title => "title",
            Self::Updated => "updated",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Created => "created_at",
            Self::Title => "title",
            Self::Updated => "updated_at",
        }
    }
}

impl Listable for Project {
    type Sort = ProjectSort;

    fn id(&self) -> &str {
        &self.id
    }

    fn scope_id(&self) -> &str {
        &self.owner_id
    }

    fn keyword_fields(&self) -> Vec<&str> {
        vec![self.id.as_str(), self.name.as_str()]
    }

    fn compare_by(&self, other: &Self, sort: ProjectSort) -> Ordering {
        match sort {
            ProjectSort::Name => self.name.cmp(&other.name),
            ProjectSort::Created => self.created_at.cmp(&other.created_at),
            ProjectSort::DisplayOrder => self.display_order.cmp(&other.display_order),
        }
    }
}

impl StoredListable for Project {
    const TABLE: &'static str = "project";
    const SCOPE_FIELD: &'static str = "owner_id";
    const KEYWORD_COLUMNS: &'static [&'static str] = &[
        "string::lowercase(<string> record::id(id))",
        "string::lowercase(name)",
    ];
    const ENTITY: &'static str = "Project";
}

impl Listable for ProjectMember {
    type Sort = MemberSort;

    fn id(&self) -> &str {
        &self.id
    }

    fn scope_id(&self) -> &str {
        &self.project_id
    }

    fn keyword_fields(&self) -> Vec<&str> {
        vec![self.user_id.as_str(), self.membership_type.as_str()]
    }

    fn compare_by(&self, other: &Self, sort: MemberSort) -> Ordering {
        match sort {
            MemberSort::Created => self.created_at.cmp(&other.created_at),
            MemberSort::MembershipType => self
                .membership_type
                .as_str()
                .cmp(other.membership_type.as_str()),
        }
    }
}

impl StoredListable for ProjectMember {
    const TABLE: &'static str = "project_member";
    const SCOPE_FIELD: &'static str = "project_id";
    const KEYWORD_COLUMNS: &'static [&'static str] = &[
        "string::lowercase(user_id)",
        "string::lowercase(membership_type)",
    ];
    const ENTITY: &'static str = "Project member";
}

impl Listable for ProjectMemberView {
    type Sort = MemberSort;

    fn id(&self) -> &str {
        &self.id
    }

    fn scope_id(&self) -> &str {
        &self.project_id
    }

    fn keyword_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.user_id.as_str()];
        if let Some(user) = &self.user {
            fields.push(&user.display_name);
            if let Some(email) = &user.email {
                fields.push(email);
            }
        }
        fields
    }

    fn compare_by(&self, other: &Self, sort: MemberSort) -> Ordering {
        match sort {
            MemberSort::Created => self.created_at.cmp(&other.created_at),
            MemberSort::MembershipType => self
                .membership_type
                .as_str()
                .cmp(other.membership_type.as_str()),
        }
    }
}

impl Listable for Task {
    type Sort = TaskSort;

    fn id(&self) -> &str {
        &self.id
    }

    fn scope_id(&self) -> &str {
        &self.project_id
    }

    fn keyword_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str(), self.title.as_str()];
        if let Some(description) = &self.description {
            fields.push(description);
        }
        fields
    }

    fn compare_by(&self, other: &Self, sort: TaskSort) -> Ordering {
        match sort {
            TaskSort::Created => self.created_at.cmp(&other.created_at),
            TaskSort::Title => self.title.cmp(&other.title),
            // Never-updated tasks sort first, as NONE does in the store
            TaskSort::Updated => self.updated_at.cmp(&other.updated_at),
        }
    }
}

impl StoredListable for Task {
    const TABLE: &'static str = "task";
    const SCOPE_FIELD: &'static str = "project_id";
    const KEYWORD_COLUMNS: &'static [&'static str] = &[
        "string::lowercase(<string> record::id(id))",
        "string::lowercase(title)",
        "string::lowercase(description ?? \"\")",
    ];
    const ENTITY: &'static str = "Task";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MembershipType, UserProfile};
    use chrono::{Duration, Utc};

    #[test]
    fn test_sort_key_parse_ignores_case_and_separators() {
        assert_eq!(ProjectSort::parse("name"), Some(ProjectSort::Name));
        assert_eq!(ProjectSort::parse("NAME"), Some(ProjectSort::Name));
        assert_eq!(
            ProjectSort::parse("display_order"),
            Some(ProjectSort::DisplayOrder)
        );
        assert_eq!(
            ProjectSort::parse("displayOrder"),
            Some(ProjectSort::DisplayOrder)
        );
        assert_eq!(
            ProjectSort::parse("display-order"),
            Some(ProjectSort::DisplayOrder)
        );
        assert_eq!(
            MemberSort::parse("MembershipType"),
            Some(MemberSort::MembershipType)
        );
    }

    #[test]
    fn test_sort_key_parse_rejects_unknown() {
        assert_eq!(ProjectSort::parse("priority"), None);
        assert_eq!(TaskSort::parse(""), None);
    }

    #[test]
    fn test_sort_key_resolve_falls_back_to_default() {
        assert_eq!(ProjectSort::resolve(None), ProjectSort::Name);
        assert_eq!(ProjectSort::resolve(Some("")), ProjectSort::Name);
        assert_eq!(ProjectSort::resolve(Some("bogus")), ProjectSort::Name);
        assert_eq!(ProjectSort::resolve(Some("created")), ProjectSort::Created);
        assert_eq!(MemberSort::resolve(None), MemberSort::Created);
        assert_eq!(TaskSort::resolve(Some("Title")), TaskSort::Title);
    }

    #[test]
    fn test_every_sort_key_parses_its_own_name() {
        for key in ProjectSort::ALL {
            assert_eq!(ProjectSort::parse(key.as_str()), Some(*key));
        }
        for key in MemberSort::ALL {
            assert_eq!(MemberSort::parse(key.as_str()), Some(*key));
        }
        for key in TaskSort::ALL {
            assert_eq!(TaskSort::parse(key.as_str()), Some(*key));
        }
    }

    #[test]
    fn test_in_scope_requires_owner_and_live() {
        let mut project = Project::new("p1", "org1", "AbCd1234", "Alpha");
        assert!(in_scope(&project, "org1"));
        assert!(!in_scope(&project, "org2"));

        project.is_deleted = true;
        assert!(!in_scope(&project, "org1"));
    }

    #[test]
    fn test_matches_keyword_is_case_insensitive() {
        let project = Project::new("prj-001", "org1", "AbCd1234", "Project Alpha");
        assert!(matches_keyword(&project, &fold_case("ALPHA")));
        assert!(matches_keyword(&project, &fold_case("oj")));
        assert!(matches_keyword(&project, &fold_case("PRJ-0")));
        assert!(!matches_keyword(&project, &fold_case("beta")));
    }

    #[test]
    fn test_task_keyword_includes_description() {
        let task = Task::new("t1", "p1", "Refactor").with_description("Touches the Parser");
        assert!(matches_keyword(&task, "parser"));

        let bare = Task::new("t2", "p1", "Refactor");
        assert!(!matches_keyword(&bare, "parser"));
    }

    #[test]
    fn test_member_view_keyword_uses_profile_fields() {
        let member = ProjectMember::new("m1", "p1", "u1", MembershipType::Member);
        let profile = UserProfile::new("u1", "Grace Hopper").with_email("grace@navy.mil");
        let view = ProjectMemberView::new(member.clone(), Some(profile));
        assert!(matches_keyword(&view, "hopper"));
        assert!(matches_keyword(&view, "navy"));

        let orphan = ProjectMemberView::new(member, None);
        assert!(!matches_keyword(&orphan, "hopper"));
        assert!(matches_keyword(&orphan, "u1"));
    }

    #[test]
    fn test_compare_breaks_ties_by_id() {
        let a = Project::new("a", "org1", "AAAAAAAA", "Same");
        let b = Project::new("b", "org1", "BBBBBBBB", "Same");
        assert_eq!(compare(&a, &b, ProjectSort::Name), Ordering::Less);
        assert_eq!(compare(&b, &a, ProjectSort::Name), Ordering::Greater);
        assert_eq!(compare(&a, &a, ProjectSort::Name), Ordering::Equal);
    }

    #[test]
    fn test_task_updated_sort_puts_never_updated_first() {
        let mut older = Task::new("t1", "p1", "one");
        older.updated_at = Some(Utc::now());
        let never = Task::new("t2", "p1", "two");
        assert_eq!(compare(&never, &older, TaskSort::Updated), Ordering::Less);

        let mut newer = Task::new("t3", "p1", "three");
        newer.updated_at = older.updated_at.map(|t| t + Duration::seconds(5));
        assert_eq!(compare(&older, &newer, TaskSort::Updated), Ordering::Less);
    }
}
