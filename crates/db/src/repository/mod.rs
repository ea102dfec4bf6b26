//! Repository modules for database operations
//!
//! One repository per table. Paginated listings of stored entities share
//! [`fetch_page`], which pushes the pipeline's filter, count, sort and slice
//! into a single SurrealQL request.

mod attribute;
mod member;
mod organization;
mod project;
mod task;
mod user;

pub use attribute::{AttributeRepository, AttributeUpdate};
pub use member::MemberRepository;
pub use organization::OrganizationRepository;
pub use project::{ProjectRepository, ProjectUpdate};
pub use task::{TaskRepository, TaskUpdate};
pub use user::UserRepository;

use crate::error::DbResult;
use crate::listing::{SortKey, StoredListable};
use crate::pagination::{PageRequest, PageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::{Id, Thing};
use tracing::{debug, trace};

/// Extract the plain key from a SurrealDB record id.
///
/// `project:abc` yields `abc`; non-string keys fall back to their display form.
pub(crate) fn record_key(thing: &Thing) -> String {
    match &thing.id {
        Id::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format a timestamp for binding into a `<datetime>` cast
pub(crate) fn to_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Row returned by `count()` with `GROUP ALL`
#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub total: u64,
}

/// Scope, soft-delete and optional keyword predicate for a stored entity
fn list_predicate<E: StoredListable>(with_keyword: bool) -> String {
    let mut predicate = format!("{} = $scope AND is_deleted = false", E::SCOPE_FIELD);
    if with_keyword {
        let clauses: Vec<String> = E::KEYWORD_COLUMNS
            .iter()
            .map(|column| format!("string::contains({}, $keyword)", column))
            .collect();
        predicate.push_str(&format!(" AND ({})", clauses.join(" OR ")));
    }
    predicate
}

/// Run the pagination pipeline inside the store.
///
/// Issues the count and the page select in one request over the same
/// predicate, then assembles a [`PageResult`] exactly as
/// [`crate::pagination::paginate`] would for the same records.
///
/// # Errors
///
/// Returns `DbError::InvalidArgument` for a zero `page` or `page_size`, and
/// `DbError::StorageUnavailable` if the store rejects the request.
pub(crate) async fn fetch_page<E, R>(
    client: &Surreal<Db>,
    scope_id: &str,
    request: &PageRequest,
) -> DbResult<PageResult<E>>
where
    E: StoredListable,
    R: DeserializeOwned + Into<E>,
{
    let offset = request.offset()?;
    let sort: E::Sort = request.sort_key();
    let keyword = request.folded_keyword();
    let predicate = list_predicate::<E>(keyword.is_some());

    // The store takes signed 64-bit LIMIT/START values. An offset past that
    // range can only land beyond the last row, so only the count runs.
    let start = i64::try_from(offset).ok();
    let limit = i64::try_from(request.page_size).unwrap_or(i64::MAX);

    let mut query = format!(
        "SELECT count() AS total FROM {table} WHERE {predicate} GROUP ALL;",
        table = E::TABLE,
        predicate = predicate,
    );
    if start.is_some() {
        query.push_str(&format!(
            "\nSELECT * FROM {table} WHERE {predicate} ORDER BY {column} ASC, id ASC LIMIT $limit START $start;",
            table = E::TABLE,
            predicate = predicate,
            column = sort.column(),
        ));
    }

    debug!(
        "Listing {} in scope {} (page {}, size {}, sort {})",
        E::TABLE,
        scope_id,
        request.page,
        request.page_size,
        sort.as_str()
    );
    trace!("Query: {}", query);

    let mut response = client
        .query(&query)
        .bind(("scope", scope_id.to_string()))
        .bind(("keyword", keyword.unwrap_or_default()))
        .bind(("limit", limit))
        .bind(("start", start.unwrap_or(0)))
        .await?;

    let count: Option<CountRow> = response.take(0)?;
    let rows: Vec<R> = match start {
        Some(_) => response.take(1)?,
        None => Vec::new(),
    };
    let total_items = count.map(|c| c.total).unwrap_or(0);

    debug!(
        "Listed {} of {} {} rows",
        rows.len(),
        total_items,
        E::TABLE
    );

    Ok(PageResult::new(
        rows.into_iter().map(Into::into).collect(),
        request,
        total_items,
    ))
}
