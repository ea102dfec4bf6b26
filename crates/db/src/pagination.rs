//! Paginated query pipeline
//!
//! Filters a collection down to one parent scope and its live records,
//! narrows it by an optional keyword, orders it by a recognized sort key and
//! slices out one page. The same request and result types are used by the
//! store-backed listings in [`crate::repository`].

use crate::error::{DbError, DbResult};
use crate::listing::{Listable, SortKey, compare, fold_case, in_scope, matches_keyword};
use serde::{Deserialize, Serialize};

/// Items per page when the caller does not say otherwise
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Optional substring filter
    pub keyword: Option<String>,
    /// Optional sort key name
    pub sort: Option<String>,
    /// 1-based page index
    pub page: u64,
    /// Items per page
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            keyword: None,
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Create a request for the given page
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            keyword: None,
            sort: None,
            page,
            page_size,
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    /// Reject requests that cannot address a page.
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidArgument` when `page` or `page_size` is zero.
    pub fn validate(&self) -> DbResult<()> {
        if self.page_size < 1 {
            return Err(DbError::invalid_argument("page size must be at least 1"));
        }
        if self.page < 1 {
            return Err(DbError::invalid_argument("page must be at least 1"));
        }
        Ok(())
    }

    /// Number of items skipped before this page
    ///
    /// # Errors
    ///
    /// Returns `DbError::InvalidArgument` if the request is invalid or the
    /// offset does not fit in 64 bits.
    pub fn offset(&self) -> DbResult<u64> {
        self.validate()?;
        (self.page - 1)
            .checked_mul(self.page_size)
            .ok_or_else(|| DbError::invalid_argument("page offset is too large"))
    }

    /// The keyword, folded for matching, when it is non-empty
    pub fn folded_keyword(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(fold_case)
    }

    /// Resolve the requested sort key for an entity type
    pub fn sort_key<S: SortKey>(&self) -> S {
        S::resolve(self.sort.as_deref())
    }
}

/// One page of results plus the metadata needed to render paging controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// Echo of the requested keyword
    pub keyword: Option<String>,
    /// Echo of the requested sort key, unnormalized
    pub sort: Option<String>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> PageResult<T> {
    /// Assemble a page from already-sliced items and the pre-slice count
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: u64) -> Self {
        Self {
            items,
            keyword: request.keyword.clone(),
            sort: request.sort.clone(),
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_pages(total_items, request.page_size),
        }
    }

    /// Convert every item, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            keyword: self.keyword,
            sort: self.sort,
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Page count for a result set.
///
/// Zero when there are no items, otherwise `total_items / page_size + 1`.
/// An exact multiple therefore reports one trailing empty page
/// (4 items at 2 per page gives 3 pages); existing clients rely on this count.
pub fn total_pages(total_items: u64, page_size: u64) -> u64 {
    if total_items == 0 || page_size == 0 {
        0
    } else {
        total_items / page_size + 1
    }
}

/// Run the pipeline over an in-memory collection.
///
/// Steps, in order: scope and soft-delete filter, keyword filter, sort
/// (requested key or the entity default, then id), count, slice.
///
/// # Errors
///
/// Returns `DbError::InvalidArgument` for a zero `page` or `page_size`.
pub fn paginate<E, I>(source: I, scope_id: &str, request: &PageRequest) -> DbResult<PageResult<E>>
where
    E: Listable,
    I: IntoIterator<Item = E>,
{
    let offset = request.offset()?;
    let sort: E::Sort = request.sort_key();
    let keyword = request.folded_keyword();

    let mut matching: Vec<E> = source
        .into_iter()
        .filter(|record| in_scope(record, scope_id))
        .filter(|record| match &keyword {
            Some(needle) => matches_keyword(record, needle),
            None => true,
        })
        .collect();

    matching.sort_by(|a, b| compare(a, b, sort));

    let total_items = matching.len() as u64;
    let items: Vec<E> = matching
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(request.page_size).unwrap_or(usize::MAX))
        .collect();

    Ok(PageResult::new(items, request, total_items))
}

/// Run the pipeline over a joined view.
///
/// `project` turns each raw record into its view before any filtering, so
/// the keyword and sort apply to the joined fields. A projection that cannot
/// resolve a related record should leave it absent rather than fail.
pub fn paginate_projected<R, V, I, F>(
    source: I,
    scope_id: &str,
    request: &PageRequest,
    project: F,
) -> DbResult<PageResult<V>>
where
    V: Listable,
    I: IntoIterator<Item = R>,
    F: FnMut(R) -> V,
{
    paginate(source.into_iter().map(project), scope_id, request)
}

static_assertions::assert_impl_all!(PageRequest: Send, Sync);
static_assertions::assert_impl_all!(PageResult<crate::models::Project>: Send, Sync);
