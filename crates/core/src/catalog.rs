//! Catalog browsing parameters and pagination math.
//!
//! These types carry no I/O. The API crate turns a [`JerseyFilter`],
//! an optional [`SortKey`] and a [`PageRequest`] into one SQL statement.

use serde::Serialize;

use crate::types::{JerseyTypeId, LeagueId, TeamId};

/// Default page size when the caller does not pass `limit`.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Errors from validating catalog query parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogQueryError {
    #[error("page must be 1 or greater")]
    InvalidPage,
    #[error("limit cannot be negative")]
    InvalidLimit,
    #[error("unknown sort key: {0} (expected newest, price_asc or price_desc)")]
    UnknownSort(String),
}

/// Optional, independently applied jersey predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JerseyFilter {
    pub team_id: Option<TeamId>,
    /// Resolved through the jersey's team.
    pub league_id: Option<LeagueId>,
    pub jersey_type_id: Option<JerseyTypeId>,
    pub main_color: Option<String>,
    /// Free-text match on description or team name. Surrounding whitespace
    /// is ignored and a blank term means no search.
    pub search: Option<String>,
}

impl JerseyFilter {
    /// Set the free-text search term. Blank terms clear the search.
    #[must_use]
    pub fn with_search(mut self, term: Option<&str>) -> Self {
        self.search = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned);
        self
    }

    /// The trimmed search term, if any.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// `ILIKE` pattern for the search term with `%`, `_` and `\` escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for c in term.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }
}

/// Jersey listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Most recently created first.
    Newest,
    /// Cheapest current type price first.
    PriceAsc,
    /// Most expensive current type price first.
    PriceDesc,
}

impl SortKey {
    /// Parse an optional `sort_by` query value. Empty means unsorted.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogQueryError::UnknownSort`] for anything other than the
    /// three known keys.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>, CatalogQueryError> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some),
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = CatalogQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            other => Err(CatalogQueryError::UnknownSort(other.to_owned())),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Newest => write!(f, "newest"),
            Self::PriceAsc => write!(f, "price_asc"),
            Self::PriceDesc => write!(f, "price_desc"),
        }
    }
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    limit: i64,
}

impl PageRequest {
    /// Validate `page` and `limit`, applying defaults for missing values.
    ///
    /// A `limit` of zero is allowed and yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns an error when `page < 1` or `limit < 0`.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, CatalogQueryError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(CatalogQueryError::InvalidPage);
        }
        if limit < 0 {
            return Err(CatalogQueryError::InvalidLimit);
        }
        Ok(Self { page, limit })
    }

    #[must_use]
    pub const fn page(&self) -> i64 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    /// Rows to skip: `(page - 1) * limit`, saturating on overflow.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`, or 1 when the limit is zero.
    #[must_use]
    pub const fn total_pages(&self, total: i64) -> i64 {
        if self.limit <= 0 {
            1
        } else if total <= 0 {
            0
        } else {
            (total - 1) / self.limit + 1
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the totals for the whole filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(data: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            data,
            total,
            page: request.page,
            total_pages: request.total_pages(total),
        }
    }
}
