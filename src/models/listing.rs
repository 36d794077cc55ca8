use serde::{Deserialize, Serialize};

use crate::validation::{Issues, query_int};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
const SEARCH_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Saturates, so a page far past the end reads as empty instead of overflowing.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_LIMIT }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + request.limit - 1) / request.limit
        };
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages,
        }
    }
}

/// One page of rows plus the total matching the filter.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// A column a list endpoint may be sorted by.
pub trait SortField: Copy + Default {
    fn parse(raw: &str) -> Option<Self>;
    fn column(&self) -> &'static str;
    fn allowed() -> &'static [&'static str];
}

/// Validated list parameters shared by every entity, with its own filter type `F`.
#[derive(Debug, Clone)]
pub struct ListQuery<S, F> {
    pub page: PageRequest,
    pub search: Option<String>,
    pub sort: S,
    pub order: SortOrder,
    pub filter: F,
}

/// Raw query-string parameters common to every list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListParams {
    pub fn parse<S: SortField, F>(&self, issues: &mut Issues, filter: F) -> ListQuery<S, F> {
        let page = query_int(issues, "page", self.page.as_deref(), 1..=i64::MAX).unwrap_or(1);
        let limit =
            query_int(issues, "limit", self.limit.as_deref(), 1..=MAX_LIMIT).unwrap_or(DEFAULT_LIMIT);

        let search = match self.search.as_deref().map(str::trim) {
            Some(s) if s.chars().count() > SEARCH_MAX_CHARS => {
                issues.push("search", format!("{}文字以内で指定してください", SEARCH_MAX_CHARS));
                None
            }
            Some(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        };

        let sort = match self.sort.as_deref().filter(|s| !s.is_empty()) {
            None => S::default(),
            Some(raw) => S::parse(raw).unwrap_or_else(|| {
                issues.push(
                    "sort",
                    format!("次のいずれかを指定してください: {}", S::allowed().join(", ")),
                );
                S::default()
            }),
        };

        let order = match self.order.as_deref().map(|s| s.to_ascii_lowercase()) {
            None => SortOrder::Asc,
            Some(o) if o.is_empty() || o == "asc" => SortOrder::Asc,
            Some(o) if o == "desc" => SortOrder::Desc,
            Some(_) => {
                issues.push("order", "asc または desc を指定してください");
                SortOrder::Asc
            }
        };

        ListQuery {
            page: PageRequest { page, limit },
            search,
            sort,
            order,
            filter,
        }
    }
}
