//! List-query request and result types
//!
//! Every repository's `get_list` accepts the same request shape: pagination,
//! an ordered set of filters, and an ordered set of order-by columns. The
//! SQL construction lives in `db::query`; these are plain data carriers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parameters for listing entities with pagination, filtering and ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub limit: u32,
    /// Filters, applied in order
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Order-by columns, applied in order
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }
}

impl ListParams {
    /// Create new list parameters without filters or ordering.
    ///
    /// Values are taken as given; `db::query` rejects page or limit below 1
    /// when the query is built.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            filters: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Append a filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append an order-by column.
    pub fn with_order(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        ((self.page.saturating_sub(1)) * self.limit) as i64
    }
}

/// One named filter on a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Target column name
    pub column: String,
    /// How the value is matched
    pub kind: FilterKind,
    /// Value to match; empty values are skipped at query-build time
    pub value: String,
}

impl Filter {
    /// Exact-equality filter.
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: FilterKind::Eq,
            value: value.into(),
        }
    }

    /// Substring-search filter.
    pub fn search(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            kind: FilterKind::Search,
            value: value.into(),
        }
    }
}

/// How a filter value is matched against its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Exact equality
    Eq,
    /// Substring match (LIKE)
    Search,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Eq => write!(f, "eq"),
            FilterKind::Search => write!(f, "search"),
        }
    }
}

impl FromStr for FilterKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eq" => Ok(FilterKind::Eq),
            "search" => Ok(FilterKind::Search),
            _ => Err(anyhow::anyhow!("Invalid filter kind: {}", s)),
        }
    }
}

/// One order-by column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Target column name
    pub column: String,
    /// Sort direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Ascending order on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Descending order on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// Sort direction for an order-by column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl Default for OrderDirection {
    fn default() -> Self {
        Self::Asc
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "asc"),
            OrderDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for OrderDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            _ => Err(anyhow::anyhow!("Invalid order direction: {}", s)),
        }
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub limit: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        ((self.total as u32) + self.limit - 1) / self.limit
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
