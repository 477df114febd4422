//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use serde::Deserialize;

use crate::models::{Filter, ListParams, OrderBy, OrderDirection};

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size
pub fn default_limit() -> u32 {
    10
}

/// Query parameters shared by every list endpoint.
///
/// `search` matches against the resource's searchable columns. `order_by`
/// must name one of the resource's sortable columns; anything else falls
/// back to the newest-first default.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub order: Option<OrderDirection>,
}

impl ListQuery {
    /// Translate into repository list parameters.
    ///
    /// The search term lands as one substring filter per searchable column
    /// (the query builder ORs them together). Sort columns outside
    /// `order_columns` are ignored, never interpolated into SQL.
    pub fn into_params(self, search_columns: &[&str], order_columns: &[&str]) -> ListParams {
        let mut params = ListParams::new(self.page.max(1), self.limit.max(1));

        if let Some(term) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            for column in search_columns {
                params = params.with_filter(Filter::search(*column, term));
            }
        }

        if let Some(column) = self
            .order_by
            .as_deref()
            .filter(|c| order_columns.contains(c))
        {
            params = params.with_order(match self.order.unwrap_or(OrderDirection::Desc) {
                OrderDirection::Asc => OrderBy::asc(column),
                OrderDirection::Desc => OrderBy::desc(column),
            });
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterKind;

    fn query(page: u32, limit: u32) -> ListQuery {
        ListQuery {
            page,
            limit,
            search: None,
            order_by: None,
            order: None,
        }
    }

    #[test]
    fn test_into_params_defaults() {
        let params = query(1, 10).into_params(&["name"], &["created_at"]);

        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert!(params.filters.is_empty());
        assert!(params.order_by.is_empty());
    }

    #[test]
    fn test_into_params_clamps_zero_page_and_limit() {
        let params = query(0, 0).into_params(&[], &[]);

        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 1);
    }

    #[test]
    fn test_search_spans_all_columns() {
        let mut q = query(1, 10);
        q.search = Some("coffee".to_string());

        let params = q.into_params(&["name", "address", "description"], &[]);

        assert_eq!(params.filters.len(), 3);
        assert!(params
            .filters
            .iter()
            .all(|f| f.kind == FilterKind::Search && f.value == "coffee"));
    }

    #[test]
    fn test_blank_search_dropped() {
        let mut q = query(1, 10);
        q.search = Some("   ".to_string());

        let params = q.into_params(&["name"], &[]);

        assert!(params.filters.is_empty());
    }

    #[test]
    fn test_order_by_allow_list() {
        let mut q = query(1, 10);
        q.order_by = Some("rating".to_string());

        let params = q.into_params(&[], &["created_at", "rating"]);
        assert_eq!(params.order_by.len(), 1);
        assert_eq!(params.order_by[0].column, "rating");
        assert_eq!(params.order_by[0].direction, OrderDirection::Desc);

        let mut q = query(1, 10);
        q.order_by = Some("password_hash; DROP TABLE users".to_string());

        let params = q.into_params(&[], &["created_at", "rating"]);
        assert!(params.order_by.is_empty());
    }

    #[test]
    fn test_order_direction_applied() {
        let mut q = query(1, 10);
        q.order_by = Some("name".to_string());
        q.order = Some(OrderDirection::Asc);

        let params = q.into_params(&[], &["name"]);

        assert_eq!(params.order_by[0].direction, OrderDirection::Asc);
    }
}
