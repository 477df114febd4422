//! Generic list-query construction
//!
//! Translates `ListParams` (page, limit, filters, ordering) into the SQL
//! shared by every repository list operation: a SELECT statement with
//! WHERE/ORDER BY/LIMIT/OFFSET plus a COUNT statement over exactly the same
//! predicate, so the reported total is independent of pagination.
//!
//! Filter composition: `Eq` filters are AND-combined; all `Search` filters
//! collapse into one parenthesized `LIKE` group whose terms are OR-combined,
//! and the group is AND-combined with the rest. Filters with empty values
//! are skipped. Substring matching follows the database collation.
//!
//! `page` and `limit` below 1 fail validation instead of silently producing
//! a zero offset or empty page.

use thiserror::Error;

use crate::models::{FilterKind, ListParams, OrderDirection};

/// Error building a list query
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("page must be at least 1, got {0}")]
    InvalidPage(u32),

    #[error("limit must be at least 1, got {0}")]
    InvalidLimit(u32),
}

/// A built list query.
///
/// `binds` holds the WHERE predicate values in placeholder order and is
/// shared by both statements; LIMIT and OFFSET are inlined since they are
/// validated integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Full SELECT statement for one page of rows
    pub select_sql: String,
    /// COUNT statement over the same WHERE predicate
    pub count_sql: String,
    /// Bind values for the WHERE predicate, in placeholder order
    pub binds: Vec<String>,
}

/// Build the paged SELECT and matching COUNT for `table`.
///
/// `table` and `columns` come from repository code, never from request
/// input. When no ordering is supplied rows are returned newest first
/// (`created_at DESC`).
pub fn build_list_query(
    table: &str,
    columns: &str,
    params: &ListParams,
) -> Result<ListQuery, QueryError> {
    if params.page < 1 {
        return Err(QueryError::InvalidPage(params.page));
    }
    if params.limit < 1 {
        return Err(QueryError::InvalidLimit(params.limit));
    }

    let mut predicates: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();
    let mut search_terms: Vec<String> = Vec::new();
    let mut search_binds: Vec<String> = Vec::new();

    for filter in &params.filters {
        if filter.value.is_empty() {
            continue;
        }
        match filter.kind {
            FilterKind::Eq => {
                predicates.push(format!("{} = ?", filter.column));
                binds.push(filter.value.clone());
            }
            FilterKind::Search => {
                search_terms.push(format!("{} LIKE ?", filter.column));
                search_binds.push(format!("%{}%", filter.value));
            }
        }
    }

    if !search_terms.is_empty() {
        predicates.push(format!("({})", search_terms.join(" OR ")));
        binds.extend(search_binds);
    }

    let where_clause = if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    };

    let order_clause = if params.order_by.is_empty() {
        " ORDER BY created_at DESC".to_string()
    } else {
        let terms: Vec<String> = params
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.column, direction_sql(o.direction)))
            .collect();
        format!(" ORDER BY {}", terms.join(", "))
    };

    let select_sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        columns,
        table,
        where_clause,
        order_clause,
        params.limit,
        params.offset()
    );
    let count_sql = format!("SELECT COUNT(1) as count FROM {}{}", table, where_clause);

    Ok(ListQuery {
        select_sql,
        count_sql,
        binds,
    })
}

fn direction_sql(direction: OrderDirection) -> &'static str {
    match direction {
        OrderDirection::Asc => "ASC",
        OrderDirection::Desc => "DESC",
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::models::Filter;
    use proptest::prelude::*;

    fn filter_strategy() -> impl Strategy<Value = Filter> {
        (
            "[a-z][a-z_]{0,10}",
            prop_oneof![Just(FilterKind::Eq), Just(FilterKind::Search)],
            "[a-zA-Z0-9 ]{0,12}",
        )
            .prop_map(|(column, kind, value)| Filter {
                column,
                kind,
                value,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// COUNT always carries exactly the SELECT's WHERE predicate.
        #[test]
        fn prop_count_predicate_matches_select(
            filters in prop::collection::vec(filter_strategy(), 0..6),
            page in 1u32..100,
            limit in 1u32..100,
        ) {
            let mut params = ListParams::new(page, limit);
            params.filters = filters;

            let query = build_list_query("t", "id", &params).unwrap();

            match query.count_sql.split_once(" WHERE ") {
                Some((_, predicate)) => prop_assert!(query.select_sql.contains(predicate)),
                None => prop_assert!(!query.select_sql.contains(" WHERE ")),
            }
        }

        /// One bind value per non-empty filter, no more, no less.
        #[test]
        fn prop_bind_count_matches_nonempty_filters(
            filters in prop::collection::vec(filter_strategy(), 0..6),
        ) {
            let nonempty = filters.iter().filter(|f| !f.value.is_empty()).count();
            let mut params = ListParams::default();
            params.filters = filters;

            let query = build_list_query("t", "id", &params).unwrap();
            prop_assert_eq!(query.binds.len(), nonempty);
        }

        /// OFFSET is always (page-1)*limit and LIMIT is always limit.
        #[test]
        fn prop_pagination_arithmetic(page in 1u32..1000, limit in 1u32..200) {
            let params = ListParams::new(page, limit);
            let query = build_list_query("t", "id", &params).unwrap();

            let tail = format!("LIMIT {} OFFSET {}", limit, (page - 1) as i64 * limit as i64);
            prop_assert!(query.select_sql.ends_with(&tail));
        }

        /// page or limit below 1 never builds a query.
        #[test]
        fn prop_zero_page_or_limit_rejected(page in 0u32..2, limit in 0u32..2) {
            let params = ListParams::new(page, limit);
            let result = build_list_query("t", "id", &params);

            if page < 1 || limit < 1 {
                prop_assert!(result.is_err());
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}
