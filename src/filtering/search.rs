use sea_orm::{
    Condition, DatabaseBackend,
    sea_query::{Alias, Expr, LikeExpr, SimpleExpr},
};

use crate::request::ParsedRequest;
use crate::resolver::{ColumnMap, ResolvedColumn, SourceKind};

// Basic safety limits
pub(crate) const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// Escape LIKE wildcards so a search term only ever matches literally.
/// Escapes: % (match any) and _ (match single char)
pub(crate) fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\") // Escape backslash first
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Cut a search term to [`MAX_SEARCH_QUERY_LENGTH`] bytes on a char boundary.
fn truncate(value: &str) -> &str {
    if value.len() <= MAX_SEARCH_QUERY_LENGTH {
        return value;
    }
    let mut end = MAX_SEARCH_QUERY_LENGTH;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// `table_alias.column LIKE '%value%' ESCAPE '\'`
///
/// Non-text columns are cast to text where the backend's LIKE requires it
/// (`PostgreSQL`, `MySQL`); `SQLite` compares any storage class as text.
#[must_use]
pub fn contains_condition(
    table_alias: &str,
    column: &str,
    value: &str,
    backend: DatabaseBackend,
) -> SimpleExpr {
    let column = Expr::col((Alias::new(table_alias), Alias::new(column)));
    let text: SimpleExpr = match backend {
        DatabaseBackend::Postgres => Expr::cast_as(column, Alias::new("TEXT")),
        DatabaseBackend::MySql => Expr::cast_as(column, Alias::new("CHAR")),
        DatabaseBackend::Sqlite => column.into(),
    };
    let pattern = format!("%{}%", escape_like_wildcards(truncate(value)));
    Expr::expr(text).like(LikeExpr::new(pattern).escape('\\'))
}

fn column_contains(column: &ResolvedColumn, value: &str, backend: DatabaseBackend) -> Option<SimpleExpr> {
    match &column.source.kind {
        SourceKind::Stored { column: name } => Some(contains_condition(
            &column.source.table_alias,
            name,
            value,
            backend,
        )),
        SourceKind::Computed(_) => None,
    }
}

/// Global search: OR over every declared stored column the request does not
/// mark `searchable=false`.
///
/// Returns `None` when there is no search term or no column to search.
#[must_use]
pub fn build_global_search(
    request: &ParsedRequest,
    columns: &ColumnMap,
    backend: DatabaseBackend,
) -> Option<Condition> {
    let value = request.search.as_deref()?;

    let predicates: Vec<SimpleExpr> = columns
        .iter()
        .filter(|column| {
            request
                .column_by_data(column.spec.name())
                .or_else(|| request.column_by_data(&column.spec.output_key()))
                .is_none_or(|requested| requested.searchable)
        })
        .filter_map(|column| column_contains(column, value, backend))
        .collect();

    if predicates.is_empty() {
        tracing::debug!(search = %value, "No searchable columns, global search ignored");
        return None;
    }

    Some(
        predicates
            .into_iter()
            .fold(Condition::any(), Condition::add),
    )
}

/// Per-column search: AND of one contains predicate per request column with a
/// non-empty `columns[i][search][value]`.
#[must_use]
pub fn build_column_search(
    request: &ParsedRequest,
    columns: &ColumnMap,
    backend: DatabaseBackend,
) -> Option<Condition> {
    let mut condition = Condition::all();
    let mut any = false;

    for requested in request.columns.values().filter(|column| column.searchable) {
        let Some(value) = requested.search.as_deref() else {
            continue;
        };
        let predicate = columns
            .get(&requested.data)
            .and_then(|column| column_contains(column, value, backend));
        match predicate {
            Some(predicate) => {
                condition = condition.add(predicate);
                any = true;
            }
            None => {
                tracing::debug!(column = %requested.data, "Column search on an undeclared or computed column ignored");
            }
        }
    }

    any.then_some(condition)
}
