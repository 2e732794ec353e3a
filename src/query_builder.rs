//! Builds the relational query for one grid request.
//!
//! [`prepare`] is pure: it turns a base [`Select`], the resolved columns, the
//! join plan and the request into the two statements needed for one page.
//! [`build`] runs the counts and hands back the windowed statement.
//!
//! The selected row is flat. Each declared column's value is aliased `c{i}`,
//! the inputs of a computed column `c{i}_{k}`, and the primary key of every
//! joined table `j{n}` so an absent relation can be told apart from a NULL
//! value.

use sea_orm::{
    ConnectionTrait, DatabaseBackend, EntityName, EntityTrait, IdenStatic, Iterable, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select,
    sea_query::{Alias, Expr, IntoIden, SimpleExpr, TableRef},
};

use crate::errors::DataTablesError;
use crate::filtering::{
    PageWindow, ResolvedFilter, build_column_search, build_global_search, page_window,
    resolve_ordering,
};
use crate::projection::INSTANCE_PREFIX;
use crate::request::ParsedRequest;
use crate::resolver::{ColumnMap, JoinPlan, SourceKind, marker_alias};
use crate::table::DataTableOptions;

fn column_ref(table_alias: &str, column: &str) -> SimpleExpr {
    Expr::col((Alias::new(table_alias), Alias::new(column))).into()
}

/// Statements for one page of a grid.
#[derive(Debug, Clone)]
pub struct PreparedQuery<E: EntityTrait> {
    /// Base query with joins, projection and the `q` filter
    pub unfiltered: Select<E>,
    /// `unfiltered` plus search predicates and ordering
    pub filtered: Select<E>,
    pub window: PageWindow,
}

/// Stand-in for "no limit" when an offset is needed; SQLite rejects a bare `OFFSET`.
const UNBOUNDED_LIMIT: u64 = u64::MAX >> 1;

impl<E: EntityTrait> PreparedQuery<E> {
    /// `filtered` restricted to the page window
    #[must_use]
    pub fn paginated(&self) -> Select<E> {
        let query = self.filtered.clone();
        match (self.window.offset, self.window.limit) {
            (0, None) => query,
            (offset, None) => query.offset(offset).limit(UNBOUNDED_LIMIT),
            (offset, Some(limit)) => query.offset(offset).limit(limit),
        }
    }

    /// Also select every column of the root entity under [`INSTANCE_PREFIX`],
    /// so rows can be read back as `E::Model`.
    #[must_use]
    pub fn with_instance(mut self) -> Self {
        let table = E::default().table_name().to_string();
        for column in E::Column::iter() {
            let name = column.as_str();
            self.filtered = self
                .filtered
                .column_as(column_ref(&table, name), format!("{INSTANCE_PREFIX}{name}"));
        }
        self
    }
}

/// Counts and windowed statement of a prepared query.
#[derive(Debug, Clone)]
pub struct BuiltQuery<E: EntityTrait> {
    pub query: Select<E>,
    /// Rows of the joined base query (after `q`, before search). Joins are
    /// not collapsed, so a to-many relation counts each joined row.
    pub records_total: u64,
    /// Rows after search, before paging
    pub records_filtered: u64,
}

fn apply_joins<E: EntityTrait>(mut query: Select<E>, plan: JoinPlan) -> Select<E> {
    for (index, join) in plan.into_joins().into_iter().enumerate() {
        let alias = join.alias().to_string();
        let from_alias = join.from_alias().to_string();
        let marker = join.marker_column().map(str::to_string);

        let mut def = join.into_def();
        def.from_tbl = TableRef::Table(Alias::new(&from_alias).into_iden());
        query = query.join_as(JoinType::LeftJoin, def, Alias::new(&alias));

        if let Some(marker) = marker {
            query = query.column_as(column_ref(&alias, &marker), marker_alias(index));
        }
    }
    query
}

fn apply_projection<E: EntityTrait>(mut query: Select<E>, columns: &ColumnMap) -> Select<E> {
    for column in columns.iter() {
        let table_alias = &column.source.table_alias;
        match &column.source.kind {
            SourceKind::Stored { column: name } => {
                query = query.column_as(column_ref(table_alias, name), column.value_alias.as_str());
            }
            SourceKind::Computed(computed) => {
                for (index, input) in computed.inputs.iter().enumerate() {
                    query = query.column_as(column_ref(table_alias, input), column.input_alias(index));
                }
            }
        }
    }
    query
}

/// Assemble the statements for `request` on top of `base`.
///
/// # Errors
///
/// Ordering errors from [`resolve_ordering`].
pub fn prepare<E: EntityTrait>(
    base: Select<E>,
    columns: &ColumnMap,
    plan: JoinPlan,
    filter: Option<&ResolvedFilter>,
    request: &ParsedRequest,
    options: &DataTableOptions,
    backend: DatabaseBackend,
) -> Result<PreparedQuery<E>, DataTablesError> {
    let ordering = resolve_ordering(request, columns)?;

    let nothing_selected = columns.is_empty() && plan.is_empty();
    let mut query = apply_joins(base.select_only(), plan);
    query = apply_projection(query, columns);
    if nothing_selected {
        query = query.column_as(Expr::value(1), "c");
    }
    if let Some(condition) = filter.and_then(|filter| filter.condition(backend)) {
        query = query.filter(condition);
    }

    let unfiltered = query.clone();

    if let Some(condition) = build_global_search(request, columns, backend) {
        query = query.filter(condition);
    }
    if let Some(condition) = build_column_search(request, columns, backend) {
        query = query.filter(condition);
    }
    for term in &ordering {
        query = query.order_by(term.expr(), term.order.clone());
    }

    Ok(PreparedQuery {
        unfiltered,
        filtered: query,
        window: page_window(request, options.max_page_length),
    })
}

/// Count both statements and return the windowed one.
///
/// # Errors
///
/// [`DataTablesError::Database`] when a count fails.
pub async fn build<E, C>(db: &C, prepared: PreparedQuery<E>) -> Result<BuiltQuery<E>, DataTablesError>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    let query = prepared.paginated();
    tracing::debug!(sql = %query.build(backend), "DataTables query");

    let records_total = prepared.unfiltered.count(db).await?;
    let records_filtered = prepared.filtered.count(db).await?;

    Ok(BuiltQuery {
        query,
        records_total,
        records_filtered,
    })
}
