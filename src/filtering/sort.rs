use sea_orm::sea_query::{Alias, Expr, Order, SimpleExpr};

use crate::errors::DataTablesError;
use crate::request::ParsedRequest;
use crate::resolver::{ColumnMap, SourceKind};

/// One `ORDER BY` term: qualified source column and direction.
#[derive(Debug, Clone)]
pub struct OrderTerm {
    pub table_alias: String,
    pub column: String,
    pub order: Order,
}

impl OrderTerm {
    #[must_use]
    pub fn expr(&self) -> SimpleExpr {
        Expr::col((Alias::new(&self.table_alias), Alias::new(&self.column))).into()
    }
}

/// Ordering terms for the request's `order[...]` directives, primary first.
///
/// Directives on request columns flagged `orderable=false` are skipped.
///
/// # Errors
///
/// - [`DataTablesError::OrderableColumnNotFound`] when the directive points
///   at a column index the request never described
/// - [`DataTablesError::ColumnNotOrderable`] when that column's data key is
///   not a declared column
/// - [`DataTablesError::CannotOrderByComputedColumn`] when the declared
///   column is computed
pub fn resolve_ordering(
    request: &ParsedRequest,
    columns: &ColumnMap,
) -> Result<Vec<OrderTerm>, DataTablesError> {
    let mut terms = Vec::with_capacity(request.order.len());

    for directive in &request.order {
        let requested = request
            .columns
            .get(&directive.column)
            .ok_or(DataTablesError::OrderableColumnNotFound {
                index: directive.column,
            })?;

        if !requested.orderable {
            tracing::debug!(column = %requested.data, "Skipping order on non-orderable column");
            continue;
        }

        let resolved = columns
            .get(&requested.data)
            .ok_or_else(|| DataTablesError::ColumnNotOrderable {
                column: requested.data.clone(),
            })?;

        let column = match &resolved.source.kind {
            SourceKind::Stored { column } => column.clone(),
            SourceKind::Computed(_) => {
                return Err(DataTablesError::CannotOrderByComputedColumn {
                    column: requested.data.clone(),
                });
            }
        };

        terms.push(OrderTerm {
            table_alias: resolved.source.table_alias.clone(),
            column,
            order: directive.direction.into(),
        });
    }

    Ok(terms)
}
