//! Flat database rows → grid records.

use sea_orm::{DbErr, FromQueryResult, QueryResult};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::resolver::{ColumnMap, ResolvedColumn, SourceKind, marker_alias};

/// Key of the per-row metadata object
pub const ROW_METADATA_KEY: &str = "rowMetadata";

/// Alias prefix of the root entity's own columns, selected for row metadata
pub const INSTANCE_PREFIX: &str = "r_";

/// Computes one metadata entry from the row's root entity instance.
pub type RowDataProducer<M> = Arc<dyn Fn(&M) -> Value + Send + Sync>;

/// One fetched row: the aliased grid values and, when its columns were
/// selected, the root entity instance.
#[derive(Debug, Clone)]
pub struct GridRow<M> {
    pub values: Value,
    pub instance: Option<M>,
}

impl<M: FromQueryResult> FromQueryResult for GridRow<M> {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            values: Value::from_query_result(res, pre)?,
            instance: M::from_query_result_optional(res, &format!("{pre}{INSTANCE_PREFIX}"))?,
        })
    }
}

fn field(row: &Value, alias: &str) -> Value {
    row.get(alias).cloned().unwrap_or(Value::Null)
}

/// A hop is absent when its joined primary key came back NULL.
fn relation_absent(row: &Value, column: &ResolvedColumn) -> bool {
    column
        .source
        .hops
        .iter()
        .any(|&hop| matches!(row.get(marker_alias(hop)), Some(Value::Null)))
}

fn column_value(row: &Value, column: &ResolvedColumn) -> Value {
    if relation_absent(row, column) {
        return Value::String(String::new());
    }
    let raw = match &column.source.kind {
        SourceKind::Stored { .. } => field(row, &column.value_alias),
        SourceKind::Computed(computed) => {
            let inputs: Vec<Value> = (0..computed.inputs.len())
                .map(|index| field(row, &column.input_alias(index)))
                .collect();
            (computed.compute)(&inputs)
        }
    };
    column.spec.apply(raw)
}

/// Build the output record of one row.
///
/// Keys are the columns' output keys; a column whose relationship chain is
/// broken on this row gets `""` with no transform applied. When producers are
/// registered, they run on the row's instance and their results are nested
/// under [`ROW_METADATA_KEY`].
#[must_use]
pub fn project<M>(
    row: &GridRow<M>,
    columns: &ColumnMap,
    row_data: &[(String, RowDataProducer<M>)],
) -> Map<String, Value> {
    let mut record: Map<String, Value> = columns
        .iter()
        .map(|column| (column.spec.output_key(), column_value(&row.values, column)))
        .collect();

    if !row_data.is_empty() {
        let metadata: Map<String, Value> = row_data
            .iter()
            .map(|(name, producer)| {
                let value = row.instance.as_ref().map_or(Value::Null, |instance| producer(instance));
                (name.clone(), value)
            })
            .collect();
        record.insert(ROW_METADATA_KEY.to_string(), Value::Object(metadata));
    }

    record
}
