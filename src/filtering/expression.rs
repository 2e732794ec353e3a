//! Structured `q` filter expressions.
//!
//! ```json
//! {"filters": [{"name": "address__city__name", "op": "eq", "val": "Paris"},
//!              {"name": "id", "op": "in", "val": [1, 2, 3]}],
//!  "disjunction": false}
//! ```
//!
//! Field names follow the same relationship paths as display columns, with
//! either `.` or `__` between hops. Relations they traverse are joined
//! through the same plan as the display columns, so a filter on
//! `address.city.name` reuses the join a displayed `address.city.name`
//! already needs.

use sea_orm::{
    Condition, DatabaseBackend, Value,
    sea_query::{Alias, Expr, SimpleExpr},
};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::search::contains_condition;
use crate::columns::{KEY_SEPARATOR, PATH_SEPARATOR};
use crate::errors::DataTablesError;
use crate::resolver::{JoinPlan, SourceKind, resolve_path};
use crate::schema::EntityRef;

/// Comparison operators accepted in a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equality (=)
    Eq,
    /// Not equal (!=)
    Neq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// LIKE with a caller supplied pattern
    Like,
    /// Escaped substring match, same as the grid search
    Contains,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    /// Parse an operator name or symbol (`eq`, `==`, `gte`, `>=`, `has`, ...).
    #[must_use]
    pub fn parse(op: &str) -> Option<Self> {
        let op = op.trim().to_ascii_lowercase();
        Some(match op.as_str() {
            "eq" | "==" | "=" | "equals" => Self::Eq,
            "neq" | "ne" | "!=" | "not_equal_to" => Self::Neq,
            "gt" | ">" => Self::Gt,
            "ge" | "gte" | ">=" => Self::Gte,
            "lt" | "<" => Self::Lt,
            "le" | "lte" | "<=" => Self::Lte,
            "like" => Self::Like,
            "has" | "contains" => Self::Contains,
            "in" => Self::In,
            "not_in" => Self::NotIn,
            "is_null" => Self::IsNull,
            "is_not_null" => Self::IsNotNull,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawClause {
    name: String,
    op: String,
    #[serde(default)]
    val: JsonValue,
}

#[derive(Debug, Clone, Deserialize)]
struct RawExpression {
    #[serde(default)]
    filters: Vec<RawClause>,
    #[serde(default)]
    disjunction: bool,
}

/// An operator together with the operand shape it takes.
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Like(String),
    Contains(String),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    IsNull,
    IsNotNull,
}

impl Predicate {
    fn operator(&self) -> FilterOperator {
        match self {
            Self::Eq(_) => FilterOperator::Eq,
            Self::Neq(_) => FilterOperator::Neq,
            Self::Gt(_) => FilterOperator::Gt,
            Self::Gte(_) => FilterOperator::Gte,
            Self::Lt(_) => FilterOperator::Lt,
            Self::Lte(_) => FilterOperator::Lte,
            Self::Like(_) => FilterOperator::Like,
            Self::Contains(_) => FilterOperator::Contains,
            Self::In(_) => FilterOperator::In,
            Self::NotIn(_) => FilterOperator::NotIn,
            Self::IsNull => FilterOperator::IsNull,
            Self::IsNotNull => FilterOperator::IsNotNull,
        }
    }
}

/// One validated clause, not yet bound to the entity graph.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    path: Vec<String>,
    predicate: Predicate,
}

impl FilterClause {
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    #[must_use]
    pub fn operator(&self) -> FilterOperator {
        self.predicate.operator()
    }
}

/// A decoded `q` expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    clauses: Vec<FilterClause>,
    disjunction: bool,
}

fn scalar(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::String(text) => Some(text.clone().into()),
        JsonValue::Bool(flag) => Some((*flag).into()),
        JsonValue::Number(number) => number
            .as_i64()
            .map(Value::from)
            .or_else(|| number.as_f64().map(Value::from)),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

fn split_name(name: &str) -> Vec<String> {
    name.replace(KEY_SEPARATOR, &PATH_SEPARATOR.to_string())
        .split(PATH_SEPARATOR)
        .map(str::to_string)
        .collect()
}

impl FilterClause {
    fn from_raw(raw: RawClause) -> Result<Self, DataTablesError> {
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(DataTablesError::invalid_filter("Filter clause without a field name"));
        }
        let path = split_name(name);
        if path.iter().any(String::is_empty) {
            return Err(DataTablesError::invalid_filter(format!("Invalid field name {name}")));
        }

        let operator = FilterOperator::parse(&raw.op)
            .ok_or_else(|| DataTablesError::invalid_filter(format!("Unknown operator {}", raw.op)))?;
        let mismatch = || {
            DataTablesError::invalid_filter(format!("Invalid value for {name} with operator {}", raw.op))
        };
        let value = || scalar(&raw.val).ok_or_else(mismatch);
        let text = || raw.val.as_str().map(str::to_string).ok_or_else(mismatch);
        let list = || {
            raw.val
                .as_array()
                .and_then(|items| items.iter().map(scalar).collect::<Option<Vec<_>>>())
                .ok_or_else(mismatch)
        };

        let predicate = match operator {
            // Comparing to null is a null test
            FilterOperator::Eq if raw.val.is_null() => Predicate::IsNull,
            FilterOperator::Neq if raw.val.is_null() => Predicate::IsNotNull,
            FilterOperator::Eq => Predicate::Eq(value()?),
            FilterOperator::Neq => Predicate::Neq(value()?),
            FilterOperator::Gt => Predicate::Gt(value()?),
            FilterOperator::Gte => Predicate::Gte(value()?),
            FilterOperator::Lt => Predicate::Lt(value()?),
            FilterOperator::Lte => Predicate::Lte(value()?),
            FilterOperator::Like => Predicate::Like(text()?),
            FilterOperator::Contains => Predicate::Contains(text()?),
            FilterOperator::In => Predicate::In(list()?),
            FilterOperator::NotIn => Predicate::NotIn(list()?),
            FilterOperator::IsNull => Predicate::IsNull,
            FilterOperator::IsNotNull => Predicate::IsNotNull,
        };

        Ok(Self { path, predicate })
    }
}

impl FilterExpression {
    /// Decode the raw JSON blob of the `q` parameter.
    ///
    /// # Errors
    ///
    /// [`DataTablesError::InvalidFilterExpression`] when the blob is not a
    /// filter object, names an unknown operator, or carries a value of the
    /// wrong shape for its operator.
    pub fn parse(raw: &str) -> Result<Self, DataTablesError> {
        let decoded: RawExpression = serde_json::from_str(raw).map_err(|e| {
            DataTablesError::invalid_filter(format!("Unable to decode filter expression: {e}"))
        })?;
        let clauses = decoded
            .filters
            .into_iter()
            .map(FilterClause::from_raw)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            clauses,
            disjunction: decoded.disjunction,
        })
    }

    #[must_use]
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    #[must_use]
    pub fn is_disjunction(&self) -> bool {
        self.disjunction
    }

    /// Bind every clause to a source column, extending `plan` with the
    /// relations the clauses traverse.
    ///
    /// # Errors
    ///
    /// [`DataTablesError::InvalidFilterExpression`] when a name does not
    /// resolve to a stored column.
    pub fn resolve(
        self,
        root: EntityRef,
        plan: JoinPlan,
    ) -> Result<(ResolvedFilter, JoinPlan), DataTablesError> {
        let (clauses, plan) = self.clauses.into_iter().try_fold(
            (Vec::new(), plan),
            |(mut clauses, plan), clause| {
                let (source, plan) = resolve_path(&clause.path, root, plan)
                    .map_err(|e| DataTablesError::invalid_filter(e.user_message()))?;
                let column = match source.kind {
                    SourceKind::Stored { column } => column,
                    SourceKind::Computed(_) => {
                        return Err(DataTablesError::invalid_filter(format!(
                            "Cannot filter on computed field {}",
                            source.path
                        )));
                    }
                };
                clauses.push(ResolvedClause {
                    table_alias: source.table_alias,
                    column,
                    predicate: clause.predicate,
                });
                Ok((clauses, plan))
            },
        )?;

        Ok((
            ResolvedFilter {
                clauses,
                disjunction: self.disjunction,
            },
            plan,
        ))
    }
}

#[derive(Debug, Clone)]
struct ResolvedClause {
    table_alias: String,
    column: String,
    predicate: Predicate,
}

impl ResolvedClause {
    fn predicate(&self, backend: DatabaseBackend) -> SimpleExpr {
        let column = Expr::col((Alias::new(&self.table_alias), Alias::new(&self.column)));
        match &self.predicate {
            Predicate::Eq(value) => column.eq(value.clone()),
            Predicate::Neq(value) => column.ne(value.clone()),
            Predicate::Gt(value) => column.gt(value.clone()),
            Predicate::Gte(value) => column.gte(value.clone()),
            Predicate::Lt(value) => column.lt(value.clone()),
            Predicate::Lte(value) => column.lte(value.clone()),
            Predicate::Like(pattern) => column.like(pattern.clone()),
            Predicate::Contains(text) => {
                contains_condition(&self.table_alias, &self.column, text, backend)
            }
            Predicate::In(values) => column.is_in(values.clone()),
            Predicate::NotIn(values) => column.is_not_in(values.clone()),
            Predicate::IsNull => column.is_null(),
            Predicate::IsNotNull => column.is_not_null(),
        }
    }
}

/// A filter expression bound to qualified source columns.
#[derive(Debug, Clone)]
pub struct ResolvedFilter {
    clauses: Vec<ResolvedClause>,
    disjunction: bool,
}

impl ResolvedFilter {
    /// Combined condition, `None` for an expression without clauses.
    #[must_use]
    pub fn condition(&self, backend: DatabaseBackend) -> Option<Condition> {
        if self.clauses.is_empty() {
            return None;
        }
        let root = if self.disjunction {
            Condition::any()
        } else {
            Condition::all()
        };
        Some(
            self.clauses
                .iter()
                .fold(root, |condition, clause| condition.add(clause.predicate(backend))),
        )
    }
}
