//! Column resolution: display columns → source columns + join plan.
//!
//! Resolution is a fold over the declared columns. Each step walks one source
//! path through the entity graph and hands back the [`JoinPlan`] extended with
//! the relationship hops that path needed and no earlier path had already
//! joined. Hops are identified by their full relationship chain
//! (`family.address`), not by the table they land on, so two different chains
//! reaching the same table get two joins under two aliases.

use sea_orm::RelationDef;
use std::collections::HashSet;
use std::fmt;

use crate::columns::{ColumnSpecification, PATH_SEPARATOR};
use crate::errors::DataTablesError;
use crate::schema::{ComputedField, EntityRef, Field};

/// One LEFT JOIN of the plan.
pub struct PlannedJoin {
    chain: Vec<String>,
    alias: String,
    from_alias: String,
    def: RelationDef,
    marker_column: Option<String>,
}

impl PlannedJoin {
    /// Relationship chain from the root, e.g. `["family", "address"]`
    #[must_use]
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// SQL alias of the joined table (the dotted chain)
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Alias of the table this join hangs off
    #[must_use]
    pub fn from_alias(&self) -> &str {
        &self.from_alias
    }

    /// Primary key of the joined entity, selected to detect absent relations
    #[must_use]
    pub fn marker_column(&self) -> Option<&str> {
        self.marker_column.as_deref()
    }

    pub(crate) fn into_def(self) -> RelationDef {
        self.def
    }
}

impl fmt::Debug for PlannedJoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedJoin")
            .field("alias", &self.alias)
            .field("from_alias", &self.from_alias)
            .field("marker_column", &self.marker_column)
            .finish_non_exhaustive()
    }
}

/// Deduplicated, ordered relationship joins for one request.
#[derive(Debug, Default)]
pub struct JoinPlan {
    joins: Vec<PlannedJoin>,
}

impl JoinPlan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.joins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedJoin> {
        self.joins.iter()
    }

    #[must_use]
    pub fn aliases(&self) -> Vec<&str> {
        self.joins.iter().map(PlannedJoin::alias).collect()
    }

    pub(crate) fn into_joins(self) -> Vec<PlannedJoin> {
        self.joins
    }

    fn position(&self, chain: &[String]) -> Option<usize> {
        self.joins.iter().position(|join| join.chain == chain)
    }

    /// Index of the join for `chain`, appending it when not yet planned.
    fn with_join(mut self, chain: &[String], from_alias: &str, def: RelationDef, target: EntityRef) -> (Self, usize) {
        if let Some(index) = self.position(chain) {
            return (self, index);
        }
        self.joins.push(PlannedJoin {
            chain: chain.to_vec(),
            alias: chain.join(&PATH_SEPARATOR.to_string()),
            from_alias: from_alias.to_string(),
            def,
            marker_column: target.primary_key(),
        });
        let index = self.joins.len() - 1;
        (self, index)
    }
}

/// Where a resolved leaf lives.
#[derive(Debug, Clone)]
pub enum SourceKind {
    Stored { column: String },
    Computed(ComputedField),
}

/// A source path resolved against the entity graph.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Dotted path as declared
    pub path: String,
    /// Table alias the leaf is read from (root table or join alias)
    pub table_alias: String,
    pub kind: SourceKind,
    /// Indices into the join plan, one per relationship hop
    pub hops: Vec<usize>,
}

impl ResolvedSource {
    #[must_use]
    pub fn is_computed(&self) -> bool {
        matches!(self.kind, SourceKind::Computed(_))
    }
}

/// A declared column bound to its resolved source.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub spec: ColumnSpecification,
    pub source: ResolvedSource,
    /// SQL alias of the selected value
    pub(crate) value_alias: String,
}

impl ResolvedColumn {
    /// SQL alias of the `index`-th computed input
    pub(crate) fn input_alias(&self, index: usize) -> String {
        format!("{}_{index}", self.value_alias)
    }
}

/// Declared columns in declaration order, looked up by display name.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    columns: Vec<ResolvedColumn>,
}

impl ColumnMap {
    /// Column by display name or by output key (`address__description`).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolvedColumn> {
        self.columns
            .iter()
            .find(|column| column.spec.name() == name)
            .or_else(|| self.columns.iter().find(|column| column.spec.output_key() == name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedColumn> {
        self.columns.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// SQL alias of the presence marker of join `index`
pub(crate) fn marker_alias(index: usize) -> String {
    format!("j{index}")
}

/// Walk `path` from `root`, extending `plan` with the hops it needs.
///
/// # Errors
///
/// [`DataTablesError::UnknownColumn`] when a segment is neither a relation
/// (before the leaf) nor a field (the leaf) of the entity reached so far.
pub fn resolve_path(
    path: &[String],
    root: EntityRef,
    plan: JoinPlan,
) -> Result<(ResolvedSource, JoinPlan), DataTablesError> {
    let full = path.join(&PATH_SEPARATOR.to_string());
    let (leaf, relations) = path
        .split_last()
        .ok_or_else(|| DataTablesError::unknown_column(&full, &full))?;

    let root_alias = root.table_name();
    let (plan, entity, table_alias, hops) = relations.iter().enumerate().try_fold(
        (plan, root, root_alias, Vec::new()),
        |(plan, entity, alias, mut hops), (depth, name)| {
            let link = entity
                .relation(name)
                .ok_or_else(|| DataTablesError::unknown_column(&full, name))?;
            let target = link.target;
            let (plan, index) = plan.with_join(&path[..=depth], &alias, link.def, target);
            hops.push(index);
            let alias = plan.joins[index].alias.clone();
            Ok::<_, DataTablesError>((plan, target, alias, hops))
        },
    )?;

    let kind = match entity.field(leaf) {
        Some(Field::Stored(column)) => SourceKind::Stored { column },
        Some(Field::Computed(computed)) => SourceKind::Computed(computed),
        None => return Err(DataTablesError::unknown_column(&full, leaf)),
    };

    let source = ResolvedSource {
        path: full,
        table_alias,
        kind,
        hops,
    };
    Ok((source, plan))
}

/// Resolve every declared column against `root` in one pass.
///
/// # Errors
///
/// [`DataTablesError::UnknownColumn`] for unresolvable paths and
/// [`DataTablesError::MalformedRequest`] for duplicate display names or two
/// columns sharing an output key (`a.b` and `a__b`).
pub fn resolve(
    columns: &[ColumnSpecification],
    root: EntityRef,
) -> Result<(ColumnMap, JoinPlan), DataTablesError> {
    let mut names = HashSet::new();
    if let Some(duplicate) = columns.iter().find(|column| !names.insert(column.name())) {
        return Err(DataTablesError::malformed(format!(
            "Column {} is declared more than once",
            duplicate.name()
        )));
    }
    let mut keys = HashSet::new();
    if let Some(clash) = columns.iter().find(|column| !keys.insert(column.output_key())) {
        return Err(DataTablesError::malformed(format!(
            "Column {} collides with another column on output key {}",
            clash.name(),
            clash.output_key()
        )));
    }

    let (resolved, plan) = columns.iter().enumerate().try_fold(
        (Vec::with_capacity(columns.len()), JoinPlan::default()),
        |(mut resolved, plan), (index, spec)| {
            let (source, plan) = resolve_path(spec.source_path(), root, plan)?;
            resolved.push(ResolvedColumn {
                spec: spec.clone(),
                source,
                value_alias: format!("c{index}"),
            });
            Ok::<_, DataTablesError>((resolved, plan))
        },
    )?;

    Ok((ColumnMap { columns: resolved }, plan))
}
