//! Decoding of the DataTables server-side processing query string.
//!
//! The grid widget sends a flat, bracket-indexed grammar:
//!
//! ```text
//! draw=1&start=0&length=10
//! &columns[0][data]=id&columns[0][orderable]=true&columns[0][searchable]=true
//! &columns[1][data]=address.description&columns[1][search][value]=
//! &order[0][column]=1&order[0][dir]=desc
//! &search[value]=sally
//! ```
//!
//! [`parse`] first folds the pairs into a nested tree of groups and values,
//! then reads the structured [`ParsedRequest`] out of that tree.

use sea_orm::Order;
use std::collections::BTreeMap;

use crate::errors::DataTablesError;

/// Sort direction of one ordering directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` (any case) is descending, anything else ascending.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// Per-column metadata sent by the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestColumn {
    /// `columns[i][data]`, the display key
    pub data: String,
    /// `columns[i][name]`
    pub name: String,
    pub orderable: bool,
    pub searchable: bool,
    /// `columns[i][search][value]`, `None` when absent or empty
    pub search: Option<String>,
}

/// One `order[j]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderDirective {
    pub column: usize,
    pub direction: SortDirection,
}

/// Structured form of one grid refresh request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest {
    /// Correlation token echoed in the response
    pub draw: i64,
    /// Offset of the first row
    pub start: u64,
    /// Page size, `None` when the grid asks for all remaining rows (`length=-1`)
    pub length: Option<u64>,
    pub columns: BTreeMap<usize, RequestColumn>,
    /// Ordering directives, primary key first
    pub order: Vec<OrderDirective>,
    /// Global search term, `None` when absent or empty
    pub search: Option<String>,
    /// Raw `q` filter blob for the generic filter collaborator
    pub filter: Option<String>,
}

impl ParsedRequest {
    /// Request column whose data key is `key`
    #[must_use]
    pub fn column_by_data(&self, key: &str) -> Option<&RequestColumn> {
        self.columns.values().find(|column| column.data == key)
    }
}

#[derive(Debug)]
enum Node {
    Value(String),
    Group(BTreeMap<String, Node>),
}

impl Node {
    fn group(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Self::Group(children) => Some(children),
            Self::Value(_) => None,
        }
    }

    fn value(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Group(_) => None,
        }
    }
}

/// Split `columns[0][search][value]` into `["columns", "0", "search", "value"]`.
fn split_key(key: &str) -> Option<Vec<&str>> {
    let Some(open) = key.find('[') else {
        return (!key.is_empty()).then(|| vec![key]);
    };
    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    if segments
        .iter()
        .any(|segment| segment.is_empty() || segment.contains('['))
    {
        return None;
    }
    Some(segments)
}

fn insert(tree: &mut BTreeMap<String, Node>, key: &str, value: String) -> Result<(), DataTablesError> {
    let segments = split_key(key)
        .ok_or_else(|| DataTablesError::malformed(format!("Parameter {key} is malformed")))?;
    let conflict = || DataTablesError::malformed(format!("Parameter {key} conflicts with another parameter"));

    let (last, parents) = segments.split_last().ok_or_else(conflict)?;
    let mut current = tree;
    for segment in parents {
        let node = current
            .entry((*segment).to_string())
            .or_insert_with(|| Node::Group(BTreeMap::new()));
        current = match node {
            Node::Group(children) => children,
            Node::Value(_) => return Err(conflict()),
        };
    }
    if matches!(current.get(*last), Some(Node::Group(_))) {
        return Err(conflict());
    }
    current.insert((*last).to_string(), Node::Value(value));
    Ok(())
}

fn integer_param(tree: &BTreeMap<String, Node>, name: &str) -> Result<i64, DataTablesError> {
    let value = tree
        .get(name)
        .ok_or_else(|| DataTablesError::missing_parameter(name))?
        .value()
        .ok_or_else(|| DataTablesError::invalid_parameter(name))?;
    value
        .trim()
        .parse()
        .map_err(|_| DataTablesError::invalid_parameter(name))
}

fn flag(group: &BTreeMap<String, Node>, name: &str) -> bool {
    group
        .get(name)
        .and_then(Node::value)
        .is_none_or(|value| value.eq_ignore_ascii_case("true"))
}

fn text(group: &BTreeMap<String, Node>, name: &str) -> String {
    group
        .get(name)
        .and_then(Node::value)
        .unwrap_or_default()
        .to_string()
}

fn search_value(node: Option<&Node>) -> Option<String> {
    node.and_then(Node::group)
        .and_then(|search| search.get("value"))
        .and_then(Node::value)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Numerically indexed children of a group (`columns[0]`, `columns[1]`, ...).
fn indexed<'a>(
    group: &'a BTreeMap<String, Node>,
    param: &str,
) -> Result<BTreeMap<usize, &'a BTreeMap<String, Node>>, DataTablesError> {
    group
        .iter()
        .map(|(index, child)| {
            let position = index.parse::<usize>().map_err(|_| {
                DataTablesError::malformed(format!("Parameter {param}[{index}] has a non-integer index"))
            })?;
            let child = child
                .group()
                .ok_or_else(|| DataTablesError::invalid_parameter(&format!("{param}[{index}]")))?;
            Ok((position, child))
        })
        .collect()
}

fn parse_columns(tree: &BTreeMap<String, Node>) -> Result<BTreeMap<usize, RequestColumn>, DataTablesError> {
    let group = tree
        .get("columns")
        .ok_or_else(|| DataTablesError::missing_parameter("columns"))?
        .group()
        .ok_or_else(|| DataTablesError::invalid_parameter("columns"))?;

    Ok(indexed(group, "columns")?
        .into_iter()
        .map(|(index, column)| {
            let parsed = RequestColumn {
                data: text(column, "data"),
                name: text(column, "name"),
                orderable: flag(column, "orderable"),
                searchable: flag(column, "searchable"),
                search: search_value(column.get("search")),
            };
            (index, parsed)
        })
        .collect())
}

fn parse_order(tree: &BTreeMap<String, Node>) -> Result<Vec<OrderDirective>, DataTablesError> {
    let Some(node) = tree.get("order") else {
        return Ok(Vec::new());
    };
    let group = node
        .group()
        .ok_or_else(|| DataTablesError::invalid_parameter("order"))?;

    indexed(group, "order")?
        .into_iter()
        .map(|(position, directive)| {
            let param = format!("order[{position}][column]");
            let column = directive
                .get("column")
                .and_then(Node::value)
                .ok_or_else(|| DataTablesError::missing_parameter(&param))?
                .trim()
                .parse::<usize>()
                .map_err(|_| DataTablesError::invalid_parameter(&param))?;
            Ok(OrderDirective {
                column,
                direction: SortDirection::parse(&text(directive, "dir")),
            })
        })
        .collect()
}

/// Parse a raw query string (with or without the leading `?`).
///
/// # Errors
///
/// Returns [`DataTablesError::MalformedRequest`] when `draw`, `start` or
/// `length` are missing or not integers, when `columns` is missing, when an
/// index is not an integer, or when the bracket grammar is broken.
pub fn parse(raw_query: &str) -> Result<ParsedRequest, DataTablesError> {
    let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);
    let mut tree = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(raw_query.as_bytes()) {
        insert(&mut tree, &key, value.into_owned())?;
    }

    let draw = integer_param(&tree, "draw")?;
    let start = u64::try_from(integer_param(&tree, "start")?)
        .map_err(|_| DataTablesError::invalid_parameter("start"))?;
    let length = u64::try_from(integer_param(&tree, "length")?).ok();

    Ok(ParsedRequest {
        draw,
        start,
        length,
        columns: parse_columns(&tree)?,
        order: parse_order(&tree)?,
        search: search_value(tree.get("search")),
        filter: tree
            .get("q")
            .and_then(Node::value)
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string),
    })
}
