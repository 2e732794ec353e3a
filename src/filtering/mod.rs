//! # Search, filtering, ordering and paging
//!
//! Translates the grid's interaction state into clauses on the prepared
//! query:
//!
//! - **[`search`]**: global and per-column substring search (`LIKE '%v%'`,
//!   wildcards escaped)
//! - **[`expression`]**: structured `q` filter expressions on any reachable
//!   column
//! - **[`sort`]**: `order[...]` directives to `ORDER BY` terms
//! - **[`pagination`]**: `start`/`length` to the row window
//!
//! ```rust,ignore
//! // GET /users?...&search[value]=sally
//! //   WHERE users.full_name LIKE '%sally%' ESCAPE '\' OR ...
//! // GET /users?...&q={"filters":[{"name":"address__city__name","op":"eq","val":"Paris"}]}
//! //   WHERE "address.city"."name" = 'Paris'
//! ```

pub mod expression;
pub mod pagination;
pub mod search;
pub mod sort;

pub use expression::{FilterExpression, FilterOperator, ResolvedFilter};
pub use pagination::{PageWindow, page_window};
pub use search::{build_column_search, build_global_search, contains_condition};
pub use sort::{OrderTerm, resolve_ordering};
