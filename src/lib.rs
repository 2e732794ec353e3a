//! # crudtables
//!
//! Server-side processing for `DataTables` grids on top of Sea-ORM.
//!
//! A grid asks for one page at a time with a bracketed query string
//! (`draw`, `start`, `length`, `columns[i][...]`, `order[j][...]`,
//! `search[value]`). This crate decodes it, resolves the display columns
//! (including dotted relationship paths such as `address.city.name`) into
//! LEFT JOINs, applies search, ordering and paging, and returns the
//! `{draw, recordsTotal, recordsFiltered, data}` payload the grid expects.
//!
//! ```rust,ignore
//! use crudtables::{DataTable, GridEntity, RelationLink};
//!
//! impl GridEntity for user::Entity {
//!     fn relation(name: &str) -> Option<RelationLink> {
//!         match name {
//!             "address" => Some(RelationLink::to::<address::Entity>(user::Relation::Address.def())),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let table = DataTable::<user::Entity>::new(["id", "full_name", "address.description"]);
//! let payload = table.json(&db, raw_query).await; // never fails, errors become {"error": ...}
//! ```
//!
//! Mount a whole endpoint with [`DataTableResource`] and [`datatable_router`].

pub mod columns;
pub mod errors;
pub mod filtering;
pub mod projection;
pub mod query_builder;
pub mod request;
pub mod resolver;
pub mod response;
pub mod routes;
pub mod schema;
pub mod table;
pub mod traits;

pub use columns::ColumnSpecification;
pub use errors::DataTablesError;
pub use request::{ParsedRequest, parse};
pub use response::{DataTablePage, DataTableResponse, ErrorPayload};
pub use routes::{datatable_handler, datatable_router};
pub use schema::{ComputedField, EntityRef, GridEntity, RelationLink};
pub use table::{DataTable, DataTableOptions};
pub use traits::DataTableResource;
