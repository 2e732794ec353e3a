//! The grid pipeline: request → resolved columns → query → page.

use axum::response::{IntoResponse, Response};
use sea_orm::{ConnectionTrait, Select};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::columns::ColumnSpecification;
use crate::errors::DataTablesError;
use crate::filtering::FilterExpression;
use crate::projection::{self, GridRow, RowDataProducer};
use crate::query_builder;
use crate::request::{self, ParsedRequest};
use crate::resolver;
use crate::response::{self, DataTablePage, DataTableResponse};
use crate::schema::{EntityRef, GridEntity};

/// Per-table tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataTableOptions {
    /// Serve errors with 400/500 statuses instead of 200
    pub strict_errors: bool,
    /// Upper bound on the page size, applied to `length=-1` too
    pub max_page_length: Option<u64>,
}

/// A grid over entity `E`.
///
/// ```rust,ignore
/// let table = DataTable::<user::Entity>::new(["id", "full_name"])
///     .column(("address", "address.description"))
///     .with_base_query(user::Entity::find().filter(user::Column::Active.eq(true)))
///     .add_data("link", |user: &user::Model| json!(format!("/users/{}", user.id)));
///
/// let page = table.respond(&db, &request::parse(raw_query)?).await?;
/// ```
pub struct DataTable<E: GridEntity> {
    /// `None` derives the columns from the request's data keys
    columns: Option<Vec<ColumnSpecification>>,
    row_data: Vec<(String, RowDataProducer<E::Model>)>,
    base_query: Option<Select<E>>,
    options: DataTableOptions,
}

impl<E: GridEntity> DataTable<E>
where
    E::Model: Sync,
{
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnSpecification>,
    {
        Self {
            columns: Some(columns.into_iter().map(Into::into).collect()),
            row_data: Vec::new(),
            base_query: None,
            options: DataTableOptions::default(),
        }
    }

    /// Grid whose columns are named by the request itself.
    #[must_use]
    pub fn from_request_columns() -> Self {
        Self {
            columns: None,
            row_data: Vec::new(),
            base_query: None,
            options: DataTableOptions::default(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<ColumnSpecification>) -> Self {
        self.columns.get_or_insert_with(Vec::new).push(column.into());
        self
    }

    /// Start from `query` instead of `E::find()`; its filters count towards `recordsTotal`.
    #[must_use]
    pub fn with_base_query(mut self, query: Select<E>) -> Self {
        self.base_query = Some(query);
        self
    }

    /// Attach a per-row metadata entry under `rowMetadata.{name}`, computed
    /// from the row's `E::Model` whether or not its fields are displayed.
    #[must_use]
    pub fn add_data<F>(mut self, name: impl Into<String>, producer: F) -> Self
    where
        F: Fn(&E::Model) -> Value + Send + Sync + 'static,
    {
        self.row_data.push((name.into(), Arc::new(producer)));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: DataTableOptions) -> Self {
        self.options = options;
        self
    }

    fn columns_for(&self, request: &ParsedRequest) -> Vec<ColumnSpecification> {
        match &self.columns {
            Some(columns) => columns.clone(),
            None => ColumnSpecification::from_request(request),
        }
    }

    /// Answer one parsed request.
    ///
    /// # Errors
    ///
    /// Any [`DataTablesError`] raised while resolving columns, decoding the
    /// `q` filter, ordering, or querying the database.
    pub async fn respond<C: ConnectionTrait>(
        &self,
        db: &C,
        request: &ParsedRequest,
    ) -> Result<DataTablePage, DataTablesError> {
        let root = EntityRef::of::<E>();
        let (columns, plan) = resolver::resolve(&self.columns_for(request), root)?;

        let (filter, plan) = match &request.filter {
            Some(raw) => {
                let (filter, plan) = FilterExpression::parse(raw)?.resolve(root, plan)?;
                (Some(filter), plan)
            }
            None => (None, plan),
        };

        tracing::debug!(
            columns = columns.len(),
            joins = ?plan.aliases(),
            draw = request.draw,
            "Resolved DataTables request"
        );

        let base = self.base_query.clone().unwrap_or_else(E::find);
        let prepared = query_builder::prepare(
            base,
            &columns,
            plan,
            filter.as_ref(),
            request,
            &self.options,
            db.get_database_backend(),
        )?;
        let prepared = if self.row_data.is_empty() {
            prepared
        } else {
            prepared.with_instance()
        };
        let built = query_builder::build(db, prepared).await?;

        let rows = built
            .query
            .into_model::<GridRow<E::Model>>()
            .all(db)
            .await?;
        let data = rows
            .iter()
            .map(|row| projection::project(row, &columns, &self.row_data))
            .collect();

        Ok(response::assemble(
            request.draw,
            built.records_total,
            built.records_filtered,
            data,
        ))
    }

    /// Parse `raw_query` and answer it.
    ///
    /// # Errors
    ///
    /// As [`DataTable::respond`], plus malformed request errors.
    pub async fn respond_raw<C: ConnectionTrait>(
        &self,
        db: &C,
        raw_query: &str,
    ) -> Result<DataTablePage, DataTablesError> {
        let request = request::parse(raw_query)?;
        self.respond(db, &request).await
    }

    /// Parse and answer `raw_query`; failures become an error payload.
    pub async fn json<C: ConnectionTrait>(&self, db: &C, raw_query: &str) -> DataTableResponse {
        match self.respond_raw(db, raw_query).await {
            Ok(page) => DataTableResponse::Page(page),
            Err(err) => DataTableResponse::from_error(&err),
        }
    }

    /// Parse and answer `raw_query` as an HTTP response.
    ///
    /// Errors keep their `{"error": ...}` body; with
    /// [`DataTableOptions::strict_errors`] they carry a 400/500 status
    /// instead of 200.
    pub async fn serve<C: ConnectionTrait>(&self, db: &C, raw_query: &str) -> Response {
        match self.respond_raw(db, raw_query).await {
            Ok(page) => DataTableResponse::Page(page).into_response(),
            Err(err) => error_response(err, self.options.strict_errors),
        }
    }
}

/// Error reply, with an error status only when `strict`.
pub(crate) fn error_response(err: DataTablesError, strict: bool) -> Response {
    if strict {
        err.into_response()
    } else {
        DataTableResponse::from_error(&err).into_response()
    }
}

impl<E: GridEntity> fmt::Debug for DataTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("entity", &EntityRef::of::<E>())
            .field("columns", &self.columns)
            .field(
                "row_data",
                &self.row_data.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
