//! Response payloads consumed by the grid widget.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::errors::DataTablesError;

/// One page of grid data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataTablePage {
    /// Echo of the request's `draw`
    pub draw: i64,
    /// Rows before any search
    pub records_total: u64,
    /// Rows after search, before paging
    pub records_filtered: u64,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Map<String, Value>>,
}

/// Body of a failed grid request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Either a page or `{"error": ...}`, always served with status 200.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DataTableResponse {
    Page(DataTablePage),
    Error(ErrorPayload),
}

impl DataTableResponse {
    /// Error payload for `err`; internal details are logged, not returned.
    #[must_use]
    pub fn from_error(err: &DataTablesError) -> Self {
        err.log_internal();
        Self::Error(ErrorPayload::new(err.user_message()))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<DataTablePage> for DataTableResponse {
    fn from(page: DataTablePage) -> Self {
        Self::Page(page)
    }
}

impl IntoResponse for DataTableResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Assemble a page from counts and projected records.
#[must_use]
pub fn assemble(
    draw: i64,
    records_total: u64,
    records_filtered: u64,
    data: Vec<Map<String, Value>>,
) -> DataTablePage {
    DataTablePage {
        draw,
        records_total,
        records_filtered,
        data,
    }
}
