//! # Error Handling for DataTables Endpoints
//!
//! Every failure raised while answering a grid request is one of the
//! [`DataTablesError`] kinds below. The grid widget expects a well-formed JSON
//! body even when something goes wrong, so errors are never surfaced as
//! transport failures: they are turned into `{"error": "<message>"}` by
//! [`crate::response::DataTableResponse::from_error`].
//!
//! Database errors are logged through `tracing` and replaced with a generic
//! message before they reach the client.
//!
//! ```rust,ignore
//! match table.respond(&db, &request).await {
//!     Ok(page) => DataTableResponse::Page(page),
//!     Err(err) => DataTableResponse::from_error(&err),
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use std::fmt;

use crate::response::ErrorPayload;

/// Failure kinds of the request → query → payload pipeline.
#[derive(Debug)]
pub enum DataTablesError {
    /// A required parameter is missing, not an integer, or the bracket grammar is broken
    MalformedRequest {
        /// User-facing message, e.g. `Parameter draw is missing`
        message: String,
    },

    /// A column path does not resolve against the entity graph
    UnknownColumn {
        /// Full dotted path as declared
        path: String,
        /// First segment that failed to resolve
        segment: String,
    },

    /// An ordering directive names a request column that is not a declared column
    ColumnNotOrderable {
        /// Data key of the request column
        column: String,
    },

    /// An ordering directive references a column index absent from the request
    OrderableColumnNotFound {
        /// Index sent in `order[j][column]`
        index: usize,
    },

    /// Ordering requested on a derived (computed) field
    CannotOrderByComputedColumn {
        /// Dotted source path of the computed field
        column: String,
    },

    /// The `q` filter blob failed to decode or references an invalid field
    InvalidFilterExpression {
        /// User-facing message
        message: String,
    },

    /// Data-source failure (details logged, not exposed)
    Database {
        /// Internal error
        internal: DbErr,
    },
}

impl DataTablesError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
        }
    }

    pub(crate) fn missing_parameter(name: &str) -> Self {
        Self::malformed(format!("Parameter {name} is missing"))
    }

    pub(crate) fn invalid_parameter(name: &str) -> Self {
        Self::malformed(format!("Parameter {name} is invalid"))
    }

    pub fn unknown_column(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::UnknownColumn {
            path: path.into(),
            segment: segment.into(),
        }
    }

    pub fn invalid_filter(message: impl Into<String>) -> Self {
        Self::InvalidFilterExpression {
            message: message.into(),
        }
    }

    pub fn database(err: DbErr) -> Self {
        Self::Database { internal: err }
    }

    /// Status used when a resource opts into strict error statuses.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Sanitized message sent to the client
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedRequest { message } | Self::InvalidFilterExpression { message } => {
                message.clone()
            }
            Self::UnknownColumn { path, segment } => {
                if path == segment {
                    format!("Unknown column {path}")
                } else {
                    format!("Unknown column {path}: cannot resolve {segment}")
                }
            }
            Self::ColumnNotOrderable { column } => {
                format!("Cannot order by column {column}: column is not declared")
            }
            Self::OrderableColumnNotFound { index } => {
                format!("Cannot order {index}: column not found")
            }
            Self::CannotOrderByComputedColumn { column } => {
                format!("Cannot order by column {column} as it is a computed field")
            }
            Self::Database { .. } => "A database error occurred".to_string(),
        }
    }

    /// Log internal error details (not sent to the client)
    pub(crate) fn log_internal(&self) {
        match self {
            Self::Database { internal } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            _ => {
                tracing::debug!(error = %self.user_message(), "DataTables request rejected");
            }
        }
    }
}

impl fmt::Display for DataTablesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for DataTablesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database { internal } => Some(internal),
            _ => None,
        }
    }
}

impl From<DbErr> for DataTablesError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}

/// Strict-mode response: error payload with a 4xx/5xx status.
impl IntoResponse for DataTablesError {
    fn into_response(self) -> Response {
        self.log_internal();
        let status = self.status_code();
        (status, Json(ErrorPayload::new(self.user_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameter_message() {
        let err = DataTablesError::missing_parameter("draw");
        assert_eq!(err.user_message(), "Parameter draw is missing");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = DataTablesError::invalid_parameter("start");
        assert_eq!(err.to_string(), "Parameter start is invalid");
    }

    #[test]
    fn test_unknown_column_messages() {
        let direct = DataTablesError::unknown_column("nope", "nope");
        assert_eq!(direct.user_message(), "Unknown column nope");

        let nested = DataTablesError::unknown_column("address.planet", "planet");
        assert_eq!(
            nested.user_message(),
            "Unknown column address.planet: cannot resolve planet"
        );
    }

    #[test]
    fn test_ordering_messages() {
        let err = DataTablesError::OrderableColumnNotFound { index: 7 };
        assert_eq!(err.user_message(), "Cannot order 7: column not found");

        let err = DataTablesError::CannotOrderByComputedColumn {
            column: "initials".to_string(),
        };
        assert!(err.user_message().contains("computed field"));
    }

    #[test]
    fn test_database_error_is_sanitized() {
        let err: DataTablesError = DbErr::Custom("connection refused at 10.0.0.3".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "A database error occurred");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_strict_response_status() {
        let response = DataTablesError::invalid_filter("bad q").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
