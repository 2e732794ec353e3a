use axum::{
    Router,
    extract::{RawQuery, State},
    response::Response,
    routing::get,
};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::table::error_response;
use crate::traits::DataTableResource;

/// Answer one grid refresh: `GET /{resource}?draw=...&columns[...]...`
///
/// The raw query string is parsed by the crate's own bracket grammar, not by
/// `Query<T>`, so any column layout the grid sends is accepted.
pub async fn datatable_handler<T>(
    State(db): State<DatabaseConnection>,
    RawQuery(query): RawQuery,
) -> Response
where
    T: DataTableResource,
    <T::EntityType as EntityTrait>::Model: Sync,
{
    let raw = query.unwrap_or_default();
    match T::datatable(&db).await {
        Ok(table) => table.serve(&db, &raw).await,
        Err(err) => error_response(err, T::options().strict_errors),
    }
}

/// Router serving `T` under `/{RESOURCE_NAME}`.
pub fn datatable_router<T>(db: DatabaseConnection) -> Router
where
    T: DataTableResource,
    <T::EntityType as EntityTrait>::Model: Sync,
{
    Router::new()
        .route(&format!("/{}", T::RESOURCE_NAME), get(datatable_handler::<T>))
        .with_state(db)
}
