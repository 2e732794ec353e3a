use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, Select};

use crate::columns::ColumnSpecification;
use crate::errors::DataTablesError;
use crate::projection::RowDataProducer;
use crate::schema::GridEntity;
use crate::table::{DataTable, DataTableOptions};

/// A grid endpoint over one entity.
///
/// ```rust,ignore
/// struct UserGrid;
///
/// #[async_trait]
/// impl DataTableResource for UserGrid {
///     type EntityType = user::Entity;
///     const RESOURCE_NAME: &'static str = "users";
///
///     fn columns() -> Option<Vec<ColumnSpecification>> {
///         Some(vec!["id".into(), ("address", "address.description").into()])
///     }
/// }
///
/// let app = datatable_router::<UserGrid>(db);
/// ```
#[async_trait]
pub trait DataTableResource: Sized + Send + Sync + 'static
where
    <Self::EntityType as EntityTrait>::Model: Sync,
{
    type EntityType: GridEntity + Sync;

    /// Path segment the grid is mounted under
    const RESOURCE_NAME: &'static str;
    /// Serve errors with 400/500 statuses instead of 200
    const STRICT_ERRORS: bool = false;
    const MAX_PAGE_LENGTH: Option<u64> = None;

    /// Declared columns; `None` takes them from the request's data keys.
    #[must_use]
    fn columns() -> Option<Vec<ColumnSpecification>> {
        None
    }

    /// Producers of `rowMetadata` entries, fed each row's model.
    #[must_use]
    fn row_data() -> Vec<(String, RowDataProducer<<Self::EntityType as EntityTrait>::Model>)> {
        Vec::new()
    }

    /// Query the grid starts from, e.g. scoped to the current tenant.
    async fn base_query(db: &DatabaseConnection) -> Result<Select<Self::EntityType>, DataTablesError> {
        let _ = db;
        Ok(Self::EntityType::find())
    }

    #[must_use]
    fn options() -> DataTableOptions {
        DataTableOptions {
            strict_errors: Self::STRICT_ERRORS,
            max_page_length: Self::MAX_PAGE_LENGTH,
        }
    }

    async fn datatable(db: &DatabaseConnection) -> Result<DataTable<Self::EntityType>, DataTablesError> {
        let table = match Self::columns() {
            Some(columns) => DataTable::new(columns),
            None => DataTable::from_request_columns(),
        };
        let table = Self::row_data()
            .into_iter()
            .fold(table, |table, (name, producer)| {
                table.add_data(name, move |model| producer(model))
            });
        Ok(table
            .with_base_query(Self::base_query(db).await?)
            .with_options(Self::options()))
    }
}
