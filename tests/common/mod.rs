use async_trait::async_trait;
use axum::Router;
use crudtables::{ColumnSpecification, DataTableResource, datatable_router};
use sea_orm::{ActiveValue::Set, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use sea_orm_migration::prelude::*;

pub mod entities;

use entities::{account, address, city, user};

pub const USER_COUNT: i32 = 25;

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    // Several tests share the process; only the first subscriber sticks
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Database with the seed rows described on [`seed`].
pub async fn setup_seeded_db() -> Result<DatabaseConnection, DbErr> {
    let db = setup_test_db().await?;
    seed(&db).await?;
    Ok(db)
}

/// Address of user `id`: none for multiples of 3, otherwise address 1 or 2.
/// User 25 lives at address 3, which has no city.
pub fn address_of(id: i32) -> Option<i32> {
    match (id, id % 3) {
        (25, _) => Some(3),
        (_, 0) => None,
        (_, 1) => Some(1),
        _ => Some(2),
    }
}

/// Users 1-5 belong to Acme, 6-10 to Globex, the rest to no account.
pub fn account_of(id: i32) -> Option<i32> {
    match id {
        1..=5 => Some(1),
        6..=10 => Some(2),
        _ => None,
    }
}

pub fn name_of(id: i32) -> String {
    match id {
        7 => "Sally Smith".to_string(),
        13 => "Sam Sallow".to_string(),
        _ => format!("User {id:02}"),
    }
}

pub async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    city::Entity::insert_many([
        city::ActiveModel {
            id: Set(1),
            name: Set("Paris".to_string()),
        },
        city::ActiveModel {
            id: Set(2),
            name: Set("Lyon".to_string()),
        },
    ])
    .exec(db)
    .await?;

    address::Entity::insert_many([
        address::ActiveModel {
            id: Set(1),
            description: Set("1 Rue de Rivoli".to_string()),
            city_id: Set(Some(1)),
        },
        address::ActiveModel {
            id: Set(2),
            description: Set("10 Downing Road".to_string()),
            city_id: Set(Some(2)),
        },
        address::ActiveModel {
            id: Set(3),
            description: Set("5 Main Road".to_string()),
            city_id: Set(None),
        },
    ])
    .exec(db)
    .await?;

    account::Entity::insert_many([
        account::ActiveModel {
            id: Set(1),
            name: Set("Acme".to_string()),
            email: Set("ops@acme.test".to_string()),
        },
        account::ActiveModel {
            id: Set(2),
            name: Set("Globex".to_string()),
            email: Set("it@globex.test".to_string()),
        },
    ])
    .exec(db)
    .await?;

    user::Entity::insert_many((1..=USER_COUNT).map(|id| user::ActiveModel {
        id: Set(id),
        full_name: Set(name_of(id)),
        address_id: Set(address_of(id)),
        account_id: Set(account_of(id)),
    }))
    .exec(db)
    .await?;

    Ok(())
}

/// Query string of a grid showing `columns`, all orderable and searchable.
pub fn grid_query(start: i64, length: i64, columns: &[&str], order: &[(usize, &str)]) -> String {
    let mut query = format!("draw=1&start={start}&length={length}");
    for (index, data) in columns.iter().enumerate() {
        query.push_str(&format!(
            "&columns[{index}][data]={data}&columns[{index}][name]=\
             &columns[{index}][orderable]=true&columns[{index}][searchable]=true\
             &columns[{index}][search][value]="
        ));
    }
    for (index, (column, dir)) in order.iter().enumerate() {
        query.push_str(&format!("&order[{index}][column]={column}&order[{index}][dir]={dir}"));
    }
    query
}

pub struct UserGrid;

#[async_trait]
impl DataTableResource for UserGrid {
    type EntityType = user::Entity;

    const RESOURCE_NAME: &'static str = "users";

    fn columns() -> Option<Vec<ColumnSpecification>> {
        Some(vec![
            "id".into(),
            "full_name".into(),
            "address.description".into(),
            "account.name".into(),
        ])
    }
}

pub struct StrictUserGrid;

#[async_trait]
impl DataTableResource for StrictUserGrid {
    type EntityType = user::Entity;

    const RESOURCE_NAME: &'static str = "strict_users";
    const STRICT_ERRORS: bool = true;
    const MAX_PAGE_LENGTH: Option<u64> = Some(5);
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = datatable_router::<UserGrid>(db.clone()).merge(datatable_router::<StrictUserGrid>(db));
    Router::new().nest("/api/v1", api)
}

pub struct Migrator;

#[async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateGridTables)]
    }
}

pub struct CreateGridTables;

impl MigrationName for CreateGridTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_grid_tables"
    }
}

#[async_trait]
impl MigrationTrait for CreateGridTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(city::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(address::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(account::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(user::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in ["users", "accounts", "addresses", "cities"] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}
