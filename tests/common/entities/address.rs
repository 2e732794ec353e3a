use crudtables::{GridEntity, RelationLink};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub description: String,
    pub city_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::city::Entity",
        from = "Column::CityId",
        to = "super::city::Column::Id"
    )]
    City,
    #[sea_orm(has_many = "super::user::Entity")]
    Residents,
}

impl ActiveModelBehavior for ActiveModel {}

impl GridEntity for Entity {
    fn relation(name: &str) -> Option<RelationLink> {
        match name {
            "city" => Some(RelationLink::to::<super::city::Entity>(Relation::City.def())),
            "residents" => Some(RelationLink::to::<super::user::Entity>(Relation::Residents.def())),
            _ => None,
        }
    }
}
