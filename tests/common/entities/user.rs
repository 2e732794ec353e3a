use crudtables::{ComputedField, GridEntity, RelationLink};
use sea_orm::entity::prelude::*;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub full_name: String,
    pub address_id: Option<i32>,
    pub account_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::AddressId",
        to = "super::address::Column::Id"
    )]
    Address,
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
    /// Billing address, a second path into `addresses`
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::AccountId",
        to = "super::address::Column::Id"
    )]
    Billing,
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn initials(inputs: &[Value]) -> Value {
    let name = inputs.first().and_then(Value::as_str).unwrap_or_default();
    Value::String(
        name.split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect(),
    )
}

impl GridEntity for Entity {
    fn relation(name: &str) -> Option<RelationLink> {
        match name {
            "address" => Some(RelationLink::to::<super::address::Entity>(Relation::Address.def())),
            "account" => Some(RelationLink::to::<super::account::Entity>(Relation::Account.def())),
            "billing" => Some(RelationLink::to::<super::address::Entity>(Relation::Billing.def())),
            _ => None,
        }
    }

    fn computed_field(name: &str) -> Option<ComputedField> {
        match name {
            "initials" => Some(ComputedField {
                inputs: &["full_name"],
                compute: initials,
            }),
            _ => None,
        }
    }
}
