//! Runtime view of the entity graph that display columns are resolved against.
//!
//! Sea-ORM relations are statically typed, while grid columns arrive as
//! strings (`address.city.name`). [`GridEntity`] bridges the two: each entity
//! names the relations it exposes to grids and, optionally, computed fields.
//! [`EntityRef`] erases the entity type so the resolver can walk from one
//! entity to the next without knowing the chain at compile time.
//!
//! ```rust,ignore
//! impl GridEntity for user::Entity {
//!     fn relation(name: &str) -> Option<RelationLink> {
//!         match name {
//!             "address" => Some(RelationLink::to::<address::Entity>(user::Relation::Address.def())),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use sea_orm::{EntityName, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn, RelationDef};
use serde_json::Value;
use std::fmt;

/// A field derived from stored columns of the same entity.
///
/// The value is computed after rows are materialized, so such fields can be
/// displayed but never searched or ordered in SQL.
#[derive(Clone, Copy)]
pub struct ComputedField {
    /// Stored columns fed to `compute`, in order
    pub inputs: &'static [&'static str],
    pub compute: fn(&[Value]) -> Value,
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedField")
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

/// Sea-ORM entity exposed to grid requests.
pub trait GridEntity: EntityTrait {
    /// Relation reachable from this entity under `name`.
    #[must_use]
    fn relation(name: &str) -> Option<RelationLink> {
        let _ = name;
        None
    }

    /// Computed field exposed under `name`.
    #[must_use]
    fn computed_field(name: &str) -> Option<ComputedField> {
        let _ = name;
        None
    }
}

/// A named relation and the entity it leads to.
pub struct RelationLink {
    pub def: RelationDef,
    pub target: EntityRef,
}

impl RelationLink {
    #[must_use]
    pub fn to<T: GridEntity>(def: RelationDef) -> Self {
        Self {
            def,
            target: EntityRef::of::<T>(),
        }
    }
}

/// What a path leaf resolves to.
#[derive(Debug, Clone)]
pub enum Field {
    /// A stored column, by name
    Stored(String),
    Computed(ComputedField),
}

/// Type-erased handle on a [`GridEntity`].
#[derive(Clone, Copy)]
pub struct EntityRef {
    table: fn() -> String,
    primary_key: fn() -> Option<String>,
    has_column: fn(&str) -> bool,
    computed: fn(&str) -> Option<ComputedField>,
    relation: fn(&str) -> Option<RelationLink>,
}

fn table_of<E: EntityTrait>() -> String {
    E::default().table_name().to_string()
}

fn primary_key_of<E: EntityTrait>() -> Option<String> {
    E::PrimaryKey::iter()
        .next()
        .map(|key| key.into_column().as_str().to_string())
}

fn has_column_of<E: EntityTrait>(name: &str) -> bool {
    E::Column::iter().any(|column| column.as_str() == name)
}

impl EntityRef {
    #[must_use]
    pub fn of<E: GridEntity>() -> Self {
        Self {
            table: table_of::<E>,
            primary_key: primary_key_of::<E>,
            has_column: has_column_of::<E>,
            computed: E::computed_field,
            relation: E::relation,
        }
    }

    #[must_use]
    pub fn table_name(&self) -> String {
        (self.table)()
    }

    /// First primary key column; NULL in a joined row means the relation is absent
    #[must_use]
    pub fn primary_key(&self) -> Option<String> {
        (self.primary_key)()
    }

    /// Stored columns take precedence over computed fields of the same name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Field> {
        if (self.has_column)(name) {
            Some(Field::Stored(name.to_string()))
        } else {
            (self.computed)(name).map(Field::Computed)
        }
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<RelationLink> {
        (self.relation)(name)
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("table", &self.table_name())
            .finish_non_exhaustive()
    }
}
