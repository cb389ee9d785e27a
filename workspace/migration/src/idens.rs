//! Table and column names taken from the `model` entities, for
//! migrations written after the entities exist.

use sea_orm::{ColumnTrait, EntityName, EntityTrait, IdenStatic};
use sea_orm_migration::prelude::Alias;

pub fn table<E: EntityTrait>() -> Alias {
    Alias::new(E::default().table_name())
}

pub fn column<C: ColumnTrait>(column: C) -> Alias {
    Alias::new(column.as_str())
}
