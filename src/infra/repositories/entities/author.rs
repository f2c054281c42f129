//! Author database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::Author;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Author {
    fn from(model: Model) -> Self {
        Author {
            id: model.id,
            name: model.name,
        }
    }
}
