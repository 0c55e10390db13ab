//! Project entity.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::db_set::Entity")]
    DbSets,
    #[sea_orm(has_many = "super::migration::Entity")]
    Migrations,
}

impl Related<super::db_set::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DbSets.def()
    }
}

impl Related<super::migration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Migrations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
