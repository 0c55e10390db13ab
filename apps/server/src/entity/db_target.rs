//! DB target entity. `password_enc` holds secret-box ciphertext only.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "db_targets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub db_set_id: Uuid,
    pub engine: String,
    pub host: String,
    pub port: i32,
    pub dbname: String,
    pub username: String,
    #[sea_orm(column_type = "VarBinary(StringLen::None)")]
    pub password_enc: Vec<u8>,
    #[sea_orm(column_type = "JsonBinary")]
    pub options: JsonValue,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::db_set::Entity",
        from = "Column::DbSetId",
        to = "super::db_set::Column::Id",
        on_delete = "Cascade"
    )]
    DbSet,
}

impl Related<super::db_set::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DbSet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
