//! Approval entity. Rows are append-only; the only mutation is bulk deletion
//! when the migration SQL changes.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "approvals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub migration_id: Uuid,
    pub env: String,
    pub decision: String,
    pub comment: Option<String>,
    pub decided_by: Uuid,
    pub decided_at: DateTimeUtc,
    pub checksum_up_at_decision: String,
    pub checksum_down_at_decision: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::migration::Entity",
        from = "Column::MigrationId",
        to = "super::migration::Column::Id",
        on_delete = "Cascade"
    )]
    Migration,
}

impl Related<super::migration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Migration.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
