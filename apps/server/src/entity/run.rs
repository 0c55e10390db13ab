//! Run entity: checksum snapshots taken at request time travel with the run.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub run_type: String,
    pub migration_id: Uuid,
    pub project_id: Uuid,
    pub env: String,
    pub db_set_id: Uuid,
    pub status: String,
    pub requested_by: Uuid,
    pub requested_at: DateTimeUtc,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeUtc>,
    pub approval_comment: Option<String>,
    pub executed_by: Option<Uuid>,
    pub started_at: Option<DateTimeUtc>,
    pub finished_at: Option<DateTimeUtc>,
    pub checksum_up_at_request: String,
    pub checksum_down_at_request: Option<String>,
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
    #[sea_orm(has_many = "super::run_item::Entity")]
    RunItems,
}

impl Related<super::migration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Migration.def()
    }
}

impl Related<super::run_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RunItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
