//! Migration entity: the versioned SQL pair and its checksums.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "migrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub migration_key: String,
    pub name: String,
    pub jira: Option<String>,
    pub description: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub sql_up: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub sql_down: Option<String>,
    pub checksum_up: String,
    pub checksum_down: Option<String>,
    pub version: i32,
    pub transaction_mode: String,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(has_many = "super::approval::Entity")]
    Approvals,
    #[sea_orm(has_many = "super::run::Entity")]
    Runs,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::approval::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Approvals.def()
    }
}

impl Related<super::run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Runs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
