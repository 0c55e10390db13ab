//! Create db_sets table. Uniqueness is (project_id, env, name).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DbSet::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DbSet::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DbSet::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(DbSet::Env).string_len(10).not_null())
                    .col(ColumnDef::new(DbSet::Name).string().not_null())
                    .col(
                        ColumnDef::new(DbSet::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(DbSet::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(DbSet::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_db_sets_project")
                            .from(DbSet::Table, DbSet::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_db_sets_project_env_name")
                    .table(DbSet::Table)
                    .col(DbSet::ProjectId)
                    .col(DbSet::Env)
                    .col(DbSet::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DbSet::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DbSet {
    #[sea_orm(iden = "db_sets")]
    Table,
    Id,
    ProjectId,
    Env,
    Name,
    IsActive,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Project {
    #[sea_orm(iden = "projects")]
    Table,
    Id,
}
