//! Create runs table. Status and env are indexed for dashboard queries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Run::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Run::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Run::RunType).string_len(10).not_null())
                    .col(ColumnDef::new(Run::MigrationId).uuid().not_null())
                    .col(ColumnDef::new(Run::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Run::Env).string_len(10).not_null())
                    .col(ColumnDef::new(Run::DbSetId).uuid().not_null())
                    .col(ColumnDef::new(Run::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Run::RequestedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Run::RequestedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Run::ApprovedBy).uuid())
                    .col(ColumnDef::new(Run::ApprovedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Run::ApprovalComment).text())
                    .col(ColumnDef::new(Run::ExecutedBy).uuid())
                    .col(ColumnDef::new(Run::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Run::FinishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Run::ChecksumUpAtRequest)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Run::ChecksumDownAtRequest).string_len(64))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_runs_migration")
                            .from(Run::Table, Run::MigrationId)
                            .to(MigrationDef::Table, MigrationDef::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_runs_status")
                    .table(Run::Table)
                    .col(Run::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_runs_env")
                    .table(Run::Table)
                    .col(Run::Env)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Run::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Run {
    #[sea_orm(iden = "runs")]
    Table,
    Id,
    RunType,
    MigrationId,
    ProjectId,
    Env,
    DbSetId,
    Status,
    RequestedBy,
    RequestedAt,
    ApprovedBy,
    ApprovedAt,
    ApprovalComment,
    ExecutedBy,
    StartedAt,
    FinishedAt,
    ChecksumUpAtRequest,
    ChecksumDownAtRequest,
}

#[derive(DeriveIden)]
enum MigrationDef {
    #[sea_orm(iden = "migrations")]
    Table,
    Id,
}
