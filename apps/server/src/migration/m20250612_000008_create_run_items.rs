//! Create run_items table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RunItem::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RunItem::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RunItem::RunId).uuid().not_null())
                    .col(ColumnDef::new(RunItem::DbTargetId).uuid().not_null())
                    .col(
                        ColumnDef::new(RunItem::Status)
                            .string_len(20)
                            .not_null()
                            .default("queued"),
                    )
                    .col(ColumnDef::new(RunItem::StartedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(RunItem::FinishedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(RunItem::Error).text())
                    .col(ColumnDef::new(RunItem::Log).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_run_items_run")
                            .from(RunItem::Table, RunItem::RunId)
                            .to(Run::Table, Run::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_run_items_run")
                    .table(RunItem::Table)
                    .col(RunItem::RunId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RunItem::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RunItem {
    #[sea_orm(iden = "run_items")]
    Table,
    Id,
    RunId,
    DbTargetId,
    Status,
    StartedAt,
    FinishedAt,
    Error,
    Log,
}

#[derive(DeriveIden)]
enum Run {
    #[sea_orm(iden = "runs")]
    Table,
    Id,
}
