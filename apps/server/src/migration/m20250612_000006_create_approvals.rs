//! Create approvals table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Approval::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Approval::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Approval::MigrationId).uuid().not_null())
                    .col(ColumnDef::new(Approval::Env).string_len(10).not_null())
                    .col(ColumnDef::new(Approval::Decision).string_len(10).not_null())
                    .col(ColumnDef::new(Approval::Comment).text())
                    .col(ColumnDef::new(Approval::DecidedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Approval::DecidedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Approval::ChecksumUpAtDecision)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Approval::ChecksumDownAtDecision).string_len(64))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_approvals_migration")
                            .from(Approval::Table, Approval::MigrationId)
                            .to(MigrationDef::Table, MigrationDef::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_approvals_migration")
                    .table(Approval::Table)
                    .col(Approval::MigrationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Approval::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Approval {
    #[sea_orm(iden = "approvals")]
    Table,
    Id,
    MigrationId,
    Env,
    Decision,
    Comment,
    DecidedBy,
    DecidedAt,
    ChecksumUpAtDecision,
    ChecksumDownAtDecision,
}

#[derive(DeriveIden)]
enum MigrationDef {
    #[sea_orm(iden = "migrations")]
    Table,
    Id,
}
