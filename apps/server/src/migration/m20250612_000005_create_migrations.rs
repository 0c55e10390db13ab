//! Create migrations table. Uniqueness is (project_id, migration_key).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MigrationDef::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MigrationDef::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MigrationDef::ProjectId).uuid().not_null())
                    .col(
                        ColumnDef::new(MigrationDef::MigrationKey)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MigrationDef::Name).string().not_null())
                    .col(ColumnDef::new(MigrationDef::Jira).string())
                    .col(ColumnDef::new(MigrationDef::Description).text())
                    .col(ColumnDef::new(MigrationDef::SqlUp).text().not_null())
                    .col(ColumnDef::new(MigrationDef::SqlDown).text())
                    .col(
                        ColumnDef::new(MigrationDef::ChecksumUp)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MigrationDef::ChecksumDown).string_len(64))
                    .col(
                        ColumnDef::new(MigrationDef::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(MigrationDef::TransactionMode)
                            .string_len(20)
                            .not_null()
                            .default("auto"),
                    )
                    .col(ColumnDef::new(MigrationDef::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(MigrationDef::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MigrationDef::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_migrations_project")
                            .from(MigrationDef::Table, MigrationDef::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_migrations_project_key")
                    .table(MigrationDef::Table)
                    .col(MigrationDef::ProjectId)
                    .col(MigrationDef::MigrationKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MigrationDef::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MigrationDef {
    #[sea_orm(iden = "migrations")]
    Table,
    Id,
    ProjectId,
    MigrationKey,
    Name,
    Jira,
    Description,
    SqlUp,
    SqlDown,
    ChecksumUp,
    ChecksumDown,
    Version,
    TransactionMode,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Project {
    #[sea_orm(iden = "projects")]
    Table,
    Id,
}
