//! Create db_targets table. Passwords are stored sealed (secret-box bytes).

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DbTarget::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DbTarget::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(DbTarget::DbSetId).uuid().not_null())
                    .col(ColumnDef::new(DbTarget::Engine).string_len(10).not_null())
                    .col(ColumnDef::new(DbTarget::Host).string().not_null())
                    .col(ColumnDef::new(DbTarget::Port).integer().not_null())
                    .col(ColumnDef::new(DbTarget::Dbname).string().not_null())
                    .col(ColumnDef::new(DbTarget::Username).string().not_null())
                    .col(ColumnDef::new(DbTarget::PasswordEnc).binary().not_null())
                    .col(ColumnDef::new(DbTarget::Options).json_binary().not_null())
                    .col(
                        ColumnDef::new(DbTarget::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DbTarget::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_db_targets_db_set")
                            .from(DbTarget::Table, DbTarget::DbSetId)
                            .to(DbSet::Table, DbSet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_db_targets_db_set")
                    .table(DbTarget::Table)
                    .col(DbTarget::DbSetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DbTarget::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DbTarget {
    #[sea_orm(iden = "db_targets")]
    Table,
    Id,
    DbSetId,
    Engine,
    Host,
    Port,
    Dbname,
    Username,
    PasswordEnc,
    Options,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DbSet {
    #[sea_orm(iden = "db_sets")]
    Table,
    Id,
}
