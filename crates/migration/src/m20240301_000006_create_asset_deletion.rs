//! Create `asset_deletion` table.
//! Outbox of image-store paths whose database rows are already gone.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AssetDeletion::Table)
                    .if_not_exists()
                    .col(uuid(AssetDeletion::Id).primary_key())
                    .col(string_len(AssetDeletion::Path, 1024).not_null().unique_key())
                    .col(integer(AssetDeletion::Attempts).not_null().default(0))
                    .col(text_null(AssetDeletion::LastError))
                    .col(timestamp_with_time_zone(AssetDeletion::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AssetDeletion::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AssetDeletion {
    Table,
    Id,
    Path,
    Attempts,
    LastError,
    CreatedAt,
}
