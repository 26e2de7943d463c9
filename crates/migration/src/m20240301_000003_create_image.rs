//! Create `image` table.
//! Holds the storage path handed back by the image store plus its fingerprint.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Image::Table)
                    .if_not_exists()
                    .col(uuid(Image::Id).primary_key())
                    .col(uuid(Image::UserId).not_null())
                    .col(string_len(Image::Path, 1024).not_null())
                    .col(string_len_null(Image::BlurHash, 128))
                    .col(string_len_null(Image::DominantColor, 16))
                    .col(timestamp_with_time_zone(Image::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_image_user")
                            .from(Image::Table, Image::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Image::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Image {
    Table,
    Id,
    UserId,
    Path,
    BlurHash,
    DominantColor,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
