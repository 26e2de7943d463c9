//! Create `user` table.
//! One row per signed-in identity; (provider, provider_subject) is unique.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 320).not_null())
                    .col(string_len(User::Name, 200).not_null())
                    .col(string_len_null(User::Image, 1024))
                    .col(string_len(User::Provider, 32).not_null())
                    .col(string_len(User::ProviderSubject, 255).not_null())
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_provider_subject")
                    .table(User::Table)
                    .col(User::Provider)
                    .col(User::ProviderSubject)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    Name,
    Image,
    Provider,
    ProviderSubject,
    CreatedAt,
    UpdatedAt,
}
