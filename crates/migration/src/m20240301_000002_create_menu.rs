//! Create `menu` table, owned by a user.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Menu::Table)
                    .if_not_exists()
                    .col(uuid(Menu::Id).primary_key())
                    .col(uuid(Menu::UserId).not_null())
                    .col(string_len(Menu::Name, 100).not_null())
                    .col(text_null(Menu::Description))
                    .col(timestamp_with_time_zone(Menu::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Menu::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_user")
                            .from(Menu::Table, Menu::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Menu::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Menu {
    Table,
    Id,
    UserId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
