//! Create `menu_item` table.
//! Items belong to exactly one category and may point at an `image` row.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MenuItem::Table)
                    .if_not_exists()
                    .col(uuid(MenuItem::Id).primary_key())
                    .col(uuid(MenuItem::CategoryId).not_null())
                    .col(uuid(MenuItem::UserId).not_null())
                    .col(string_len(MenuItem::Name, 100).not_null())
                    .col(text_null(MenuItem::Description))
                    .col(big_integer(MenuItem::Price).not_null())
                    .col(integer(MenuItem::Position).not_null())
                    .col(uuid_null(MenuItem::ImageId))
                    .col(timestamp_with_time_zone(MenuItem::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(MenuItem::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_item_category")
                            .from(MenuItem::Table, MenuItem::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_item_user")
                            .from(MenuItem::Table, MenuItem::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menu_item_image")
                            .from(MenuItem::Table, MenuItem::ImageId)
                            .to(Image::Table, Image::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MenuItem::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MenuItem {
    Table,
    Id,
    CategoryId,
    UserId,
    Name,
    Description,
    Price,
    Position,
    ImageId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Category { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Image { Table, Id }
