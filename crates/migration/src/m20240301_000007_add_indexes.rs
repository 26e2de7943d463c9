//! Lookup indexes for owner-scoped and ordered queries.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_menu_user")
                    .table(Menu::Table)
                    .col(Menu::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_category_menu_position")
                    .table(Category::Table)
                    .col(Category::MenuId)
                    .col(Category::Position)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_category_user")
                    .table(Category::Table)
                    .col(Category::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_menu_item_category_position")
                    .table(MenuItem::Table)
                    .col(MenuItem::CategoryId)
                    .col(MenuItem::Position)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_asset_deletion_created")
                    .table(AssetDeletion::Table)
                    .col(AssetDeletion::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_asset_deletion_created").table(AssetDeletion::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_menu_item_category_position").table(MenuItem::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_category_user").table(Category::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_category_menu_position").table(Category::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_menu_user").table(Menu::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Menu { Table, UserId }

#[derive(DeriveIden)]
enum Category { Table, MenuId, UserId, Position }

#[derive(DeriveIden)]
enum MenuItem { Table, CategoryId, Position }

#[derive(DeriveIden)]
enum AssetDeletion { Table, CreatedAt }
