//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_user;
mod m20240301_000002_create_menu;
mod m20240301_000003_create_image;
mod m20240301_000004_create_category;
mod m20240301_000005_create_menu_item;
mod m20240301_000006_create_asset_deletion;
mod m20240301_000007_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_user::Migration),
            Box::new(m20240301_000002_create_menu::Migration),
            Box::new(m20240301_000003_create_image::Migration),
            Box::new(m20240301_000004_create_category::Migration),
            Box::new(m20240301_000005_create_menu_item::Migration),
            Box::new(m20240301_000006_create_asset_deletion::Migration),
            // Indexes should always be applied last
            Box::new(m20240301_000007_add_indexes::Migration),
        ]
    }
}
