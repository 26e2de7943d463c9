//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access (repository traits with
//!   sea-orm and in-memory implementations).
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod assets;
pub mod auth;
pub mod category;
pub mod errors;
pub mod image_store;
pub mod menu;
pub mod menu_item;
pub mod mock;
pub mod records;
pub mod validation;
#[cfg(test)]
pub mod test_support;

pub use assets::{AssetCleaner, AssetSweeper};
pub use category::CategoryService;
pub use errors::ServiceError;
pub use menu::MenuService;
pub use menu_item::MenuItemService;
