pub mod errors;
pub mod db;
pub mod user;
pub mod menu;
pub mod image;
pub mod category;
pub mod menu_item;
pub mod asset_deletion;

#[cfg(test)]
mod tests;
