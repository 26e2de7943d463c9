//! Priced entries inside a category, each with an optional picture.

pub mod repository;
pub mod repo;
pub mod service;

pub use service::{MenuItemService, NewItemInput};
