//! Menus: the top-level container a user builds.

pub mod repository;
pub mod repo;
pub mod service;

pub use service::MenuService;
