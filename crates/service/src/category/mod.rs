//! Categories: named, ordered groups of items inside a menu.

pub mod repository;
pub mod repo;
pub mod service;

pub use service::CategoryService;
