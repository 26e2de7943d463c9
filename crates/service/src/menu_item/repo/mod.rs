pub mod seaorm;

pub use seaorm::SeaOrmMenuItemRepository;
