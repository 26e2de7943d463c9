pub mod seaorm;

pub use seaorm::SeaOrmMenuRepository;
