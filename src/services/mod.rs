pub mod catalog;
pub mod ratings;
pub mod recommendations;

pub use recommendations::RecommendationService;
