// Core algorithm exports
pub mod learning;
pub mod ranker;
pub mod scoring;

pub use learning::Learner;
pub use ranker::{RankResult, Ranker, DEFAULT_DISCOVERY_LIMIT};
pub use scoring::calculate_pet_score;
