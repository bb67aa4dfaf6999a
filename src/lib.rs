//! Petch Discovery - preference-adaptive pet discovery engine
//!
//! Ranks adoptable pets for a user from a preference model that is learned
//! from their LIKE/PASS swipes, and keeps that model consistent with the
//! swipe ledger under undo, reset and concurrent requests.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{calculate_pet_score, Learner, Ranker, DEFAULT_DISCOVERY_LIMIT};
pub use error::{DiscoveryError, Result};
pub use models::{
    Interaction, InteractionType, LearningRates, Pet, PreferenceModel, ScoredPet, ScoringWeights,
};
pub use services::{DiscoveryService, DiscoveryStore, MemoryStore, PostgresStore};
