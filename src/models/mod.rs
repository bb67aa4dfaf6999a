// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    normalize_key, AgeBucket, Interaction, InteractionId, InteractionStats, InteractionType,
    LearningRates, NewInteraction, Pet, PetId, PreferenceModel, ScoredPet, ScoringWeights, UserId,
    NEUTRAL_WEIGHT,
};
pub use requests::InteractRequest;
pub use responses::{DiscoverResponse, ErrorResponse, HealthResponse, LikedPetsResponse};
