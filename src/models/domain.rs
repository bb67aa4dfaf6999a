use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DiscoveryError;

pub type UserId = i64;
pub type PetId = i64;
pub type InteractionId = i64;

/// Adoptable pet as supplied by the pet catalogue
///
/// Read-only for discovery: only `species`, `breed`, `age`, `fosterable`
/// and `at_risk` feed the score, the rest is carried for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub species: String,
    pub breed: String,
    pub age: i32,
    #[serde(default)]
    pub description: Option<String>,
    pub fosterable: bool,
    #[serde(rename = "atRisk")]
    pub at_risk: bool,
}

/// Age bucket used by both scoring and learning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBucket {
    Young,
    Adult,
    Mature,
    Senior,
}

impl AgeBucket {
    /// ≤2 young, 3-5 adult, 6-10 mature, >10 senior
    pub fn from_age(age: i32) -> Self {
        match age {
            i32::MIN..=2 => AgeBucket::Young,
            3..=5 => AgeBucket::Adult,
            6..=10 => AgeBucket::Mature,
            _ => AgeBucket::Senior,
        }
    }
}

/// Per-user learned preference weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceModel {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "speciesWeights", default)]
    pub species_weights: HashMap<String, f64>,
    #[serde(rename = "breedWeights", default)]
    pub breed_weights: HashMap<String, f64>,
    #[serde(rename = "weightYoung")]
    pub weight_young: f64,
    #[serde(rename = "weightAdult")]
    pub weight_adult: f64,
    #[serde(rename = "weightMature")]
    pub weight_mature: f64,
    #[serde(rename = "weightSenior")]
    pub weight_senior: f64,
    #[serde(rename = "fosterableWeight")]
    pub fosterable_weight: f64,
    #[serde(rename = "atRiskWeight")]
    pub at_risk_weight: f64,
    #[serde(rename = "totalSwipes")]
    pub total_swipes: u32,
}

/// Scalar weight a freshly reset model starts from
pub const NEUTRAL_WEIGHT: f64 = 1.0;

impl PreferenceModel {
    /// All-zero model for a user that has never swiped
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            species_weights: HashMap::new(),
            breed_weights: HashMap::new(),
            weight_young: 0.0,
            weight_adult: 0.0,
            weight_mature: 0.0,
            weight_senior: 0.0,
            fosterable_weight: 0.0,
            at_risk_weight: 0.0,
            total_swipes: 0,
        }
    }

    /// Restore the neutral baseline: empty maps, scalars at 1.0, no swipes
    pub fn reset(&mut self) {
        self.species_weights.clear();
        self.breed_weights.clear();
        self.weight_young = NEUTRAL_WEIGHT;
        self.weight_adult = NEUTRAL_WEIGHT;
        self.weight_mature = NEUTRAL_WEIGHT;
        self.weight_senior = NEUTRAL_WEIGHT;
        self.fosterable_weight = NEUTRAL_WEIGHT;
        self.at_risk_weight = NEUTRAL_WEIGHT;
        self.total_swipes = 0;
    }

    pub fn species_weight(&self, species: &str) -> f64 {
        self.species_weights
            .get(&normalize_key(species))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn breed_weight(&self, breed: &str) -> f64 {
        self.breed_weights
            .get(&normalize_key(breed))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn age_weight(&self, bucket: AgeBucket) -> f64 {
        match bucket {
            AgeBucket::Young => self.weight_young,
            AgeBucket::Adult => self.weight_adult,
            AgeBucket::Mature => self.weight_mature,
            AgeBucket::Senior => self.weight_senior,
        }
    }

    pub fn age_weight_mut(&mut self, bucket: AgeBucket) -> &mut f64 {
        match bucket {
            AgeBucket::Young => &mut self.weight_young,
            AgeBucket::Adult => &mut self.weight_adult,
            AgeBucket::Mature => &mut self.weight_mature,
            AgeBucket::Senior => &mut self.weight_senior,
        }
    }
}

/// Species and breed keys are stored lower-cased
#[inline]
pub fn normalize_key(value: &str) -> String {
    value.to_lowercase()
}

/// Swipe direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InteractionType {
    Like,
    Pass,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Like => "LIKE",
            InteractionType::Pass => "PASS",
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LIKE" => Ok(InteractionType::Like),
            "PASS" => Ok(InteractionType::Pass),
            _ => Err(DiscoveryError::InvalidArgument(format!(
                "interaction type must be LIKE or PASS, got {:?}",
                s
            ))),
        }
    }
}

/// Ledger entry for one swipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: InteractionId,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "petId")]
    pub pet_id: PetId,
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Interaction not yet assigned an id by the ledger
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub user_id: UserId,
    pub pet_id: PetId,
    pub interaction_type: InteractionType,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl NewInteraction {
    pub fn now(user_id: UserId, pet_id: PetId, interaction_type: InteractionType) -> Self {
        Self {
            user_id,
            pet_id,
            interaction_type,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Ranked discovery result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPet {
    #[serde(flatten)]
    pub pet: Pet,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
}

/// Scoring multipliers
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub species: f64,
    pub breed: f64,
    pub age: f64,
    pub fosterable: f64,
    pub at_risk: f64,
    pub tie_break: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            species: 3.0,
            breed: 2.0,
            age: 1.5,
            fosterable: 1.0,
            at_risk: 1.0,
            tie_break: 0.001,
        }
    }
}

/// Learning rates for the online preference update
#[derive(Debug, Clone, Copy)]
pub struct LearningRates {
    pub like: f64,
    pub pass: f64,
    pub breed_factor: f64,
    pub age_factor: f64,
    pub trait_factor: f64,
}

impl Default for LearningRates {
    fn default() -> Self {
        Self {
            like: 0.5,
            pass: -0.2,
            breed_factor: 0.5,
            age_factor: 0.3,
            trait_factor: 0.2,
        }
    }
}

/// Per-user ledger summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionStats {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub total: u64,
    pub likes: u64,
    pub passes: u64,
    #[serde(rename = "totalSwipes")]
    pub total_swipes: u32,
    #[serde(rename = "lastInteractionAt")]
    pub last_interaction_at: Option<chrono::DateTime<chrono::Utc>>,
}
