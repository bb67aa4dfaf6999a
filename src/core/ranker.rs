use crate::core::scoring::calculate_pet_score;
use crate::models::{Pet, PreferenceModel, ScoredPet, ScoringWeights};

/// Maximum (and default) number of pets returned by one discovery call
pub const DEFAULT_DISCOVERY_LIMIT: usize = 50;

/// Result of the ranking process
#[derive(Debug)]
pub struct RankResult {
    pub pets: Vec<ScoredPet>,
    pub total_candidates: usize,
}

/// Ranks a candidate pool against a preference model
///
/// Candidates are expected to be pre-filtered by the pet store (already
/// interacted pets excluded). Ranking is fully deterministic: scores are
/// compared with a total order and exact ties fall back to the pet id.
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: ScoringWeights,
    limit: usize,
}

impl Ranker {
    /// `limit` is capped at [`DEFAULT_DISCOVERY_LIMIT`]; it can only shrink the page
    pub fn new(weights: ScoringWeights, limit: usize) -> Self {
        Self {
            weights,
            limit: limit.min(DEFAULT_DISCOVERY_LIMIT),
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), DEFAULT_DISCOVERY_LIMIT)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Score, sort descending and keep the top `limit` candidates
    pub fn rank(&self, model: &PreferenceModel, candidates: Vec<Pet>) -> RankResult {
        let total_candidates = candidates.len();

        let mut scored: Vec<ScoredPet> = candidates
            .into_iter()
            .map(|pet| {
                let match_score = calculate_pet_score(&pet, model, &self.weights);
                ScoredPet { pet, match_score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.match_score
                .total_cmp(&a.match_score)
                .then_with(|| a.pet.id.cmp(&b.pet.id))
        });

        scored.truncate(self.limit);

        RankResult {
            pets: scored,
            total_candidates,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::with_default_weights()
    }
}
