use crate::models::{AgeBucket, Pet, PreferenceModel, ScoringWeights};

/// Score a pet against a user's preference model
///
/// Scoring formula (with default weights):
/// score = (
///     species_weight * 3 +
///     breed_weight * 2 +
///     age_bucket_weight * 1.5 +
///     fosterable_weight         # only if the pet is fosterable
///     at_risk_weight            # only if the pet is at risk
/// ) + (id mod 100) * 0.001      # deterministic tie-break
///
/// Missing species/breed entries count as zero. The function is pure, so the
/// same model and pet always produce the same score.
pub fn calculate_pet_score(pet: &Pet, model: &PreferenceModel, weights: &ScoringWeights) -> f64 {
    let mut score = 0.0;

    score += model.species_weight(&pet.species) * weights.species;
    score += model.breed_weight(&pet.breed) * weights.breed;
    score += model.age_weight(AgeBucket::from_age(pet.age)) * weights.age;

    if pet.fosterable {
        score += model.fosterable_weight * weights.fosterable;
    }
    if pet.at_risk {
        score += model.at_risk_weight * weights.at_risk;
    }

    score + tie_break(pet.id, weights.tie_break)
}

/// Stable per-pet offset so equally preferred pets keep a fixed order
#[inline]
fn tie_break(pet_id: i64, step: f64) -> f64 {
    pet_id.rem_euclid(100) as f64 * step
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_pet(id: i64, species: &str, breed: &str, age: i32) -> Pet {
        Pet {
            id,
            name: format!("Pet {}", id),
            species: species.to_string(),
            breed: breed.to_string(),
            age,
            description: None,
            fosterable: false,
            at_risk: false,
        }
    }

    #[test]
    fn test_empty_model_scores_tie_break_only() {
        let model = PreferenceModel::new(1);
        let weights = ScoringWeights::default();

        let score = calculate_pet_score(&create_test_pet(42, "Dog", "Beagle", 4), &model, &weights);
        assert!((score - 0.042).abs() < 1e-12);
    }

    #[test]
    fn test_full_formula() {
        let mut model = PreferenceModel::new(1);
        model.species_weights.insert("cat".to_string(), 1.0);
        model.breed_weights.insert("siamese".to_string(), 0.5);
        model.weight_mature = 2.0;
        model.fosterable_weight = 0.25;
        model.at_risk_weight = 0.75;

        let mut pet = create_test_pet(205, "Cat", "SIAMESE", 8);
        pet.fosterable = true;
        pet.at_risk = true;

        // 3 + 1 + 3 + 0.25 + 0.75 + 0.005
        let score = calculate_pet_score(&pet, &model, &ScoringWeights::default());
        assert!((score - 8.005).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_flags_ignored_when_false() {
        let mut model = PreferenceModel::new(1);
        model.fosterable_weight = 10.0;
        model.at_risk_weight = 10.0;

        let score = calculate_pet_score(&create_test_pet(100, "Dog", "Pug", 1), &model, &ScoringWeights::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_tie_break_never_negative() {
        assert!(tie_break(-3, 0.001) >= 0.0);
        assert!((tie_break(199, 0.001) - 0.099).abs() < 1e-12);
    }
}
