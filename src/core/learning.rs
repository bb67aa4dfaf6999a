use crate::models::{normalize_key, AgeBucket, InteractionType, LearningRates, Pet, PreferenceModel};

/// Online preference learner
///
/// Applies a first-order additive update to a [`PreferenceModel`] for every
/// swipe and can reverse it exactly. Weights are unbounded: there is no decay
/// and no normalisation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Learner {
    rates: LearningRates,
}

impl Learner {
    pub fn new(rates: LearningRates) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &LearningRates {
        &self.rates
    }

    /// Base learning rate for a swipe direction (+0.5 like, -0.2 pass by default)
    #[inline]
    pub fn learning_rate(&self, interaction_type: InteractionType) -> f64 {
        match interaction_type {
            InteractionType::Like => self.rates.like,
            InteractionType::Pass => self.rates.pass,
        }
    }

    /// Learn from a swipe and count it
    pub fn apply(&self, model: &mut PreferenceModel, pet: &Pet, interaction_type: InteractionType) {
        let rate = self.learning_rate(interaction_type);
        self.adjust_weights(model, pet, rate);
        model.total_swipes = model.total_swipes.saturating_add(1);
    }

    /// Reverse a previous [`Learner::apply`] for the same pet and type
    pub fn undo(&self, model: &mut PreferenceModel, pet: &Pet, interaction_type: InteractionType) {
        let reverse_rate = -self.learning_rate(interaction_type);
        self.adjust_weights(model, pet, reverse_rate);
        model.total_swipes = model.total_swipes.saturating_sub(1);
    }

    fn adjust_weights(&self, model: &mut PreferenceModel, pet: &Pet, rate: f64) {
        *model
            .species_weights
            .entry(normalize_key(&pet.species))
            .or_insert(0.0) += rate;
        *model
            .breed_weights
            .entry(normalize_key(&pet.breed))
            .or_insert(0.0) += rate * self.rates.breed_factor;

        *model.age_weight_mut(AgeBucket::from_age(pet.age)) += rate * self.rates.age_factor;

        if pet.fosterable {
            model.fosterable_weight += rate * self.rates.trait_factor;
        }
        if pet.at_risk {
            model.at_risk_weight += rate * self.rates.trait_factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn labrador() -> Pet {
        Pet {
            id: 1,
            name: "Buddy".to_string(),
            species: "Dog".to_string(),
            breed: "Labrador".to_string(),
            age: 3,
            description: None,
            fosterable: false,
            at_risk: false,
        }
    }

    #[test]
    fn test_like_updates_weights() {
        let learner = Learner::default();
        let mut model = PreferenceModel::new(1);

        learner.apply(&mut model, &labrador(), InteractionType::Like);

        assert!((model.species_weights["dog"] - 0.5).abs() < EPSILON);
        assert!((model.breed_weights["labrador"] - 0.25).abs() < EPSILON);
        assert!((model.weight_adult - 0.15).abs() < EPSILON);
        assert_eq!(model.weight_young, 0.0);
        assert_eq!(model.fosterable_weight, 0.0);
        assert_eq!(model.total_swipes, 1);
    }

    #[test]
    fn test_pass_updates_flags() {
        let learner = Learner::default();
        let mut model = PreferenceModel::new(1);
        let mut pet = labrador();
        pet.age = 12;
        pet.fosterable = true;
        pet.at_risk = true;

        learner.apply(&mut model, &pet, InteractionType::Pass);

        assert!((model.species_weights["dog"] + 0.2).abs() < EPSILON);
        assert!((model.breed_weights["labrador"] + 0.1).abs() < EPSILON);
        assert!((model.weight_senior + 0.06).abs() < EPSILON);
        assert!((model.fosterable_weight + 0.04).abs() < EPSILON);
        assert!((model.at_risk_weight + 0.04).abs() < EPSILON);
    }

    #[test]
    fn test_undo_restores_model() {
        let learner = Learner::default();
        let mut model = PreferenceModel::new(1);
        model.reset();
        let before = model.clone();

        let mut pet = labrador();
        pet.fosterable = true;

        learner.apply(&mut model, &pet, InteractionType::Like);
        learner.undo(&mut model, &pet, InteractionType::Like);

        assert!((model.species_weights["dog"]).abs() < EPSILON);
        assert!((model.weight_adult - before.weight_adult).abs() < EPSILON);
        assert!((model.fosterable_weight - before.fosterable_weight).abs() < EPSILON);
        assert_eq!(model.total_swipes, before.total_swipes);
    }

    #[test]
    fn test_undo_never_drops_swipes_below_zero() {
        let learner = Learner::default();
        let mut model = PreferenceModel::new(1);

        learner.undo(&mut model, &labrador(), InteractionType::Pass);
        learner.undo(&mut model, &labrador(), InteractionType::Pass);

        assert_eq!(model.total_swipes, 0);
    }
}
