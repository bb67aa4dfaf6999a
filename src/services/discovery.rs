use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::{Learner, Ranker};
use crate::error::{DiscoveryError, Result};
use crate::models::{
    Interaction, InteractionStats, InteractionType, NewInteraction, Pet, PetId, PreferenceModel,
    ScoredPet, UserId,
};
use crate::services::cache::CacheManager;
use crate::services::store::DiscoveryStore;

/// Counts preference invalidations so a cache fill that raced with a
/// committed mutation can be detected and undone
#[derive(Debug, Default)]
struct InvalidationClock(AtomicU64);

impl InvalidationClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn unchanged_since(&self, seen: u64) -> bool {
        self.now() == seen
    }
}

/// Preference-adaptive discovery engine
///
/// Reads (`discover`, `liked_pets`, `preferences`, `stats`) go straight to the
/// store and may observe a slightly stale model. Every mutation runs inside a
/// per-user transaction so concurrent swipes of one user are serialised and
/// the ledger and model change together or not at all.
#[derive(Clone)]
pub struct DiscoveryService {
    store: Arc<dyn DiscoveryStore>,
    ranker: Ranker,
    learner: Learner,
    cache: Option<Arc<CacheManager>>,
    invalidations: Arc<InvalidationClock>,
}

impl DiscoveryService {
    pub fn new(store: Arc<dyn DiscoveryStore>, ranker: Ranker, learner: Learner) -> Self {
        Self {
            store,
            ranker,
            learner,
            cache: None,
            invalidations: Arc::default(),
        }
    }

    /// Cache preference models for the discovery read path
    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store(&self) -> &Arc<dyn DiscoveryStore> {
        &self.store
    }

    pub fn cache(&self) -> Option<&Arc<CacheManager>> {
        self.cache.as_ref()
    }

    /// Rank the pets the user has not swiped yet, best first
    pub async fn discover(&self, user_id: UserId) -> Result<Vec<ScoredPet>> {
        let model = self.load_model(user_id).await?;

        let excluded: HashSet<PetId> = self
            .store
            .list_by_user(user_id)
            .await?
            .into_iter()
            .map(|interaction| interaction.pet_id)
            .collect();

        let candidates = self.store.find_excluding(&excluded).await?;
        let result = self.ranker.rank(&model, candidates);

        tracing::info!(
            "Discovered {} pets for user {} (from {} candidates, {} excluded)",
            result.pets.len(),
            user_id,
            result.total_candidates,
            excluded.len()
        );

        Ok(result.pets)
    }

    /// Record a LIKE/PASS swipe and learn from it
    ///
    /// `raw_type` is matched case-insensitively against `LIKE` and `PASS`.
    pub async fn record_interaction(
        &self,
        user_id: UserId,
        pet_id: PetId,
        raw_type: &str,
    ) -> Result<Interaction> {
        let interaction_type: InteractionType = raw_type.parse()?;

        let tx = self.store.begin(user_id).await?;

        let pet = tx
            .find_by_id(pet_id)
            .await?
            .ok_or_else(|| DiscoveryError::NotFound(format!("Pet {} not found", pet_id)))?;

        let interaction = tx
            .append(NewInteraction::now(user_id, pet_id, interaction_type))
            .await?;

        let mut model = tx
            .get(user_id)
            .await?
            .unwrap_or_else(|| PreferenceModel::new(user_id));
        self.learner.apply(&mut model, &pet, interaction_type);
        tx.save(&model).await?;

        tx.commit().await?;
        self.invalidate(user_id).await;

        tracing::info!(
            "Recorded {} on pet {} for user {} ({} swipes)",
            interaction_type,
            pet_id,
            user_id,
            model.total_swipes
        );

        Ok(interaction)
    }

    /// Undo the most recent swipe on a pet and reverse what it taught the model
    pub async fn delete_interaction(&self, user_id: UserId, pet_id: PetId) -> Result<Interaction> {
        let tx = self.store.begin(user_id).await?;

        let interaction = tx.find_latest(user_id, pet_id).await?.ok_or_else(|| {
            DiscoveryError::NotFound(format!(
                "No interaction with pet {} for user {}",
                pet_id, user_id
            ))
        })?;

        tx.remove(&interaction).await?;

        let mut model = tx
            .get(user_id)
            .await?
            .unwrap_or_else(|| PreferenceModel::new(user_id));

        match tx.find_by_id(pet_id).await? {
            Some(pet) => self.learner.undo(&mut model, &pet, interaction.interaction_type),
            None => {
                tracing::warn!(
                    "Pet {} no longer exists; removing interaction {} without reversing weights",
                    pet_id,
                    interaction.id
                );
                model.total_swipes = model.total_swipes.saturating_sub(1);
            }
        }
        tx.save(&model).await?;

        tx.commit().await?;
        self.invalidate(user_id).await;

        tracing::info!(
            "Undid {} on pet {} for user {}",
            interaction.interaction_type,
            pet_id,
            user_id
        );

        Ok(interaction)
    }

    /// Clear the ledger and restore the neutral preference baseline
    pub async fn reset(&self, user_id: UserId) -> Result<()> {
        let tx = self.store.begin(user_id).await?;

        let removed = tx.remove_all_by_user(user_id).await?;

        let mut model = tx
            .get(user_id)
            .await?
            .unwrap_or_else(|| PreferenceModel::new(user_id));
        model.reset();
        tx.save(&model).await?;

        tx.commit().await?;
        self.invalidate(user_id).await;

        tracing::info!("Reset discovery for user {} ({} interactions removed)", user_id, removed);

        Ok(())
    }

    /// Pets the user liked, most recent first, each listed once
    pub async fn liked_pets(&self, user_id: UserId) -> Result<Vec<Pet>> {
        let ledger = self.store.list_by_user(user_id).await?;

        let mut seen = HashSet::new();
        let liked: Vec<PetId> = ledger
            .iter()
            .rev()
            .filter(|i| i.interaction_type == InteractionType::Like)
            .map(|i| i.pet_id)
            .filter(|pet_id| seen.insert(*pet_id))
            .collect();

        let mut by_id: HashMap<PetId, Pet> = self
            .store
            .find_by_ids(&liked)
            .await?
            .into_iter()
            .map(|pet| (pet.id, pet))
            .collect();

        Ok(liked.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Current preference model, all-zero if the user has none yet
    pub async fn preferences(&self, user_id: UserId) -> Result<PreferenceModel> {
        Ok(self
            .store
            .get(user_id)
            .await?
            .unwrap_or_else(|| PreferenceModel::new(user_id)))
    }

    pub async fn stats(&self, user_id: UserId) -> Result<InteractionStats> {
        let ledger = self.store.list_by_user(user_id).await?;
        let model = self.preferences(user_id).await?;

        let likes = ledger
            .iter()
            .filter(|i| i.interaction_type == InteractionType::Like)
            .count() as u64;

        Ok(InteractionStats {
            user_id,
            total: ledger.len() as u64,
            likes,
            passes: ledger.len() as u64 - likes,
            total_swipes: model.total_swipes,
            last_interaction_at: ledger.iter().map(|i| i.created_at).max(),
        })
    }

    /// Preference model for ranking, through the cache when one is configured
    ///
    /// A model read before a concurrent mutation committed is never left in
    /// this instance's cache. Mutations committed through another instance
    /// can still be served from its stale entry for up to the cache TTL.
    async fn load_model(&self, user_id: UserId) -> Result<PreferenceModel> {
        let Some(cache) = &self.cache else {
            return self.preferences(user_id).await;
        };

        match cache.get_preferences(user_id).await {
            Ok(Some(model)) => return Ok(model),
            Ok(None) => {}
            Err(e) => tracing::warn!("Preference cache lookup failed for {}: {}", user_id, e),
        }

        let seen = self.invalidations.now();
        let model = self.preferences(user_id).await?;
        self.fill_cache(cache, &model, seen).await;
        Ok(model)
    }

    /// Cache `model`, read when the clock showed `seen`, unless a mutation
    /// invalidated in between
    async fn fill_cache(&self, cache: &CacheManager, model: &PreferenceModel, seen: u64) {
        if !self.invalidations.unchanged_since(seen) {
            return;
        }
        if let Err(e) = cache.set_preferences(model).await {
            tracing::warn!("Failed to cache preferences for {}: {}", model.user_id, e);
            return;
        }
        // An invalidation may have landed between the check and the write
        if !self.invalidations.unchanged_since(seen) {
            tracing::debug!("Discarding stale cached preferences for {}", model.user_id);
            if let Err(e) = cache.invalidate_preferences(model.user_id).await {
                tracing::warn!("Failed to invalidate cache: {}", e);
            }
        }
    }

    async fn invalidate(&self, user_id: UserId) {
        self.invalidations.tick();
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.invalidate_preferences(user_id).await {
                tracing::warn!("Failed to invalidate cache: {}", e);
            }
        }
    }
}
