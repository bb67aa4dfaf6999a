use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex as SyncMutex};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::models::{Interaction, NewInteraction, Pet, PetId, PreferenceModel, UserId};
use crate::services::store::{
    DiscoveryStore, InteractionRepository, PetStore, PreferenceRepository, StoreError,
    UserTransaction,
};

#[derive(Debug, Default)]
struct MemoryState {
    pets: BTreeMap<PetId, Pet>,
    preferences: HashMap<UserId, PreferenceModel>,
    interactions: HashMap<UserId, Vec<Interaction>>,
}

type UserLocks = Arc<SyncMutex<HashMap<UserId, Arc<Mutex<()>>>>>;

/// In-process discovery store
///
/// Backs local runs and the test suite. Mutations are staged per user and
/// published on commit, so readers never observe half-applied swipes.
/// A user's lock entry lives only while a transaction holds or awaits it.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
    user_locks: UserLocks,
    next_interaction_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a pet catalogue
    pub async fn with_pets(pets: impl IntoIterator<Item = Pet>) -> Self {
        let store = Self::new();
        for pet in pets {
            store.insert_pet(pet).await;
        }
        store
    }

    /// Add or replace a pet in the catalogue
    pub async fn insert_pet(&self, pet: Pet) {
        self.state.write().await.pets.insert(pet.id, pet);
    }

    /// Delete a pet and cascade its interactions, like the catalogue's foreign key
    pub async fn remove_pet(&self, pet_id: PetId) -> Option<Pet> {
        let mut state = self.state.write().await;
        let removed = state.pets.remove(&pet_id);
        for ledger in state.interactions.values_mut() {
            ledger.retain(|i| i.pet_id != pet_id);
        }
        removed
    }

    pub async fn pet_count(&self) -> usize {
        self.state.read().await.pets.len()
    }

    fn next_id(&self) -> i64 {
        self.next_interaction_id.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn latest_for_pet(ledger: &[Interaction], pet_id: PetId) -> Option<&Interaction> {
    ledger
        .iter()
        .filter(|i| i.pet_id == pet_id)
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
}

fn pets_by_ids(pets: &BTreeMap<PetId, Pet>, pet_ids: &[PetId]) -> Vec<Pet> {
    pet_ids.iter().filter_map(|id| pets.get(id)).cloned().collect()
}

fn pets_excluding(pets: &BTreeMap<PetId, Pet>, excluded: &HashSet<PetId>) -> Vec<Pet> {
    pets.values()
        .filter(|pet| !excluded.contains(&pet.id))
        .cloned()
        .collect()
}

#[async_trait]
impl PetStore for MemoryStore {
    async fn find_by_id(&self, pet_id: PetId) -> Result<Option<Pet>, StoreError> {
        Ok(self.state.read().await.pets.get(&pet_id).cloned())
    }

    async fn find_by_ids(&self, pet_ids: &[PetId]) -> Result<Vec<Pet>, StoreError> {
        Ok(pets_by_ids(&self.state.read().await.pets, pet_ids))
    }

    async fn find_excluding(&self, excluded: &HashSet<PetId>) -> Result<Vec<Pet>, StoreError> {
        Ok(pets_excluding(&self.state.read().await.pets, excluded))
    }
}

#[async_trait]
impl PreferenceRepository for MemoryStore {
    async fn get(&self, user_id: UserId) -> Result<Option<PreferenceModel>, StoreError> {
        Ok(self.state.read().await.preferences.get(&user_id).cloned())
    }

    async fn save(&self, model: &PreferenceModel) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .preferences
            .insert(model.user_id, model.clone());
        Ok(())
    }
}

#[async_trait]
impl InteractionRepository for MemoryStore {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Interaction>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .interactions
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_latest(
        &self,
        user_id: UserId,
        pet_id: PetId,
    ) -> Result<Option<Interaction>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .interactions
            .get(&user_id)
            .and_then(|ledger| latest_for_pet(ledger, pet_id))
            .cloned())
    }

    async fn append(&self, interaction: NewInteraction) -> Result<Interaction, StoreError> {
        let stored = Interaction {
            id: self.next_id(),
            user_id: interaction.user_id,
            pet_id: interaction.pet_id,
            interaction_type: interaction.interaction_type,
            created_at: interaction.created_at,
        };
        self.state
            .write()
            .await
            .interactions
            .entry(stored.user_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn remove(&self, interaction: &Interaction) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let Some(ledger) = state.interactions.get_mut(&interaction.user_id) else {
            return Ok(false);
        };
        let before = ledger.len();
        ledger.retain(|i| i.id != interaction.id);
        Ok(ledger.len() < before)
    }

    async fn remove_all_by_user(&self, user_id: UserId) -> Result<u64, StoreError> {
        let removed = self.state.write().await.interactions.remove(&user_id);
        Ok(removed.map(|ledger| ledger.len() as u64).unwrap_or(0))
    }
}

#[async_trait]
impl DiscoveryStore for MemoryStore {
    async fn begin(&self, user_id: UserId) -> Result<Box<dyn UserTransaction>, StoreError> {
        let lock = {
            let mut locks = self
                .user_locks
                .lock()
                .map_err(|_| StoreError::Inconsistent("user lock table poisoned".to_string()))?;
            locks.entry(user_id).or_default().clone()
        };
        let guard = lock.lock_owned().await;

        let staged = {
            let state = self.state.read().await;
            Staged {
                preference: state.preferences.get(&user_id).cloned(),
                interactions: state.interactions.get(&user_id).cloned().unwrap_or_default(),
            }
        };

        Ok(Box::new(MemoryTransaction {
            user_id,
            store: self.clone(),
            staged: Mutex::new(staged),
            guard: Some(guard),
        }))
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[derive(Debug, Default)]
struct Staged {
    preference: Option<PreferenceModel>,
    interactions: Vec<Interaction>,
}

/// Staged copy of one user's model and ledger, holding that user's lock
pub struct MemoryTransaction {
    user_id: UserId,
    store: MemoryStore,
    staged: Mutex<Staged>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        let Ok(mut locks) = self.store.user_locks.lock() else {
            return;
        };
        // Release first so the table holds the last reference when nobody waits
        self.guard.take();
        if locks
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.user_id);
        }
    }
}

impl MemoryTransaction {
    fn check_user(&self, user_id: UserId) -> Result<(), StoreError> {
        if user_id != self.user_id {
            return Err(StoreError::Inconsistent(format!(
                "transaction for user {} cannot access user {}",
                self.user_id, user_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PetStore for MemoryTransaction {
    async fn find_by_id(&self, pet_id: PetId) -> Result<Option<Pet>, StoreError> {
        self.store.find_by_id(pet_id).await
    }

    async fn find_by_ids(&self, pet_ids: &[PetId]) -> Result<Vec<Pet>, StoreError> {
        self.store.find_by_ids(pet_ids).await
    }

    async fn find_excluding(&self, excluded: &HashSet<PetId>) -> Result<Vec<Pet>, StoreError> {
        self.store.find_excluding(excluded).await
    }
}

#[async_trait]
impl PreferenceRepository for MemoryTransaction {
    async fn get(&self, user_id: UserId) -> Result<Option<PreferenceModel>, StoreError> {
        self.check_user(user_id)?;
        Ok(self.staged.lock().await.preference.clone())
    }

    async fn save(&self, model: &PreferenceModel) -> Result<(), StoreError> {
        self.check_user(model.user_id)?;
        self.staged.lock().await.preference = Some(model.clone());
        Ok(())
    }
}

#[async_trait]
impl InteractionRepository for MemoryTransaction {
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Interaction>, StoreError> {
        self.check_user(user_id)?;
        Ok(self.staged.lock().await.interactions.clone())
    }

    async fn find_latest(
        &self,
        user_id: UserId,
        pet_id: PetId,
    ) -> Result<Option<Interaction>, StoreError> {
        self.check_user(user_id)?;
        let staged = self.staged.lock().await;
        Ok(latest_for_pet(&staged.interactions, pet_id).cloned())
    }

    async fn append(&self, interaction: NewInteraction) -> Result<Interaction, StoreError> {
        self.check_user(interaction.user_id)?;
        let stored = Interaction {
            id: self.store.next_id(),
            user_id: interaction.user_id,
            pet_id: interaction.pet_id,
            interaction_type: interaction.interaction_type,
            created_at: interaction.created_at,
        };
        self.staged.lock().await.interactions.push(stored.clone());
        Ok(stored)
    }

    async fn remove(&self, interaction: &Interaction) -> Result<bool, StoreError> {
        self.check_user(interaction.user_id)?;
        let mut staged = self.staged.lock().await;
        let before = staged.interactions.len();
        staged.interactions.retain(|i| i.id != interaction.id);
        Ok(staged.interactions.len() < before)
    }

    async fn remove_all_by_user(&self, user_id: UserId) -> Result<u64, StoreError> {
        self.check_user(user_id)?;
        let mut staged = self.staged.lock().await;
        let removed = staged.interactions.len() as u64;
        staged.interactions.clear();
        Ok(removed)
    }
}

#[async_trait]
impl UserTransaction for MemoryTransaction {
    fn user_id(&self) -> UserId {
        self.user_id
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut *self.staged.lock().await);
        let mut state = self.store.state.write().await;

        // Interactions on pets deleted while the transaction was open are dropped
        let pets = &state.pets;
        let interactions: Vec<Interaction> = staged
            .interactions
            .into_iter()
            .filter(|i| pets.contains_key(&i.pet_id))
            .collect();

        if interactions.is_empty() {
            state.interactions.remove(&self.user_id);
        } else {
            state.interactions.insert(self.user_id, interactions);
        }
        if let Some(preference) = staged.preference {
            state.preferences.insert(self.user_id, preference);
        }
        Ok(())
    }
}
