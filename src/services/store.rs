//! Storage contracts consumed by the discovery engine
//!
//! The engine never talks to a database directly. It reads through
//! [`DiscoveryStore`] and performs every mutation inside a [`UserTransaction`]
//! that holds the user's lock until it is committed or dropped.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{Interaction, NewInteraction, Pet, PetId, PreferenceModel, UserId};

/// Errors raised by storage adapters
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Inconsistent store state: {0}")]
    Inconsistent(String),
}

/// Read access to the pet catalogue
#[async_trait]
pub trait PetStore: Send + Sync {
    async fn find_by_id(&self, pet_id: PetId) -> Result<Option<Pet>, StoreError>;

    /// Batch lookup; ids with no pet are skipped, order is unspecified
    async fn find_by_ids(&self, pet_ids: &[PetId]) -> Result<Vec<Pet>, StoreError>;

    /// All pets whose id is not in `excluded`, filtered by the store itself
    async fn find_excluding(&self, excluded: &HashSet<PetId>) -> Result<Vec<Pet>, StoreError>;
}

#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn get(&self, user_id: UserId) -> Result<Option<PreferenceModel>, StoreError>;

    async fn save(&self, model: &PreferenceModel) -> Result<(), StoreError>;
}

/// Append/remove ledger of swipes
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Oldest first
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Interaction>, StoreError>;

    async fn find_latest(
        &self,
        user_id: UserId,
        pet_id: PetId,
    ) -> Result<Option<Interaction>, StoreError>;

    async fn append(&self, interaction: NewInteraction) -> Result<Interaction, StoreError>;

    async fn remove(&self, interaction: &Interaction) -> Result<bool, StoreError>;

    async fn remove_all_by_user(&self, user_id: UserId) -> Result<u64, StoreError>;
}

/// Unit of work scoped to a single user
///
/// Holds the per-user lock. Changes become visible on [`UserTransaction::commit`];
/// dropping the transaction discards them.
#[async_trait]
pub trait UserTransaction: PetStore + PreferenceRepository + InteractionRepository {
    fn user_id(&self) -> UserId;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Full storage backend used by the discovery service
#[async_trait]
pub trait DiscoveryStore: PetStore + PreferenceRepository + InteractionRepository {
    /// Open a transaction holding `user_id`'s lock, waiting for it if needed
    async fn begin(&self, user_id: UserId) -> Result<Box<dyn UserTransaction>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
