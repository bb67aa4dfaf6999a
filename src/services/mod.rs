// Service exports
pub mod cache;
pub mod discovery;
pub mod memory;
pub mod postgres;
pub mod seed;
pub mod store;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use discovery::DiscoveryService;
pub use memory::MemoryStore;
pub use postgres::{PgInteractionType, PostgresStore};
pub use seed::demo_pets;
pub use store::{
    DiscoveryStore, InteractionRepository, PetStore, PreferenceRepository, StoreError,
    UserTransaction,
};
