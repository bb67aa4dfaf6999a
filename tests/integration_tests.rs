// Integration tests for the discovery service over the in-memory store

use petch_discovery::config::Settings;
use petch_discovery::core::{Learner, Ranker};
use petch_discovery::error::DiscoveryError;
use petch_discovery::models::{InteractionType, Pet, PreferenceModel, NEUTRAL_WEIGHT};
use petch_discovery::services::{demo_pets, DiscoveryService, MemoryStore};
use std::sync::Arc;

const EPSILON: f64 = 1e-9;

fn create_pet(id: i64, species: &str, breed: &str, age: i32) -> Pet {
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

async fn setup(pets: Vec<Pet>) -> (DiscoveryService, MemoryStore) {
    let store = MemoryStore::with_pets(pets).await;
    let service =
        DiscoveryService::new(Arc::new(store.clone()), Ranker::default(), Learner::default());
    (service, store)
}

fn ids(pets: &[petch_discovery::models::ScoredPet]) -> Vec<i64> {
    pets.iter().map(|p| p.pet.id).collect()
}

fn assert_models_close(a: &PreferenceModel, b: &PreferenceModel) {
    assert_eq!(a.total_swipes, b.total_swipes);
    for key in a.species_weights.keys().chain(b.species_weights.keys()) {
        assert!((a.species_weight(key) - b.species_weight(key)).abs() < EPSILON);
    }
    for key in a.breed_weights.keys().chain(b.breed_weights.keys()) {
        assert!((a.breed_weight(key) - b.breed_weight(key)).abs() < EPSILON);
    }
    assert!((a.weight_young - b.weight_young).abs() < EPSILON);
    assert!((a.weight_adult - b.weight_adult).abs() < EPSILON);
    assert!((a.weight_mature - b.weight_mature).abs() < EPSILON);
    assert!((a.weight_senior - b.weight_senior).abs() < EPSILON);
    assert!((a.fosterable_weight - b.fosterable_weight).abs() < EPSILON);
    assert!((a.at_risk_weight - b.at_risk_weight).abs() < EPSILON);
}

#[tokio::test]
async fn test_first_discover_orders_by_tie_break() {
    let (service, _) = setup(vec![
        create_pet(1, "Dog", "Labrador", 3),
        create_pet(2, "Cat", "Siamese", 8),
    ])
    .await;

    let pets = service.discover(7).await.unwrap();

    assert_eq!(ids(&pets), vec![2, 1]);
    assert!((pets[0].match_score - 0.002).abs() < EPSILON);
}

#[tokio::test]
async fn test_like_updates_model_and_excludes_pet() {
    let (service, _) = setup(vec![
        create_pet(1, "Dog", "Labrador", 3),
        create_pet(2, "Cat", "Siamese", 8),
    ])
    .await;

    let interaction = service.record_interaction(7, 1, "LIKE").await.unwrap();
    assert_eq!(interaction.pet_id, 1);
    assert_eq!(interaction.interaction_type, InteractionType::Like);

    let model = service.preferences(7).await.unwrap();
    assert!((model.species_weight("dog") - 0.5).abs() < EPSILON);
    assert!((model.breed_weight("labrador") - 0.25).abs() < EPSILON);
    assert!((model.weight_adult - 0.15).abs() < EPSILON);
    assert_eq!(model.total_swipes, 1);

    assert_eq!(ids(&service.discover(7).await.unwrap()), vec![2]);
}

#[tokio::test]
async fn test_discover_is_deterministic() {
    let (service, _) = setup(demo_pets(120)).await;

    service.record_interaction(3, 5, "like").await.unwrap();
    service.record_interaction(3, 8, "pass").await.unwrap();

    let first = service.discover(3).await.unwrap();
    let second = service.discover(3).await.unwrap();

    assert_eq!(ids(&first), ids(&second));
}

#[tokio::test]
async fn test_discover_returns_at_most_fifty() {
    let (service, _) = setup(demo_pets(120)).await;

    let pets = service.discover(1).await.unwrap();

    assert_eq!(pets.len(), 50);
    assert!(pets.windows(2).all(|w| w[0].match_score >= w[1].match_score));
}

#[tokio::test]
async fn test_configured_limit_above_fifty_is_capped() {
    let settings: Settings = config::Config::builder()
        .add_source(config::File::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 8080

            [discovery]
            limit = 120
            "#,
            config::FileFormat::Toml,
        ))
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap();

    let store = MemoryStore::with_pets(demo_pets(120)).await;
    let service = DiscoveryService::new(
        Arc::new(store),
        Ranker::new(settings.scoring_weights(), settings.discovery.limit),
        Learner::new(settings.learning_rates()),
    );

    assert_eq!(service.discover(1).await.unwrap().len(), 50);
}

#[tokio::test]
async fn test_discover_excludes_every_swiped_pet() {
    let (service, _) = setup(demo_pets(10)).await;

    for pet_id in [1, 2, 3] {
        service.record_interaction(1, pet_id, "PASS").await.unwrap();
    }

    let pets = service.discover(1).await.unwrap();
    assert_eq!(pets.len(), 7);
    assert!(pets.iter().all(|p| p.pet.id > 3));

    // Other users are unaffected
    assert_eq!(service.discover(2).await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_discover_with_empty_catalogue() {
    let (service, _) = setup(vec![]).await;

    assert!(service.discover(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_undo_restores_prior_model() {
    let pets = vec![
        create_pet(1, "Dog", "Labrador", 3),
        Pet {
            fosterable: true,
            at_risk: true,
            ..create_pet(2, "Cat", "Siamese", 12)
        },
    ];
    let (service, _) = setup(pets).await;

    service.record_interaction(4, 1, "LIKE").await.unwrap();
    let before = service.preferences(4).await.unwrap();

    service.record_interaction(4, 2, "PASS").await.unwrap();
    let removed = service.delete_interaction(4, 2).await.unwrap();
    assert_eq!(removed.pet_id, 2);

    let after = service.preferences(4).await.unwrap();
    assert_models_close(&before, &after);

    // Pet becomes discoverable again
    assert_eq!(ids(&service.discover(4).await.unwrap()), vec![2]);
}

#[tokio::test]
async fn test_undo_without_interaction_is_not_found() {
    let (service, _) = setup(vec![create_pet(1, "Dog", "Pug", 1)]).await;

    let err = service.delete_interaction(4, 1).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::NotFound(_)));
    assert!(service.store().get(4).await.unwrap().is_none());
}

#[tokio::test]
async fn test_undo_removes_latest_of_repeated_swipes() {
    let (service, _) = setup(vec![create_pet(1, "Dog", "Pug", 1)]).await;

    let first = service.record_interaction(4, 1, "LIKE").await.unwrap();
    let second = service.record_interaction(4, 1, "PASS").await.unwrap();

    let removed = service.delete_interaction(4, 1).await.unwrap();
    assert_eq!(removed.id, second.id);

    let ledger = service.store().list_by_user(4).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].id, first.id);

    let model = service.preferences(4).await.unwrap();
    assert_eq!(model.total_swipes, 1);
    assert!((model.species_weight("dog") - 0.5).abs() < EPSILON);
}

#[tokio::test]
async fn test_total_swipes_never_negative() {
    let (service, _) = setup(vec![create_pet(1, "Dog", "Pug", 1)]).await;

    service.record_interaction(4, 1, "LIKE").await.unwrap();
    service.delete_interaction(4, 1).await.unwrap();
    assert!(service.delete_interaction(4, 1).await.is_err());

    assert_eq!(service.preferences(4).await.unwrap().total_swipes, 0);
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let (service, _) = setup(demo_pets(20)).await;

    service.record_interaction(9, 1, "LIKE").await.unwrap();
    service.record_interaction(9, 2, "PASS").await.unwrap();

    service.reset(9).await.unwrap();
    let once = service.preferences(9).await.unwrap();
    service.reset(9).await.unwrap();
    let twice = service.preferences(9).await.unwrap();

    assert_eq!(once, twice);
    assert!(once.species_weights.is_empty());
    assert!(once.breed_weights.is_empty());
    assert_eq!(once.weight_young, NEUTRAL_WEIGHT);
    assert_eq!(once.at_risk_weight, NEUTRAL_WEIGHT);
    assert_eq!(once.total_swipes, 0);

    assert!(service.store().list_by_user(9).await.unwrap().is_empty());
    assert_eq!(service.discover(9).await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_reset_without_history_creates_baseline() {
    let (service, _) = setup(vec![]).await;

    service.reset(11).await.unwrap();

    let model = service.store().get(11).await.unwrap().unwrap();
    assert_eq!(model.fosterable_weight, NEUTRAL_WEIGHT);
}

#[tokio::test]
async fn test_liked_pets_most_recent_first() {
    let (service, _) = setup(demo_pets(10)).await;

    service.record_interaction(2, 3, "LIKE").await.unwrap();
    service.record_interaction(2, 4, "PASS").await.unwrap();
    service.record_interaction(2, 5, "LIKE").await.unwrap();

    let liked: Vec<i64> = service
        .liked_pets(2)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();

    assert_eq!(liked, vec![5, 3]);
}

#[tokio::test]
async fn test_removed_pet_drops_out_of_discovery() {
    let (service, store) = setup(demo_pets(5)).await;

    service.record_interaction(2, 1, "LIKE").await.unwrap();
    store.remove_pet(1).await;
    store.remove_pet(2).await;

    assert!(service.liked_pets(2).await.unwrap().is_empty());
    assert!(service.discover(2).await.unwrap().iter().all(|p| p.pet.id > 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_swipes_are_serialised() {
    let (service, _) = setup(demo_pets(40)).await;

    let handles: Vec<_> = (1..=40)
        .map(|pet_id| {
            let service = service.clone();
            let kind = if pet_id % 2 == 0 { "LIKE" } else { "PASS" };
            tokio::spawn(async move { service.record_interaction(6, pet_id, kind).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let model = service.preferences(6).await.unwrap();
    assert_eq!(model.total_swipes, 40);
    assert_eq!(service.store().list_by_user(6).await.unwrap().len(), 40);
    assert!(service.discover(6).await.unwrap().is_empty());

    // Sequential replay of the same swipes yields the same model
    let (replay, _) = setup(demo_pets(40)).await;
    for pet_id in 1..=40 {
        let kind = if pet_id % 2 == 0 { "LIKE" } else { "PASS" };
        replay.record_interaction(6, pet_id, kind).await.unwrap();
    }
    assert_models_close(&model, &replay.preferences(6).await.unwrap());
}
