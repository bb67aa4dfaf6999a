use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use petch_discovery::config::{Settings, StorageBackend};
use petch_discovery::core::{Learner, Ranker};
use petch_discovery::routes::{self, AppState};
use petch_discovery::services::{
    demo_pets, CacheManager, DiscoveryService, DiscoveryStore, MemoryStore, PostgresStore,
};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(default_level: &str, default_format: &str) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| default_level.to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| default_format.to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

async fn build_store(settings: &Settings) -> io::Result<Arc<dyn DiscoveryStore>> {
    match settings.storage.backend {
        StorageBackend::Postgres => {
            let db = &settings.database;
            let store = PostgresStore::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                io::Error::new(io::ErrorKind::Other, e)
            })?;

            info!(
                "PostgreSQL store initialized (max: {} connections)",
                db.max_connections.unwrap_or(10)
            );
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            let store = MemoryStore::with_pets(demo_pets(settings.storage.seed_demo_pets)).await;
            warn!(
                "Using in-memory store with {} demo pets; data is lost on restart",
                store.pet_count().await
            );
            Ok(Arc::new(store))
        }
    }
}

/// Cache is optional: the service runs against the store alone without it
async fn build_cache(settings: &Settings) -> Option<Arc<CacheManager>> {
    if !settings.cache.enabled {
        return None;
    }

    let ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_size = settings.cache.l1_cache_size.unwrap_or(1000);

    match CacheManager::new(&settings.cache.redis_url, l1_size, ttl).await {
        Ok(cache) => {
            info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_size, ttl);
            Some(Arc::new(cache))
        }
        Err(e) => {
            error!("Failed to connect to Redis ({}), running without cache", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    init_logging(&settings.logging.level, &settings.logging.format);

    info!("Starting Petch discovery service...");

    let store = build_store(&settings).await?;

    let weights = settings.scoring_weights();
    let ranker = Ranker::new(weights, settings.discovery.limit);
    let learner = Learner::new(settings.learning_rates());

    info!(
        "Ranker initialized with weights: {:?} (limit {})",
        weights, settings.discovery.limit
    );

    let mut discovery = DiscoveryService::new(store, ranker, learner);
    if let Some(cache) = build_cache(&settings).await {
        discovery = discovery.with_cache(cache);
    }

    let app_state = AppState { discovery };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .app_data(routes::path_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
