use serde::{Deserialize, Serialize};
use crate::models::domain::{Pet, ScoredPet, UserId};

/// Response for the discover endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub pets: Vec<ScoredPet>,
    pub total_results: usize,
}

/// Response for the liked pets endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedPetsResponse {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub pets: Vec<Pet>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache_entries: Option<u64>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
