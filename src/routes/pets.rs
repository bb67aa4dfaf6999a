use actix_web::error::InternalError;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse, Responder};
use std::future::{ready, Ready};
use validator::Validate;

use crate::error::DiscoveryError;
use crate::models::{
    DiscoverResponse, ErrorResponse, HealthResponse, InteractRequest, LikedPetsResponse, PetId,
    UserId,
};
use crate::services::DiscoveryService;

/// Header carrying the caller identity, set by the authenticating gateway
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub discovery: DiscoveryService,
}

/// Caller identity resolved from [`USER_ID_HEADER`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let user_id = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.trim().parse::<UserId>().ok());

        ready(match user_id {
            Some(id) => Ok(AuthenticatedUser(id)),
            None => {
                let response = HttpResponse::Unauthorized().json(ErrorResponse {
                    error: "unauthenticated".to_string(),
                    message: format!("Missing or invalid {} header", USER_ID_HEADER),
                    status_code: 401,
                });
                Err(InternalError::from_response("unauthenticated", response).into())
            }
        })
    }
}

/// Configure all pet discovery routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/pets/discover", web::get().to(discover))
        .route("/pets/discover/reset", web::post().to(reset_discovery))
        .route("/pets/discover/preferences", web::get().to(get_preferences))
        .route("/pets/discover/stats", web::get().to(get_stats))
        .route("/pets/liked", web::get().to(liked_pets))
        .service(
            web::resource("/pets/{id}/interact")
                .route(web::post().to(record_interaction))
                .route(web::delete().to(delete_interaction)),
        );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state
        .discovery
        .store()
        .health_check()
        .await
        .unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_entries: state.discovery.cache().map(|c| c.l1_entries()),
        timestamp: chrono::Utc::now(),
    })
}

/// Ranked pets the caller has not swiped yet
///
/// GET /api/v1/pets/discover
async fn discover(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, DiscoveryError> {
    let pets = state.discovery.discover(user.0).await?;

    Ok(HttpResponse::Ok().json(DiscoverResponse {
        total_results: pets.len(),
        pets,
    }))
}

/// Record a swipe
///
/// POST /api/v1/pets/{id}/interact
///
/// Request body:
/// ```json
/// { "type": "LIKE" }
/// ```
async fn record_interaction(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<PetId>,
    req: web::Json<InteractRequest>,
) -> Result<HttpResponse, DiscoveryError> {
    if let Err(errors) = req.validate() {
        return Err(DiscoveryError::InvalidArgument(errors.to_string()));
    }

    let interaction = state
        .discovery
        .record_interaction(user.0, path.into_inner(), &req.interaction_type)
        .await?;

    Ok(HttpResponse::Ok().json(interaction))
}

/// Undo the latest swipe on a pet
///
/// DELETE /api/v1/pets/{id}/interact
async fn delete_interaction(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<PetId>,
) -> Result<HttpResponse, DiscoveryError> {
    state
        .discovery
        .delete_interaction(user.0, path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/v1/pets/discover/reset
async fn reset_discovery(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, DiscoveryError> {
    state.discovery.reset(user.0).await?;
    Ok(HttpResponse::Ok().finish())
}

/// GET /api/v1/pets/liked
async fn liked_pets(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, DiscoveryError> {
    let pets = state.discovery.liked_pets(user.0).await?;

    Ok(HttpResponse::Ok().json(LikedPetsResponse {
        user_id: user.0,
        count: pets.len(),
        pets,
    }))
}

/// Learned weights, for client-side display and debugging
///
/// GET /api/v1/pets/discover/preferences
async fn get_preferences(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, DiscoveryError> {
    let model = state.discovery.preferences(user.0).await?;
    Ok(HttpResponse::Ok().json(model))
}

/// GET /api/v1/pets/discover/stats
async fn get_stats(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, DiscoveryError> {
    let stats = state.discovery.stats(user.0).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_user_extracted_from_header() {
        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "42"))
            .to_http_request();

        let user = AuthenticatedUser::extract(&req).await.unwrap();
        assert_eq!(user, AuthenticatedUser(42));
    }

    #[actix_web::test]
    async fn test_missing_header_rejected() {
        let req = TestRequest::default().to_http_request();
        assert!(AuthenticatedUser::extract(&req).await.is_err());

        let req = TestRequest::default()
            .insert_header((USER_ID_HEADER, "not-a-number"))
            .to_http_request();
        assert!(AuthenticatedUser::extract(&req).await.is_err());
    }
}
