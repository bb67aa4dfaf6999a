use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::StoreError;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors surfaced by the discovery engine
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl DiscoveryError {
    fn kind(&self) -> &'static str {
        match self {
            DiscoveryError::NotFound(_) => "not_found",
            DiscoveryError::InvalidArgument(_) => "invalid_argument",
            DiscoveryError::Storage(_) => "storage_error",
        }
    }
}

impl ResponseError for DiscoveryError {
    fn status_code(&self) -> StatusCode {
        match self {
            DiscoveryError::NotFound(_) => StatusCode::NOT_FOUND,
            DiscoveryError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            DiscoveryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}
