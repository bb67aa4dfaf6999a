// Route exports
pub mod pets;

use actix_web::{error, web, HttpRequest};

use crate::models::ErrorResponse;

pub use pets::{AppState, AuthenticatedUser, USER_ID_HEADER};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(pets::configure),
    );
}

/// JSON extractor config that answers malformed bodies with a JSON 400
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(handle_json_payload_error)
}

/// Path extractor config so a non-numeric pet id is a JSON 400 as well
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, req| {
        tracing::info!("Path error on {}: {}", req.path(), err);
        bad_request("invalid_path", format!("Invalid path: {}", err))
    })
}

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    bad_request("invalid_json", format!("Invalid JSON: {}", err))
}

fn bad_request(kind: &str, message: String) -> actix_web::Error {
    let response = actix_web::HttpResponse::BadRequest().json(ErrorResponse {
        error: kind.to_string(),
        message: message.clone(),
        status_code: 400,
    });
    error::InternalError::from_response(message, response).into()
}
