//! Provider bridge handlers
//!
//! Each handler forwards one platform provider call to `PasskeyProvider`.

use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::warn;
use serde_json::json;

use super::types::{BeginRequest, CallerInfo, CreateRequest, GetRequest, HealthResponse, PIN_HEADER};
use crate::passkey::{CallerIdentity, FailureKind, PasskeyProvider, ProviderFailure};

/// Convert a `ProviderFailure` to an HTTP response
fn failure_to_response(failure: &ProviderFailure) -> HttpResponse {
    match failure.kind {
        FailureKind::Cancelled => HttpResponse::Forbidden().json(failure),
        FailureKind::Unknown => HttpResponse::UnprocessableEntity().json(failure),
    }
}

fn bad_caller(field: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "error": "unknown",
        "message": format!("Invalid base64 in caller.{field}")
    }))
}

fn pin_from(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(PIN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

fn caller_from(info: Option<&CallerInfo>) -> Result<Option<CallerIdentity>, HttpResponse> {
    info.map(CallerInfo::to_identity)
        .transpose()
        .map_err(bad_caller)
}

/// List credentials for an assertion request
///
/// # Errors
/// Never fails; resolution errors produce an empty list
pub async fn begin_get(
    provider: web::Data<PasskeyProvider>,
    body: web::Json<BeginRequest>,
) -> Result<HttpResponse> {
    let credentials = provider.begin_get(&body.request_json).await;
    Ok(HttpResponse::Ok().json(json!({ "credentials": credentials })))
}

/// Produce an assertion
///
/// # Errors
/// Never fails; provider failures are returned as JSON bodies
pub async fn get(
    req: HttpRequest,
    provider: web::Data<PasskeyProvider>,
    body: web::Json<GetRequest>,
) -> Result<HttpResponse> {
    let caller = match caller_from(body.caller.as_ref()) {
        Ok(caller) => caller,
        Err(response) => return Ok(response),
    };

    match provider
        .get(&body.request_json, &body.credential_id, caller.as_ref(), pin_from(&req))
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(failure) => Ok(failure_to_response(&failure)),
    }
}

/// Describe the create entry for a registration request
///
/// # Errors
/// Never fails; malformed requests are returned as JSON bodies
pub async fn begin_create(
    provider: web::Data<PasskeyProvider>,
    body: web::Json<BeginRequest>,
) -> Result<HttpResponse> {
    match provider.begin_create(&body.request_json) {
        Ok(entry) => Ok(HttpResponse::Ok().json(entry)),
        Err(e) => {
            warn!("Rejected creation request: {e}");
            Ok(failure_to_response(&ProviderFailure::from(e)))
        }
    }
}

/// Register a new passkey
///
/// # Errors
/// Never fails; provider failures are returned as JSON bodies
pub async fn create(
    req: HttpRequest,
    provider: web::Data<PasskeyProvider>,
    body: web::Json<CreateRequest>,
) -> Result<HttpResponse> {
    let caller = match caller_from(body.caller.as_ref()) {
        Ok(caller) => caller,
        Err(response) => return Ok(response),
    };

    match provider
        .create(&body.request_json, caller.as_ref(), pin_from(&req))
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(failure) => Ok(failure_to_response(&failure)),
    }
}

/// Clear per-session credential state
///
/// # Errors
/// Never fails
pub async fn clear(provider: web::Data<PasskeyProvider>) -> Result<HttpResponse> {
    match provider.clear_credential_state() {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(failure) => Ok(failure_to_response(&failure)),
    }
}

/// Health check endpoint
///
/// # Errors
/// Returns an error if health status cannot be determined
pub async fn health() -> Result<HttpResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        message: "Passkey provider is running".to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// Register the provider routes
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/provider/get/begin", web::post().to(begin_get))
        .route("/provider/get", web::post().to(get))
        .route("/provider/create/begin", web::post().to(begin_create))
        .route("/provider/create", web::post().to(create))
        .route("/provider/clear", web::post().to(clear))
        .route("/ping", web::get().to(health));
}
