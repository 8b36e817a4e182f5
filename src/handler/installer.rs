use std::sync::Arc;

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use validator::Validate;

use crate::{
    db::{leaddb::LeadExt, userdb::UserExt},
    dtos::leaddtos::*,
    error::HttpError,
    middleware::{role_check, JWTAuthMiddleware},
    models::usermodel::UserRole,
    AppState,
};

pub fn installer_handler() -> Router {
    Router::new()
        .route(
            "/contract",
            post(sign_contract).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Installer])
            })),
        )
        .route(
            "/leads",
            get(get_leads).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Installer])
            })),
        )
        .route(
            "/:installer_id/quote",
            post(request_quote).layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Customer])
            })),
        )
}

/// Records the installer's signed contract. One per installer; signing
/// again is a conflict.
pub async fn sign_contract(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    headers: HeaderMap,
    Json(body): Json<SignContractDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    validate_signature_data_uri(&body.signature_image)?;

    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string());

    let contract = app_state
        .db_client
        .save_signed_contract(
            user.user.id,
            &body.signature_image,
            ip_address.as_deref(),
            body.signed_at,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::conflict("Contract has already been signed"))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Contract submitted successfully",
            "contract_id": contract.id,
            "signed_at": contract.signed_at
        })),
    ))
}

/// The signature pad submits a `data:image/...;base64,` URI. Reject
/// anything that is not one, or whose payload is not valid base64.
fn validate_signature_data_uri(uri: &str) -> Result<(), HttpError> {
    let payload = uri
        .strip_prefix("data:image")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| HttpError::bad_request("Signature must be an image data URI"))?;

    if payload.is_empty() || general_purpose::STANDARD.decode(payload).is_err() {
        return Err(HttpError::bad_request("Signature image is not valid base64"));
    }

    Ok(())
}

/// Quote requests addressed to the calling installer, newest first.
pub async fn get_leads(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let leads = app_state
        .db_client
        .get_leads_for_installer(user.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(LeadListResponseDto {
        leads: leads.iter().map(LeadDto::from_lead).collect(),
    }))
}

/// A customer asks a specific installer for a quote. At most one open
/// request per (customer, installer) pair.
pub async fn request_quote(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    Path(installer_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let installer = app_state
        .db_client
        .get_user(Some(installer_id), None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Installer not found"))?;

    if installer.role != UserRole::Installer {
        return Err(HttpError::bad_request("This user is not an installer"));
    }

    let quote = app_state
        .db_client
        .create_quote_request(user.user.id, installer.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| {
            HttpError::conflict("You have already requested a quote from this installer")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(QuoteRequestResponseDto {
            message: "Quote request sent".to_string(),
            quote_request_id: quote.id,
            status: quote.status,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_well_formed_png_data_uri() {
        // "hello" base64-encoded
        let uri = "data:image/png;base64,aGVsbG8=";
        assert!(validate_signature_data_uri(uri).is_ok());
    }

    #[test]
    fn rejects_non_image_uris() {
        assert!(validate_signature_data_uri("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(validate_signature_data_uri("https://example.com/sig.png").is_err());
        assert!(validate_signature_data_uri("").is_err());
    }

    #[test]
    fn rejects_garbage_base64_payloads() {
        assert!(validate_signature_data_uri("data:image/png;base64,").is_err());
        assert!(validate_signature_data_uri("data:image/png;base64,???not-base64???").is_err());
    }
}
