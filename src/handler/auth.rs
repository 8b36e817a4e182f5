use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Extension, Json, Router};
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    db::{authdb::LoginCodeExt, userdb::UserExt},
    dtos::userdtos::*,
    error::{ErrorMessage, HttpError},
    mail::mails::send_login_code_email,
    models::usermodel::UserRole,
    utils::{otp_generator::generate_login_code, password, token, username::generate_username},
    AppState,
};

const LOGIN_CODE_VALIDITY_MINUTES: i64 = 5;

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/confirm", post(confirm_code))
}

/// Customer self-registration. Installer and admin accounts are only ever
/// created by an admin.
pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if app_state
        .env
        .admin_emails
        .contains(&body.email.to_lowercase())
    {
        return Err(HttpError::forbidden("Admins cannot self-register"));
    }

    let existing = app_state
        .db_client
        .get_user(None, None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
    }

    let username = generate_username(&body.full_name, UserRole::Customer);
    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .save_user(
            body.full_name.clone(),
            username,
            body.email.clone(),
            hashed_password,
            body.phone_number.clone(),
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = RegisterResponseDto {
        message: "Customer registered successfully".to_string(),
        username: user.username,
        role: user.role.to_str().to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// First login factor. Valid credentials issue a short-lived emailed code;
/// no session token is returned yet.
pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.username), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Invalid username"))?;

    // Admin-created installers have no credentials until they set a password
    let Some(password_hash) = user.password_hash.as_deref() else {
        return Err(HttpError::forbidden(
            "Installer login credentials not yet set",
        ));
    };

    let password_matched = password::compare(&body.password, password_hash)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::unauthorized(
            ErrorMessage::WrongCredentials.to_string(),
        ));
    }

    let code = generate_login_code();
    let expires_at = Utc::now() + Duration::minutes(LOGIN_CODE_VALIDITY_MINUTES);

    app_state
        .db_client
        .save_login_code(user.id, &code, expires_at)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    send_login_code_email(&user.email, &user.username, &code)
        .await
        .map_err(|e| {
            tracing::error!("Failed to send login code to {}: {}", user.email, e);
            HttpError::server_error("Could not send confirmation code")
        })?;

    Ok(Json(serde_json::json!({
        "message": "Confirmation code sent to email"
    })))
}

/// Second login factor. Redeems a code for a bearer token. An expired code
/// is burned on the attempt so it cannot be retried.
pub async fn confirm_code(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ConfirmCodeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.username), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Invalid user"))?;

    let login_code = app_state
        .db_client
        .get_unused_login_code(user.id, &body.code)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| {
            HttpError::bad_request(ErrorMessage::InvalidOrExpiredCode.to_string())
        })?;

    if login_code.is_expired(Utc::now()) {
        app_state
            .db_client
            .mark_login_code_used(login_code.id)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        return Err(HttpError::bad_request(
            ErrorMessage::InvalidOrExpiredCode.to_string(),
        ));
    }

    app_state
        .db_client
        .mark_login_code_used(login_code.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let access_token = token::create_token(
        user.id,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = UserLoginResponseDto {
        message: "Login successful".to_string(),
        access_token,
        user: FilterUserDto::filter_user(&user),
    };

    Ok(Json(response))
}
