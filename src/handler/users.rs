use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::userdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddleware,
    utils::password,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/password", put(change_password))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let response = UserResponseDto {
        status: "success".to_string(),
        user: FilterUserDto::filter_user(&user.user),
    };

    Ok(Json(response))
}

/// Also clears the forced-reset flag set on admin-created installer
/// accounts.
pub async fn change_password(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    Json(body): Json<ChangePasswordDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let hashed_password =
        password::hash(&body.new_password).map_err(|e| HttpError::bad_request(e.to_string()))?;

    let updated = app_state
        .db_client
        .update_user_password(user.user.id, hashed_password)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Password updated successfully.",
        "user": FilterUserDto::filter_user(&updated)
    })))
}
