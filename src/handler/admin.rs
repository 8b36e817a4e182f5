use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::userdtos::*,
    error::{ErrorMessage, HttpError},
    mail::mails::send_installer_welcome_email,
    models::usermodel::UserRole,
    utils::{otp_generator::generate_temp_password, password, username::generate_username},
    AppState,
};

const DEFAULT_PAGE_LIMIT: usize = 10;

pub fn admin_handler() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id/ban", put(ban_user))
        .route("/users/:user_id/unban", put(unban_user))
        .route("/installers", get(list_installers).post(add_installer))
        .route("/installers/:user_id", delete(delete_installer))
}

/// Customers (and banned users) with search and pagination. Installers have
/// their own listing.
pub async fn list_users(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let search = query.search.as_deref();

    let users = app_state
        .db_client
        .get_customers(search, page, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total = app_state
        .db_client
        .count_customers(search)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(UserListResponseDto {
        users: FilterUserDto::filter_users(&users),
        pagination: PaginationDto {
            current_page: page,
            total_pages: total_pages(total, limit),
            total,
        },
    }))
}

pub async fn ban_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    if user.role == UserRole::Admin {
        return Err(HttpError::forbidden("Admins cannot be banned"));
    }

    let banned = app_state
        .db_client
        .update_user_role(user.id, UserRole::Banned)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": format!("User {} has been banned", banned.username),
        "user": FilterUserDto::filter_user(&banned)
    })))
}

/// Unbanning always restores the customer role; banned installers are
/// re-created by an admin rather than unbanned.
pub async fn unban_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    if user.role != UserRole::Banned {
        return Err(HttpError::bad_request("User is not currently banned"));
    }

    let restored = app_state
        .db_client
        .update_user_role(user.id, UserRole::Customer)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": format!("User {} has been unbanned", restored.username),
        "user": FilterUserDto::filter_user(&restored)
    })))
}

pub async fn list_installers(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(query): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let search = query.search.as_deref();

    let installers = app_state
        .db_client
        .get_installers(search, page, limit)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let total = app_state
        .db_client
        .count_installers(search)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "installers": FilterUserDto::filter_users(&installers),
        "pagination": PaginationDto {
            current_page: page,
            total_pages: total_pages(total, limit),
            total,
        }
    })))
}

/// Creates an installer account with a temporary password and a forced
/// password reset, then emails the credentials.
pub async fn add_installer(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<AddInstallerDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let existing = app_state
        .db_client
        .get_user(None, None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
    }

    let username = generate_username(&body.full_name, UserRole::Installer);
    let temp_password = generate_temp_password();
    let hashed_password =
        password::hash(&temp_password).map_err(|e| HttpError::server_error(e.to_string()))?;

    let installer = app_state
        .db_client
        .save_installer(
            body.full_name.clone(),
            username,
            body.email.clone(),
            hashed_password,
            body.phone_number.clone(),
            body.county.clone(),
            body.installer_category.clone(),
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    // The account exists either way; a failed credentials email is logged
    // and the admin can trigger a reset instead
    if let Err(e) = send_installer_welcome_email(
        &installer.email,
        &installer.full_name,
        &installer.username,
        &temp_password,
    )
    .await
    {
        tracing::error!(
            "Failed to send installer welcome email to {}: {}",
            installer.email,
            e
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Installer added successfully",
            "user": FilterUserDto::filter_user(&installer)
        })),
    ))
}

pub async fn delete_installer(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Installer not found"))?;

    if user.role != UserRole::Installer {
        return Err(HttpError::bad_request("This user is not an installer"));
    }

    app_state
        .db_client
        .delete_user(user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": format!("Installer {} deleted successfully", user.username)
    })))
}

fn total_pages(total: i64, limit: usize) -> u32 {
    if limit == 0 {
        return 0;
    }
    ((total as f64) / (limit as f64)).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(9, 10), 1);
    }
}
