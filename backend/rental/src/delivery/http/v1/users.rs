use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::delivery::http::v1::auth::UserResponse;
use crate::delivery::http::v1::cars::CarResponse;
use crate::delivery::http::v1::extract::{Path, ValidatedJson};
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::user::{AdminUserUpdate, Role};
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistToggleResponse {
    pub message: String,
    pub wishlisted: bool,
}

impl WishlistToggleResponse {
    fn new(wishlisted: bool) -> Self {
        let message = if wishlisted {
            "Car added to wishlist"
        } else {
            "Car removed from wishlist"
        };
        Self {
            message: message.to_string(),
            wishlisted,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminUpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_verified: Option<bool>,
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, car_id = %car_id))]
pub async fn toggle_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(car_id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    let wishlisted = state.wishlist_usecase.toggle(user.user_id, car_id).await?;

    Ok((StatusCode::OK, Json(WishlistToggleResponse::new(wishlisted))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_wishlist(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let cars = state.wishlist_usecase.list(user.user_id).await?;

    let response: Vec<CarResponse> = cars.into_iter().map(CarResponse::from).collect();
    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("admin: listing users");

    let users = state.auth_usecase.list_users(&user.actor()).await?;

    let response: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id, target_id = %target_id))]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(target_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("admin: updating user");

    let update = AdminUserUpdate {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        role: payload.role,
        is_verified: payload.is_verified,
    };

    let updated = state.auth_usecase.update_user(&user.actor(), target_id, update).await?;

    Ok((StatusCode::OK, Json(UserResponse::from(updated))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, target_id = %target_id))]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(target_id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("admin: deleting user");

    state.auth_usecase.delete_user(&user.actor(), target_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
