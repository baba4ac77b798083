use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::delivery::http::v1::extract::ValidatedJson;
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::user::{Address, NewUser, ProfileUpdate, Role, User};
use crate::usecase::auth::AuthSession;
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 32))]
    pub phone: String,
    pub address: Option<Address>,
    #[validate(length(min = 1, max = 64))]
    pub license_number: String,
    pub license_expiry: NaiveDate,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Only the listed fields may be changed; anything else fails deserialization.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub phone: Option<String>,
    pub address: Option<Address>,
    #[validate(length(min = 1, max = 64))]
    pub license_number: Option<String>,
    pub license_expiry: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<Address>,
    pub role: Role,
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub bookings: Vec<Uuid>,
    pub wishlist: Vec<Uuid>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address.map(|a| a.0),
            role: user.role,
            license_number: user.license_number,
            license_expiry: user.license_expiry,
            bookings: user.bookings,
            wishlist: user.wishlist,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: session.user.into(),
            token: session.token,
        }
    }
}

#[tracing::instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling register request");

    let new_user = NewUser {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        license_number: payload.license_number,
        license_expiry: payload.license_expiry,
    };

    let session = state.auth_usecase.register(new_user, payload.password).await?;

    Ok((StatusCode::CREATED, Json(AuthResponse::from(session))))
}

#[tracing::instrument(skip(state, payload))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling login request");

    let session = state.auth_usecase.login(&payload.email, &payload.password).await?;

    Ok((StatusCode::OK, Json(AuthResponse::from(session))))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let profile = state.auth_usecase.get_profile(user.user_id).await?;

    Ok((StatusCode::OK, Json(UserResponse::from(profile))))
}

#[tracing::instrument(skip(state, payload), fields(user_id = %user.user_id))]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, UsecaseError> {
    tracing::debug!("handling update profile request");

    let update = ProfileUpdate {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        license_number: payload.license_number,
        license_expiry: payload.license_expiry,
    };

    let profile = state.auth_usecase.update_profile(user.user_id, update).await?;

    tracing::debug!(user_id = %user.user_id, "profile updated successfully");
    Ok((StatusCode::OK, Json(UserResponse::from(profile))))
}
