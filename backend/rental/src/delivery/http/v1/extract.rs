use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::usecase::error::UsecaseError;

/// JSON body that has passed its `validator` rules. Both malformed JSON and
/// rule violations are rejected as `UsecaseError::Validation`.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = UsecaseError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection, "rejected request body");
            UsecaseError::Validation(rejection.body_text())
        })?;

        payload.validate().map_err(|validation_errors| {
            tracing::warn!(?validation_errors, "validation failed");
            UsecaseError::Validation(validation_errors.to_string())
        })?;

        Ok(Self(payload))
    }
}

/// `axum::extract::Path` with a JSON `{ message }` rejection.
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = UsecaseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Path(value) = axum::extract::Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "rejected path parameters");
                UsecaseError::Validation(rejection.body_text())
            })?;

        Ok(Self(value))
    }
}

/// `axum::extract::Query` with a JSON `{ message }` rejection.
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = UsecaseError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) = axum::extract::Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "rejected query string");
                UsecaseError::Validation(rejection.body_text())
            })?;

        Ok(Self(value))
    }
}
