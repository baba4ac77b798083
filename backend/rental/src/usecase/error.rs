use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

use crate::domain::booking::BookingRuleError;
use crate::repository::errors::RepositoryError;

#[derive(Debug, Error)]
pub enum UsecaseError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Validation(String),

    #[error("Car is already booked for these dates")]
    DateConflict,

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl UsecaseError {
    pub fn access_denied() -> Self {
        UsecaseError::Forbidden("Access denied".to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            UsecaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UsecaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            UsecaseError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            UsecaseError::Validation(_)
            | UsecaseError::DateConflict
            | UsecaseError::InvalidTransition(_)
            | UsecaseError::Unavailable(_) => StatusCode::BAD_REQUEST,
            UsecaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for UsecaseError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => UsecaseError::NotFound("Resource".to_string()),
            RepositoryError::DatabaseError(msg) => UsecaseError::Internal(msg),
        }
    }
}

impl From<BookingRuleError> for UsecaseError {
    fn from(e: BookingRuleError) -> Self {
        match e {
            BookingRuleError::DateConflict => UsecaseError::DateConflict,
            BookingRuleError::InvalidTransition { .. } => UsecaseError::InvalidTransition(e.to_string()),
            BookingRuleError::InvalidRange
            | BookingRuleError::NegativeDrivers
            | BookingRuleError::AmountTooLarge => {
                UsecaseError::Validation(e.to_string())
            }
        }
    }
}

impl IntoResponse for UsecaseError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        let message = match &self {
            UsecaseError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
                "Internal server error".to_string()
            }
            UsecaseError::NotFound(_) => {
                tracing::warn!(error = %self, "resource not found");
                self.to_string()
            }
            UsecaseError::Forbidden(_) | UsecaseError::Unauthenticated(_) => {
                tracing::warn!(error = %self, "access rejected");
                self.to_string()
            }
            _ => {
                tracing::warn!(error = %self, "request rejected");
                self.to_string()
            }
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::booking::BookingStatus;

    #[test]
    fn test_status_codes() {
        assert_eq!(UsecaseError::NotFound("Car".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(UsecaseError::access_denied().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            UsecaseError::Unauthenticated("Please authenticate.".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(UsecaseError::DateConflict.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UsecaseError::Unavailable("Car is not available for booking".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UsecaseError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_booking_rule_mapping() {
        assert!(matches!(
            UsecaseError::from(BookingRuleError::DateConflict),
            UsecaseError::DateConflict
        ));
        assert!(matches!(
            UsecaseError::from(BookingRuleError::InvalidRange),
            UsecaseError::Validation(_)
        ));
        assert!(matches!(
            UsecaseError::from(BookingRuleError::AmountTooLarge),
            UsecaseError::Validation(_)
        ));

        let err = UsecaseError::from(BookingRuleError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Cancelled,
        });
        assert_eq!(err.to_string(), "Cannot change booking from completed to cancelled");
    }

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            UsecaseError::from(RepositoryError::NotFound),
            UsecaseError::NotFound(_)
        ));
        assert!(matches!(
            UsecaseError::from(RepositoryError::DatabaseError("down".into())),
            UsecaseError::Internal(_)
        ));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(UsecaseError::NotFound("Booking".into()).to_string(), "Booking not found");
    }
}
