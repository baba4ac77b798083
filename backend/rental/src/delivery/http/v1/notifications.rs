use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::delivery::http::v1::extract::Path;
use crate::delivery::http::v1::middleware::AuthenticatedUser;
use crate::domain::notification::{Notification, NotificationType};
use crate::usecase::error::UsecaseError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            user: n.user_id,
            message: n.message,
            notification_type: n.notification_type,
            is_read: n.is_read,
            link: n.link,
            created_at: n.created_at,
        }
    }
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<impl IntoResponse, UsecaseError> {
    let notifications = state.notifications_usecase.list_notifications(user.user_id).await?;

    let response: Vec<NotificationResponse> =
        notifications.into_iter().map(NotificationResponse::from).collect();
    Ok((StatusCode::OK, Json(response)))
}

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, notification_id = %id))]
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, UsecaseError> {
    state.notifications_usecase.mark_as_read(&user.actor(), id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Notification marked as read" })),
    ))
}
