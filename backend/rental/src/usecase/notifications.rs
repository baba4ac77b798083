use uuid::Uuid;

use crate::domain::notification::{Notification, NotificationType};
use crate::domain::user::Actor;
use crate::usecase::contracts::NotificationRepository;
use crate::usecase::error::UsecaseError;

pub struct NotificationsUseCase<N>
where
    N: NotificationRepository,
{
    notification_repository: N,
}

impl<N> NotificationsUseCase<N>
where
    N: NotificationRepository,
{
    pub fn new(notification_repository: N) -> Self {
        Self { notification_repository }
    }

    /// Best-effort delivery: a failed insert is logged and swallowed so the
    /// caller's own operation still succeeds.
    #[tracing::instrument(skip(self, message), fields(%user_id, ?notification_type))]
    pub async fn notify(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        message: String,
        link: Option<String>,
    ) -> Option<Notification> {
        let notification = Notification::new(user_id, notification_type, message, link);

        match self.notification_repository.create(&notification).await {
            Ok(()) => {
                metrics::counter!("rental_notifications_sent_total").increment(1);
                tracing::info!(notification_id = %notification.id, "notification created");
                Some(notification)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to create notification");
                None
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, UsecaseError> {
        tracing::debug!("listing notifications");

        let notifications = self.notification_repository.find_by_user_id(user_id).await?;

        tracing::debug!(count = notifications.len(), "retrieved notifications");
        Ok(notifications)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn mark_as_read(&self, actor: &Actor, id: Uuid) -> Result<(), UsecaseError> {
        tracing::debug!("marking notification as read");

        let notification = self
            .notification_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| UsecaseError::NotFound("Notification".to_string()))?;

        if notification.user_id != actor.id {
            return Err(UsecaseError::Forbidden("User not authorized".to_string()));
        }

        self.notification_repository.mark_as_read(id).await?;

        tracing::debug!(notification_id = %id, "notification marked as read");
        Ok(())
    }
}
