//! Source of new-paper notifications and paper details.

use async_trait::async_trait;

use paperpal_chat::{BackendClient, ChatError, NotificationDto, PaperDto};

#[async_trait]
pub trait PaperFeed: Send + Sync {
    /// Notifications not yet acknowledged.
    async fn pending(&self) -> Result<Vec<NotificationDto>, ChatError>;

    /// Mark a notification as taken so it is not served again.
    async fn acknowledge(&self, notification_id: &str) -> Result<(), ChatError>;

    async fn paper(&self, paper_id: &str) -> Result<PaperDto, ChatError>;
}

#[async_trait]
impl PaperFeed for BackendClient {
    async fn pending(&self) -> Result<Vec<NotificationDto>, ChatError> {
        self.notifications().await
    }

    async fn acknowledge(&self, notification_id: &str) -> Result<(), ChatError> {
        self.dismiss_notification(notification_id).await
    }

    async fn paper(&self, paper_id: &str) -> Result<PaperDto, ChatError> {
        BackendClient::paper(self, paper_id).await
    }
}
