use async_trait::async_trait;
use uuid::Uuid;

/// Fire-and-forget notification sink. Delivery is a courtesy: failures are
/// logged by implementations and never surface to the caller, so no
/// financial transition can be rolled back by a notification problem.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: Uuid, message: &str, link: &str);
}

/// Default sink: structured log lines, picked up by whatever ships them to
/// the real delivery service.
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, user_id: Uuid, message: &str, link: &str) {
        tracing::info!(%user_id, link, "notification: {}", message);
    }
}
