//! Bounded in-process queue in front of the notification sink.
//!
//! Producers (lifecycle actions, suggestion passes) enqueue with `try_send`
//! and never wait on delivery. A single consumer task owns the receiver and
//! forwards each notification to the sink in order.
//!
//! ```text
//! activity ─► try_send ─► [mpsc, bounded] ─► consumer task ─► sink
//!                │
//!                └─► queue full: warn + drop
//! ```

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domains::matching::models::Notification;
use crate::kernel::BaseNotificationService;

#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<Notification>,
}

impl NotificationDispatcher {
    /// Start the consumer task. It exits once every dispatcher clone is dropped
    /// and the queue has drained.
    pub fn spawn(
        sink: Arc<dyn BaseNotificationService>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));

        let handle = tokio::spawn(async move {
            info!(capacity, "Notification dispatcher started");

            while let Some(notification) = rx.recv().await {
                let id = notification.id;
                let user_id = notification.user_id;
                if let Err(e) = sink.send_notification(notification).await {
                    warn!(notification_id = %id, user_id = %user_id, error = %e, "Failed to deliver notification");
                } else {
                    debug!(notification_id = %id, user_id = %user_id, "Notification delivered");
                }
            }

            info!("Notification dispatcher stopped");
        });

        (Self { tx }, handle)
    }
}

#[async_trait]
impl BaseNotificationService for NotificationDispatcher {
    async fn send_notification(&self, notification: Notification) -> Result<()> {
        match self.tx.try_send(notification) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    notification_id = %dropped.id,
                    user_id = %dropped.user_id,
                    kind = ?dropped.kind,
                    "Notification queue full, dropping notification"
                );
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(anyhow!("notification dispatcher is shut down")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MemberId;
    use crate::domains::matching::models::NotificationType;
    use crate::kernel::test_dependencies::SpyNotificationService;

    fn notification() -> Notification {
        Notification::new(
            MemberId::new(),
            NotificationType::MatchResponse,
            "A mentor responded",
            "Your mentor accepted",
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn forwards_to_sink_in_order() {
        let spy = Arc::new(SpyNotificationService::new());
        let (dispatcher, handle) = NotificationDispatcher::spawn(spy.clone(), 8);

        let first = notification();
        let second = notification();
        dispatcher.send_notification(first.clone()).await.unwrap();
        dispatcher.send_notification(second.clone()).await.unwrap();

        drop(dispatcher);
        handle.await.unwrap();

        let sent = spy.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].id, first.id);
        assert_eq!(sent[1].id, second.id);
    }

    #[tokio::test]
    async fn full_queue_drops_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let dispatcher = NotificationDispatcher { tx };

        dispatcher.send_notification(notification()).await.unwrap();
        dispatcher.send_notification(notification()).await.unwrap();

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_queue_reports_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let dispatcher = NotificationDispatcher { tx };

        assert!(dispatcher.send_notification(notification()).await.is_err());
    }
}
