//! Routes job events to preset webhooks.
//!
//! The delivery service stamps `payload.webhook_url` on job events whose
//! preset asked for a notification. [`NotificationDispatcher`] subscribes to
//! the bus and hands those events to [`WebhookDelivery`]; everything else is
//! ignored.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::PlatformEvent;
use crate::delivery::webhook::WebhookDelivery;

/// Payload field carrying the notification target.
pub const WEBHOOK_URL_FIELD: &str = "webhook_url";

/// Background service that posts notified events to webhooks.
pub struct NotificationDispatcher {
    webhook: Arc<WebhookDelivery>,
}

impl NotificationDispatcher {
    pub fn new(webhook: Arc<WebhookDelivery>) -> Self {
        Self { webhook }
    }

    /// Webhook target requested by an event, if any.
    pub fn webhook_target(event: &PlatformEvent) -> Option<&str> {
        event
            .payload
            .get(WEBHOOK_URL_FIELD)
            .and_then(serde_json::Value::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Run until `cancel` fires or the bus closes.
    ///
    /// Each delivery runs on its own task so a slow endpoint in backoff does
    /// not hold up later events.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) {
        tracing::info!("Notification dispatcher started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Notification dispatcher stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => self.dispatch(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notification dispatcher lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, notification dispatcher stopping");
                        break;
                    }
                },
            }
        }
    }

    fn dispatch(&self, event: PlatformEvent) {
        let Some(url) = Self::webhook_target(&event).map(str::to_string) else {
            return;
        };
        let webhook = Arc::clone(&self.webhook);
        tokio::spawn(async move {
            match webhook.deliver(&url, &event).await {
                Ok(()) => tracing::debug!(
                    url = %url,
                    event_type = %event.event_type,
                    "Webhook notification delivered"
                ),
                Err(e) => tracing::error!(
                    url = %url,
                    event_type = %event.event_type,
                    error = %e,
                    "Webhook notification dropped"
                ),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;

    #[test]
    fn target_read_from_payload() {
        let event = PlatformEvent::new("delivery.job.completed")
            .with_payload(serde_json::json!({"webhook_url": "https://hooks.example.com/x"}));
        assert_eq!(
            NotificationDispatcher::webhook_target(&event),
            Some("https://hooks.example.com/x")
        );

        let silent = PlatformEvent::new("delivery.job.progress");
        assert_eq!(NotificationDispatcher::webhook_target(&silent), None);

        let empty = PlatformEvent::new("delivery.job.failed")
            .with_payload(serde_json::json!({"webhook_url": ""}));
        assert_eq!(NotificationDispatcher::webhook_target(&empty), None);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let dispatcher = NotificationDispatcher::new(Arc::new(WebhookDelivery::new()));
        let handle = tokio::spawn(dispatcher.run(bus.subscribe(), cancel.clone()));

        bus.publish(PlatformEvent::new("delivery.job.progress"));
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn run_stops_when_bus_dropped() {
        let bus = EventBus::default();
        let rx = bus.subscribe();
        drop(bus);
        let dispatcher = NotificationDispatcher::new(Arc::new(WebhookDelivery::new()));
        dispatcher.run(rx, CancellationToken::new()).await;
    }
}
