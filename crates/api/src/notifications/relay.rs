use std::sync::Arc;

use axum::extract::ws::Message;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use mediadesk_core::job_events::message_type_for;
use mediadesk_events::PlatformEvent;

use crate::ws::WsManager;

/// Serialize a job snapshot into the WebSocket message format.
pub fn job_message<T: Serialize>(msg_type: &str, job: &T) -> Option<String> {
    let job = serde_json::to_value(job).ok()?;
    serde_json::to_string(&json!({ "type": msg_type, "job": job })).ok()
}

/// Forwards job events from the bus to WebSocket connections.
pub struct JobUpdateRelay {
    ws_manager: Arc<WsManager>,
}

impl JobUpdateRelay {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the relay loop until `cancel` fires or the bus is dropped.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job update relay stopping");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => self.relay(&event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Job update relay lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, job update relay shutting down");
                        break;
                    }
                },
            }
        }
    }

    async fn relay(&self, event: &PlatformEvent) {
        let Some(msg_type) = message_type_for(&event.event_type) else {
            return;
        };
        let Some(job_id) = event.source_entity_id else {
            tracing::warn!(event_type = %event.event_type, "Job event without a source id");
            return;
        };
        let Some(job) = event.payload.get("job") else {
            tracing::warn!(event_type = %event.event_type, "Job event without a job snapshot");
            return;
        };
        let Some(text) = job_message(msg_type, job) else {
            return;
        };

        let sent = self
            .ws_manager
            .send_job_update(job_id, Message::Text(text.into()))
            .await;
        tracing::trace!(job_id = %job_id, msg_type, sent, "Relayed job update");
    }
}
