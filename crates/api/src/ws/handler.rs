use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use mediadesk_core::job_events::MSG_TYPE_JOB_UPDATED;
use mediadesk_core::types::EntityId;
use mediadesk_worker::DeliveryService;

use crate::notifications::job_message;
use crate::query::WsParams;
use crate::state::AppState;
use crate::ws::manager::WsManager;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// `?job_id=` narrows the connection to a single job's updates.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        handle_socket(socket, state.ws_manager, state.delivery, params.job_id)
    })
}

/// Manage a single WebSocket connection after upgrade.
///
/// Registers the connection, sends the current snapshot of a watched job,
/// forwards manager messages to the sink, and drains inbound frames until
/// the client goes away.
async fn handle_socket(
    socket: WebSocket,
    ws_manager: Arc<WsManager>,
    delivery: Arc<DeliveryService>,
    job_filter: Option<EntityId>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, job_id = ?job_filter, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), job_filter).await;
    let (mut sink, mut stream) = socket.split();

    if let Some(job_id) = job_filter {
        match delivery.get_job(job_id).await {
            Ok(job) => {
                if let Some(text) = job_message(MSG_TYPE_JOB_UPDATED, &job) {
                    let _ = sink.send(Message::Text(text.into())).await;
                }
            }
            Err(e) => tracing::debug!(conn_id = %conn_id, error = %e, "Watched job not found"),
        }
    }

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            // Clients only listen.
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
