//! Tests for the WebSocket connection manager.

use axum::extract::ws::Message;
use mediadesk_api::ws::WsManager;

// ---------------------------------------------------------------------------
// Test: add and remove connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_and_remove_connections() {
    let manager = WsManager::new();
    assert_eq!(manager.connection_count().await, 0);

    let _rx1 = manager.add("conn-1".to_string(), None).await;
    let _rx2 = manager.add("conn-2".to_string(), Some(uuid::Uuid::new_v4())).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 1);

    // Removing an unknown id is a no-op.
    manager.remove("nope").await;
    assert_eq!(manager.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: job updates respect the per-connection filter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn job_updates_respect_filters() {
    let manager = WsManager::new();
    let job = uuid::Uuid::new_v4();

    let mut all = manager.add("all".to_string(), None).await;
    let mut watching = manager.add("watching".to_string(), Some(job)).await;
    let mut other = manager
        .add("other".to_string(), Some(uuid::Uuid::new_v4()))
        .await;

    let sent = manager
        .send_job_update(job, Message::Text("update".into()))
        .await;
    assert_eq!(sent, 2);

    assert!(matches!(all.recv().await, Some(Message::Text(t)) if t.as_str() == "update"));
    assert!(matches!(watching.recv().await, Some(Message::Text(_))));
    assert!(other.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Test: broadcast, ping and shutdown reach every connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_ping_and_shutdown() {
    let manager = WsManager::new();
    let mut rx = manager.add("c".to_string(), Some(uuid::Uuid::new_v4())).await;

    manager.broadcast(Message::Text("hello".into())).await;
    assert!(matches!(rx.recv().await, Some(Message::Text(_))));

    manager.ping_all().await;
    assert!(matches!(rx.recv().await, Some(Message::Ping(_))));

    manager.shutdown_all().await;
    assert!(matches!(rx.recv().await, Some(Message::Close(None))));
    assert_eq!(manager.connection_count().await, 0);
}
