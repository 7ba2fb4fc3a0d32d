//! WebSocket infrastructure for live job updates.
//!
//! Provides connection management, heartbeat monitoring, and the HTTP
//! upgrade handler used by the `/api/v1/ws` route.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
