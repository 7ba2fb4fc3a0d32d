//! Event bus consumers that push job updates to WebSocket clients.
//!
//! The [`JobUpdateRelay`] subscribes to the event bus and forwards every job
//! lifecycle event as a `{ "type", "job" }` message to the connections
//! watching that job.

pub mod relay;

pub use relay::{job_message, JobUpdateRelay};
