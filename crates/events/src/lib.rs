//! Event bus and outbound notifications for the delivery backend.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`]: the domain event envelope.
//! - [`delivery`]: outbound webhook delivery and the dispatcher that feeds it.

pub mod bus;
pub mod delivery;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::dispatcher::NotificationDispatcher;
pub use delivery::webhook::{WebhookDelivery, WebhookError};
