//! Outbound notification channels.

pub mod dispatcher;
pub mod webhook;
