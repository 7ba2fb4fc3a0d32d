//! Delivery job execution.
//!
//! [`DeliveryService`] owns the job store and both registries behind one
//! mutex, persists every mutation, publishes lifecycle events and runs one
//! simulator task per active job.

pub mod seed;
pub mod service;
mod simulator;

pub use service::{DeliveryConfig, DeliveryService, JobFilter};
