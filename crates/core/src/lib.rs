//! Domain types and pure logic for the mediadesk delivery backend.
//!
//! Nothing in this crate performs I/O. Persistence lives in `mediadesk-db`,
//! the per-job simulator tasks in `mediadesk-worker`.

pub mod delivery;
pub mod error;
pub mod job_events;
pub mod types;
