//! Periodic background jobs spawned by the server.

pub mod job_retention;
