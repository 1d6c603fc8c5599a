//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the life of the
//! process.
//!
//! # Tasks
//! - Persistent cleanup: sweeps stale entries at startup and at configured intervals

mod cleanup;

pub use cleanup::spawn_cleanup_task;
