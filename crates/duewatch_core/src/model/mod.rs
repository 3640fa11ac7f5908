//! Domain model for reminder evaluation.
//!
//! # Responsibility
//! - Define the task shape read from the task source.
//! - Define the fixed milestone schedule and the persisted dedup record.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Milestone offsets are strictly ascending.
//! - History flags only ever go from unset to set.

pub mod history;
pub mod milestone;
pub mod task;
