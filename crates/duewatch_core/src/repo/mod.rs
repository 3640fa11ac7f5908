//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the task-source and history-store contracts the engine consumes.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Task writes must enforce `Task::validate()` before persistence.
//! - History writes replace the whole record; callers read-modify-write
//!   through `HistoryStore::update_history`.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod error;
pub mod history_repo;
pub mod task_repo;
