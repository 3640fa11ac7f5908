//! Core use-case services.
//!
//! # Responsibility
//! - Hold the pure reminder decision function.
//! - Orchestrate repository calls into tick, snooze and action use cases.
//! - Keep platform shells decoupled from storage details.

pub mod action_service;
pub mod evaluator;
pub mod reminder_service;
pub mod snooze_service;
