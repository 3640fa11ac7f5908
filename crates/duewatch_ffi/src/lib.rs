//! Flutter bridge for the Duewatch reminder core.

pub mod api;
