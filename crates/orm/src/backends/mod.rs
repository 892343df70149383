//! Database Backend Abstractions
//!
//! Executor traits the relations layer runs its SQL through, plus the
//! PostgreSQL implementation backed by sqlx.

pub mod core;
pub mod postgres;

#[cfg(test)]
pub(crate) mod memory;

// Re-export core traits and types
pub use self::core::*;
pub use postgres::{PostgresBackend, PostgresPool};
