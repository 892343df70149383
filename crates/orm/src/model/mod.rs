//! Model System - Trait and persistence helpers for database entities
//!
//! - `core_trait`: the `Model` trait (table metadata, keys, attribute access)
//! - `persistence`: save/find/delete for a single record through an executor

pub mod core_trait;
pub mod persistence;

pub use core_trait::Model;
