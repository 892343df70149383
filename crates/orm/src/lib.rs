//! # elif-relations: Relationship and pagination layer for elif.rs
//!
//! Associations between models (has-one, has-many, belongs-to and
//! many-to-many through a pivot table) on top of a fluent query builder, and
//! offset/limit pagination with navigation metadata and page URLs.
//!
//! SQL runs through the `DatabaseExecutor` trait; the PostgreSQL
//! implementation is backed by sqlx.

pub mod backends;
pub mod error;
pub mod factory;
pub mod model;
pub mod pagination;
pub mod query;
pub mod relationships;

#[cfg(test)]
mod testing;

// Re-export core traits and types
pub use backends::{
    DatabaseExecutor, DatabasePool, DatabasePoolConfig, DatabaseRow, DatabaseRowExt, DatabaseTransaction,
    DatabaseValue, PostgresBackend, PostgresPool, ValueRow,
};
pub use error::{ModelError, ModelResult, OrmError, OrmResult, RelationError};
pub use factory::{Factory, FactoryBuilder, HasManyFactory, HasOneFactory};
pub use model::Model;
pub use pagination::{
    CamelCaseNaming, PageLink, PaginationMetaKeys, PaginationNamingStrategy, SimplePaginator, SnakeCaseNaming,
    DEFAULT_PER_PAGE,
};
pub use query::{OrderDirection, Predicate, QueryBuilder, QueryOperator, WhereChain};
pub use relationships::{
    BelongsTo, HasMany, HasOne, ManyToManyConfig, ManyToManyQueryBuilder, ManyToManySubQueryBuilder, PivotRow,
    Relationship, RelationshipType,
};
