//! Query Builder Module - Fluent query builder shared by every relation

pub mod builder;
pub mod dml;
pub mod execution;
pub mod joins;
pub mod ordering;
pub mod pagination;
pub(crate) mod predicates;
pub mod select;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{
    ConditionValue, FromSource, JoinType, OrderDirection, Predicate, QueryOperator, QueryType,
    WhereBoolean, WhereChain, WhereCondition,
};
