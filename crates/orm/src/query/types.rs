//! Query Builder Types - Core types and enums for query building

use std::fmt;
use serde_json::Value;

use super::builder::QueryBuilder;

/// Query operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    ILike,
    In,
    IsNull,
    Between,
    JsonEqual,
    JsonSuperset,
    JsonSubset,
    Exists,
    Group,
    Raw,
}

impl QueryOperator {
    /// Parse a comparison operator as written in SQL
    pub fn parse(operator: &str) -> Option<Self> {
        match operator.trim().to_uppercase().as_str() {
            "=" => Some(QueryOperator::Equal),
            "!=" | "<>" => Some(QueryOperator::NotEqual),
            ">" => Some(QueryOperator::GreaterThan),
            ">=" => Some(QueryOperator::GreaterThanOrEqual),
            "<" => Some(QueryOperator::LessThan),
            "<=" => Some(QueryOperator::LessThanOrEqual),
            "LIKE" => Some(QueryOperator::Like),
            "ILIKE" => Some(QueryOperator::ILike),
            _ => None,
        }
    }

    /// SQL spelling, with the negated form where SQL has one
    pub(crate) fn sql(self, negated: bool) -> Option<&'static str> {
        let sql = match (self, negated) {
            (QueryOperator::Equal, _) => "=",
            (QueryOperator::NotEqual, _) => "!=",
            (QueryOperator::GreaterThan, _) => ">",
            (QueryOperator::GreaterThanOrEqual, _) => ">=",
            (QueryOperator::LessThan, _) => "<",
            (QueryOperator::LessThanOrEqual, _) => "<=",
            (QueryOperator::Like, false) => "LIKE",
            (QueryOperator::Like, true) => "NOT LIKE",
            (QueryOperator::ILike, false) => "ILIKE",
            (QueryOperator::ILike, true) => "NOT ILIKE",
            (QueryOperator::In, false) => "IN",
            (QueryOperator::In, true) => "NOT IN",
            (QueryOperator::IsNull, false) => "IS NULL",
            (QueryOperator::IsNull, true) => "IS NOT NULL",
            (QueryOperator::Between, false) => "BETWEEN",
            (QueryOperator::Between, true) => "NOT BETWEEN",
            (QueryOperator::JsonEqual, _) => "=",
            (QueryOperator::JsonSuperset, _) => "@>",
            (QueryOperator::JsonSubset, _) => "<@",
            (QueryOperator::Exists, false) => "EXISTS",
            (QueryOperator::Exists, true) => "NOT EXISTS",
            (QueryOperator::Group, _) | (QueryOperator::Raw, _) => return None,
        };
        Some(sql)
    }

    /// Whether negation is expressed inside the operator rather than as `NOT (...)`
    pub(crate) fn negates_inline(self) -> bool {
        matches!(
            self,
            QueryOperator::Like
                | QueryOperator::ILike
                | QueryOperator::In
                | QueryOperator::IsNull
                | QueryOperator::Between
                | QueryOperator::Exists
        )
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql(false).unwrap_or("RAW"))
    }
}

/// How a condition joins the ones before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereBoolean {
    And,
    Or,
}

impl fmt::Display for WhereBoolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhereBoolean::And => write!(f, "AND"),
            WhereBoolean::Or => write!(f, "OR"),
        }
    }
}

/// The four ways a predicate can be chained onto a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WhereChain {
    And,
    Or,
    Not,
    OrNot,
}

impl WhereChain {
    pub fn boolean(self) -> WhereBoolean {
        match self {
            WhereChain::And | WhereChain::Not => WhereBoolean::And,
            WhereChain::Or | WhereChain::OrNot => WhereBoolean::Or,
        }
    }

    pub fn negated(self) -> bool {
        matches!(self, WhereChain::Not | WhereChain::OrNot)
    }
}

/// Right-hand side of a where condition
#[derive(Debug)]
pub enum ConditionValue {
    None,
    Single(Value),
    List(Vec<Value>),
    Range(Value, Value),
    Column(String),
    Subquery(Box<QueryBuilder<()>>),
    Group(Vec<WhereCondition>),
}

impl Clone for ConditionValue {
    fn clone(&self) -> Self {
        match self {
            ConditionValue::None => ConditionValue::None,
            ConditionValue::Single(value) => ConditionValue::Single(value.clone()),
            ConditionValue::List(values) => ConditionValue::List(values.clone()),
            ConditionValue::Range(start, end) => ConditionValue::Range(start.clone(), end.clone()),
            ConditionValue::Column(column) => ConditionValue::Column(column.clone()),
            ConditionValue::Subquery(query) => ConditionValue::Subquery(query.clone()),
            ConditionValue::Group(conditions) => ConditionValue::Group(conditions.clone()),
        }
    }
}

/// Where clause condition
#[derive(Debug, Clone)]
pub struct WhereCondition {
    pub boolean: WhereBoolean,
    pub negated: bool,
    pub column: String,
    pub operator: QueryOperator,
    pub value: ConditionValue,
}

/// A predicate before it is attached to a column and a chain
///
/// Every `where*` method funnels through one of these, so the rendering of a
/// predicate kind lives in exactly one place.
#[derive(Debug, Clone)]
pub enum Predicate {
    Compare { operator: QueryOperator, value: Value },
    In(Vec<Value>),
    InSubquery(Box<QueryBuilder<()>>),
    Null,
    Between(Value, Value),
    Like(Value),
    ILike(Value),
    Json(Value),
    JsonSuperset(Value),
    JsonSubset(Value),
    Column { operator: QueryOperator, other: String },
}

impl Predicate {
    /// Two-argument shape: `column = value`
    pub fn eq<T: Into<Value>>(value: T) -> Self {
        Predicate::Compare { operator: QueryOperator::Equal, value: value.into() }
    }

    /// Three-argument shape: `column <operator> value`
    pub fn compare<T: Into<Value>>(operator: QueryOperator, value: T) -> Self {
        Predicate::Compare { operator, value: value.into() }
    }

    pub fn in_list<T: Into<Value>>(values: Vec<T>) -> Self {
        Predicate::In(values.into_iter().map(Into::into).collect())
    }

    pub fn between<T: Into<Value>>(start: T, end: T) -> Self {
        Predicate::Between(start.into(), end.into())
    }

    /// Attach the predicate to a column under the given chain
    pub fn into_condition(self, chain: WhereChain, column: String) -> WhereCondition {
        let (operator, value) = match self {
            Predicate::Compare { operator, value } => (operator, ConditionValue::Single(value)),
            Predicate::In(values) => (QueryOperator::In, ConditionValue::List(values)),
            Predicate::InSubquery(query) => (QueryOperator::In, ConditionValue::Subquery(query)),
            Predicate::Null => (QueryOperator::IsNull, ConditionValue::None),
            Predicate::Between(start, end) => (QueryOperator::Between, ConditionValue::Range(start, end)),
            Predicate::Like(pattern) => (QueryOperator::Like, ConditionValue::Single(pattern)),
            Predicate::ILike(pattern) => (QueryOperator::ILike, ConditionValue::Single(pattern)),
            Predicate::Json(value) => (QueryOperator::JsonEqual, ConditionValue::Single(value)),
            Predicate::JsonSuperset(value) => (QueryOperator::JsonSuperset, ConditionValue::Single(value)),
            Predicate::JsonSubset(value) => (QueryOperator::JsonSubset, ConditionValue::Single(value)),
            Predicate::Column { operator, other } => (operator, ConditionValue::Column(other)),
        };

        WhereCondition {
            boolean: chain.boolean(),
            negated: chain.negated(),
            column,
            operator,
            value,
        }
    }
}

/// Join types
#[derive(Debug, Clone, PartialEq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
        }
    }
}

/// Join clause
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub on_conditions: Vec<(String, String)>, // (left_column, right_column)
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Query types supported by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// Source of rows for a SELECT
#[derive(Debug)]
pub enum FromSource {
    Table(String),
    Subquery { query: Box<QueryBuilder<()>>, alias: String },
}

impl Clone for FromSource {
    fn clone(&self) -> Self {
        match self {
            FromSource::Table(table) => FromSource::Table(table.clone()),
            FromSource::Subquery { query, alias } => FromSource::Subquery {
                query: query.clone(),
                alias: alias.clone(),
            },
        }
    }
}

/// Set clause for UPDATE and INSERT operations
#[derive(Debug, Clone)]
pub struct SetClause {
    pub column: String,
    pub value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse() {
        assert_eq!(QueryOperator::parse(">="), Some(QueryOperator::GreaterThanOrEqual));
        assert_eq!(QueryOperator::parse("<>"), Some(QueryOperator::NotEqual));
        assert_eq!(QueryOperator::parse("ilike"), Some(QueryOperator::ILike));
        assert_eq!(QueryOperator::parse("~~"), None);
    }

    #[test]
    fn test_chain_mapping() {
        assert_eq!(WhereChain::And.boolean(), WhereBoolean::And);
        assert_eq!(WhereChain::OrNot.boolean(), WhereBoolean::Or);
        assert!(WhereChain::Not.negated());
        assert!(!WhereChain::Or.negated());
    }

    #[test]
    fn test_negated_operator_spelling() {
        assert_eq!(QueryOperator::In.sql(true), Some("NOT IN"));
        assert_eq!(QueryOperator::IsNull.sql(true), Some("IS NOT NULL"));
        assert_eq!(QueryOperator::Equal.sql(true), Some("="));
        assert!(!QueryOperator::Equal.negates_inline());
    }
}
