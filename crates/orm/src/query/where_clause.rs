//! Query Builder WHERE clause operations

use serde_json::Value;

use super::builder::QueryBuilder;
use super::predicates::standard_predicates;
use super::types::*;

impl<M> QueryBuilder<M> {
    /// Attach a predicate to `column` under the given chain
    pub fn push_where(mut self, chain: WhereChain, column: &str, predicate: Predicate) -> Self {
        self.where_conditions.push(predicate.into_condition(chain, column.to_string()));
        self
    }

    /// Store an already built condition
    pub fn push_condition(mut self, condition: WhereCondition) -> Self {
        self.where_conditions.push(condition);
        self
    }

    standard_predicates!(push_where);

    /// Add WHERE condition with not equal
    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::NotEqual, value)
    }

    /// Add WHERE condition with greater than
    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::GreaterThan, value)
    }

    /// Add WHERE condition with greater than or equal
    pub fn where_gte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::GreaterThanOrEqual, value)
    }

    /// Add WHERE condition with less than
    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::LessThan, value)
    }

    /// Add WHERE condition with less than or equal
    pub fn where_lte<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.where_op(column, QueryOperator::LessThanOrEqual, value)
    }

    /// Add WHERE condition with an operator given as SQL text
    ///
    /// Unknown operators fall back to equality.
    pub fn where_condition<T: Into<Value>>(self, column: &str, operator: &str, value: T) -> Self {
        let operator = QueryOperator::parse(operator).unwrap_or(QueryOperator::Equal);
        self.where_op(column, operator, value)
    }

    /// Compare two columns: `column <operator> other`
    pub fn where_column(self, column: &str, operator: QueryOperator, other: &str) -> Self {
        self.push_where(
            WhereChain::And,
            column,
            Predicate::Column { operator, other: other.to_string() },
        )
    }

    pub fn or_where_column(self, column: &str, operator: QueryOperator, other: &str) -> Self {
        self.push_where(
            WhereChain::Or,
            column,
            Predicate::Column { operator, other: other.to_string() },
        )
    }

    /// Add raw WHERE condition
    pub fn where_raw(self, sql: &str) -> Self {
        self.raw_condition(WhereChain::And, sql)
    }

    pub fn or_where_raw(self, sql: &str) -> Self {
        self.raw_condition(WhereChain::Or, sql)
    }

    fn raw_condition(mut self, chain: WhereChain, sql: &str) -> Self {
        self.where_conditions.push(WhereCondition {
            boolean: chain.boolean(),
            negated: chain.negated(),
            column: sql.to_string(),
            operator: QueryOperator::Raw,
            value: ConditionValue::None,
        });
        self
    }

    /// `EXISTS (sub-query)`
    pub fn where_exists(self, query: QueryBuilder<()>) -> Self {
        self.exists_condition(WhereChain::And, query)
    }

    pub fn or_where_exists(self, query: QueryBuilder<()>) -> Self {
        self.exists_condition(WhereChain::Or, query)
    }

    pub fn where_not_exists(self, query: QueryBuilder<()>) -> Self {
        self.exists_condition(WhereChain::Not, query)
    }

    pub fn or_where_not_exists(self, query: QueryBuilder<()>) -> Self {
        self.exists_condition(WhereChain::OrNot, query)
    }

    fn exists_condition(mut self, chain: WhereChain, query: QueryBuilder<()>) -> Self {
        self.where_conditions.push(WhereCondition {
            boolean: chain.boolean(),
            negated: chain.negated(),
            column: String::new(),
            operator: QueryOperator::Exists,
            value: ConditionValue::Subquery(Box::new(query)),
        });
        self
    }

    /// Parenthesised group of conditions built by `build`
    pub fn where_group<F>(self, chain: WhereChain, build: F) -> Self
    where
        F: FnOnce(QueryBuilder<M>) -> QueryBuilder<M>,
    {
        let conditions = build(QueryBuilder::new()).where_conditions;
        if conditions.is_empty() {
            return self;
        }
        self.push_condition(WhereCondition {
            boolean: chain.boolean(),
            negated: chain.negated(),
            column: String::new(),
            operator: QueryOperator::Group,
            value: ConditionValue::Group(conditions),
        })
    }

    /// Fold every condition added so far into one parenthesised group
    ///
    /// Conditions appended afterwards are AND-ed against the whole group, so
    /// an earlier `OR` cannot leak past them.
    pub fn wrap_existing(mut self) -> Self {
        if self.where_conditions.len() > 1
            || self
                .where_conditions
                .first()
                .map_or(false, |c| c.boolean == WhereBoolean::Or)
        {
            let existing = std::mem::take(&mut self.where_conditions);
            self.where_conditions.push(WhereCondition {
                boolean: WhereBoolean::And,
                negated: false,
                column: String::new(),
                operator: QueryOperator::Group,
                value: ConditionValue::Group(existing),
            });
        }
        self
    }

    /// Add HAVING condition
    pub fn having<T: Into<Value>>(mut self, column: &str, operator: QueryOperator, value: T) -> Self {
        self.having_conditions
            .push(Predicate::compare(operator, value).into_condition(WhereChain::And, column.to_string()));
        self
    }

    /// Add raw HAVING condition
    pub fn having_raw(mut self, sql: &str) -> Self {
        self.having_conditions.push(WhereCondition {
            boolean: WhereBoolean::And,
            negated: false,
            column: sql.to_string(),
            operator: QueryOperator::Raw,
            value: ConditionValue::None,
        });
        self
    }

    /// Drop every WHERE condition
    pub fn clear_where(mut self) -> Self {
        self.where_conditions.clear();
        self
    }
}
