//! Query Builder - Core builder implementation

use std::marker::PhantomData;

use super::types::*;

/// Query builder for constructing database queries
#[derive(Debug)]
pub struct QueryBuilder<M = ()> {
    pub(crate) query_type: QueryType,
    pub(crate) select_fields: Vec<String>,
    pub(crate) from: Option<FromSource>,
    pub(crate) set_clauses: Vec<SetClause>,
    pub(crate) returning: Vec<String>,
    pub(crate) where_conditions: Vec<WhereCondition>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) order_by: Vec<(String, OrderDirection)>,
    pub(crate) group_by: Vec<String>,
    pub(crate) having_conditions: Vec<WhereCondition>,
    pub(crate) limit_count: Option<u64>,
    pub(crate) offset_value: Option<u64>,
    pub(crate) distinct: bool,
    pub(crate) has_aggregates: bool,
    pub(crate) debug: bool,
    pub(crate) reporter: Option<String>,
    _phantom: PhantomData<M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            query_type: self.query_type,
            select_fields: self.select_fields.clone(),
            from: self.from.clone(),
            set_clauses: self.set_clauses.clone(),
            returning: self.returning.clone(),
            where_conditions: self.where_conditions.clone(),
            joins: self.joins.clone(),
            order_by: self.order_by.clone(),
            group_by: self.group_by.clone(),
            having_conditions: self.having_conditions.clone(),
            limit_count: self.limit_count,
            offset_value: self.offset_value,
            distinct: self.distinct,
            has_aggregates: self.has_aggregates,
            debug: self.debug,
            reporter: self.reporter.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<M> Default for QueryBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> QueryBuilder<M> {
    /// Create a new query builder
    pub fn new() -> Self {
        Self {
            query_type: QueryType::Select,
            select_fields: Vec::new(),
            from: None,
            set_clauses: Vec::new(),
            returning: Vec::new(),
            where_conditions: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            having_conditions: Vec::new(),
            limit_count: None,
            offset_value: None,
            distinct: false,
            has_aggregates: false,
            debug: false,
            reporter: None,
            _phantom: PhantomData,
        }
    }

    /// Reinterpret the builder for another row type, keeping every clause
    ///
    /// Used to embed a model query as a sub-query of another query.
    pub fn cast<N>(self) -> QueryBuilder<N> {
        QueryBuilder {
            query_type: self.query_type,
            select_fields: self.select_fields,
            from: self.from,
            set_clauses: self.set_clauses,
            returning: self.returning,
            where_conditions: self.where_conditions,
            joins: self.joins,
            order_by: self.order_by,
            group_by: self.group_by,
            having_conditions: self.having_conditions,
            limit_count: self.limit_count,
            offset_value: self.offset_value,
            distinct: self.distinct,
            has_aggregates: self.has_aggregates,
            debug: self.debug,
            reporter: self.reporter,
            _phantom: PhantomData,
        }
    }

    /// Log the compiled SQL at info level when the query runs
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Name attached to the execution log lines of this query
    pub fn reporter(mut self, name: &str) -> Self {
        self.reporter = Some(name.to_string());
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// The table rows are read from, if the source is a plain table
    pub fn table(&self) -> Option<&str> {
        match &self.from {
            Some(FromSource::Table(table)) => Some(table.as_str()),
            _ => None,
        }
    }

    pub fn where_conditions(&self) -> &[WhereCondition] {
        &self.where_conditions
    }

    pub fn select_fields(&self) -> &[String] {
        &self.select_fields
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }
}
