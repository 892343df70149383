//! Query Builder DML operations (INSERT, UPDATE, DELETE)

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;

impl<M> QueryBuilder<M> {
    /// Start an INSERT query
    pub fn insert_into(mut self, table: &str) -> Self {
        self.query_type = QueryType::Insert;
        self.from = Some(FromSource::Table(table.to_string()));
        self
    }

    /// Turn the query into an UPDATE against `table`, keeping its WHERE clause
    pub fn update(mut self, table: &str) -> Self {
        self.query_type = QueryType::Update;
        self.from = Some(FromSource::Table(table.to_string()));
        self
    }

    /// Turn the query into a DELETE against `table`, keeping its WHERE clause
    pub fn delete_from(mut self, table: &str) -> Self {
        self.query_type = QueryType::Delete;
        self.from = Some(FromSource::Table(table.to_string()));
        self
    }

    /// Set a column value (for INSERT/UPDATE)
    pub fn set<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.set_clauses.push(SetClause {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    /// Set a column to NULL (for INSERT/UPDATE)
    pub fn set_null(self, column: &str) -> Self {
        self.set(column, Value::Null)
    }

    /// Set multiple values at once
    pub fn set_values(mut self, values: Vec<(String, Value)>) -> Self {
        self.set_clauses
            .extend(values.into_iter().map(|(column, value)| SetClause { column, value }));
        self
    }

    /// Columns returned by an INSERT/UPDATE/DELETE
    pub fn returning(mut self, columns: &str) -> Self {
        self.returning
            .extend(columns.split(',').map(|c| c.trim().to_string()).filter(|c| !c.is_empty()));
        self
    }
}
