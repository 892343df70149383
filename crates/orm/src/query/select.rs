//! Query Builder SELECT operations

use super::builder::QueryBuilder;
use super::types::FromSource;

impl<M> QueryBuilder<M> {
    /// Add SELECT fields to the query
    pub fn select(mut self, fields: &str) -> Self {
        if fields == "*" {
            self.select_fields.push("*".to_string());
        } else {
            self.select_fields.extend(
                fields
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty()),
            );
        }
        self
    }

    /// Add SELECT DISTINCT to the query
    pub fn select_distinct(mut self, fields: &str) -> Self {
        self.distinct = true;
        self.select(fields)
    }

    /// Set the FROM table
    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(FromSource::Table(table.to_string()));
        self
    }

    /// Read rows from a sub-query: `FROM (<query>) AS alias`
    pub fn from_subquery<N>(mut self, query: QueryBuilder<N>, alias: &str) -> Self {
        self.from = Some(FromSource::Subquery {
            query: Box::new(query.cast()),
            alias: alias.to_string(),
        });
        self
    }

    fn aggregate(mut self, function: &str, column: &str, alias: Option<&str>) -> Self {
        let select_expr = match alias {
            Some(alias) => format!("{}({}) AS {}", function, column, alias),
            None => format!("{}({})", function, column),
        };
        self.select_fields.push(select_expr);
        self.has_aggregates = true;
        self
    }

    /// Add COUNT aggregate
    pub fn select_count(self, column: &str, alias: Option<&str>) -> Self {
        self.aggregate("COUNT", column, alias)
    }

    /// Add SUM aggregate
    pub fn select_sum(self, column: &str, alias: Option<&str>) -> Self {
        self.aggregate("SUM", column, alias)
    }

    /// Add AVG aggregate
    pub fn select_avg(self, column: &str, alias: Option<&str>) -> Self {
        self.aggregate("AVG", column, alias)
    }

    /// Add MIN aggregate
    pub fn select_min(self, column: &str, alias: Option<&str>) -> Self {
        self.aggregate("MIN", column, alias)
    }

    /// Add MAX aggregate
    pub fn select_max(self, column: &str, alias: Option<&str>) -> Self {
        self.aggregate("MAX", column, alias)
    }

    /// Add custom SELECT expression
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.select_fields.push(expression.to_string());
        self
    }

    /// Whether an aggregate has been selected
    pub fn has_aggregates(&self) -> bool {
        self.has_aggregates
    }

    /// Drop every selected column
    pub fn clear_select(mut self) -> Self {
        self.select_fields.clear();
        self.has_aggregates = false;
        self
    }
}
