//! Pivot column helper
//!
//! Qualifies column names for the three tables of a many-to-many query and
//! routes predicates onto the underlying builder. Related-table columns go
//! through [`qualify_column`]; pivot-table columns go through
//! [`PivotColumnHelper::prefix_pivot_column`].

use serde_json::Value;

use crate::error::{ModelResult, RelationError};
use crate::query::{Predicate, QueryBuilder, QueryOperator, WhereChain};

/// Prefix a bare column with `table`; dotted columns are left alone
pub fn qualify_column(table: &str, column: &str) -> String {
    if column.contains('.') {
        column.to_string()
    } else {
        format!("{}.{}", table, column)
    }
}

/// Last segment of a possibly qualified column
fn bare_column(column: &str) -> &str {
    column.rsplit('.').next().unwrap_or(column)
}

/// Predicate kinds accepted by [`PivotColumnHelper::where_clause`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    Where,
    In,
    Null,
    Between,
    Like,
    ILike,
    Json,
    JsonSuperset,
    JsonSubset,
}

/// The argument shapes a predicate can be called with
#[derive(Debug, Clone)]
pub enum PredicateArgs {
    /// Column only, e.g. `where_null(column)`
    None,
    /// Column and value, with an implied `=`
    Value(Value),
    /// Column, operator and value
    Operator(QueryOperator, Value),
    /// Column and a list of values
    List(Vec<Value>),
    /// Column and an inclusive range
    Range(Value, Value),
}

impl PredicateArgs {
    fn arity(&self) -> &'static str {
        match self {
            PredicateArgs::None => "column-only",
            PredicateArgs::Value(_) => "column/value",
            PredicateArgs::Operator(..) => "column/operator/value",
            PredicateArgs::List(_) => "column/list",
            PredicateArgs::Range(..) => "column/range",
        }
    }
}

impl PredicateKind {
    /// Resolve a kind and its arguments into a predicate
    pub fn predicate(self, args: PredicateArgs) -> Result<Predicate, RelationError> {
        let predicate = match (self, args) {
            (PredicateKind::Where, PredicateArgs::Value(value)) => Predicate::eq(value),
            (PredicateKind::Where, PredicateArgs::Operator(operator, value)) => {
                Predicate::Compare { operator, value }
            }
            (PredicateKind::Where, PredicateArgs::None) | (PredicateKind::Null, PredicateArgs::None) => {
                Predicate::Null
            }
            (PredicateKind::In, PredicateArgs::List(values)) => Predicate::In(values),
            (PredicateKind::In, PredicateArgs::Value(value)) => Predicate::In(vec![value]),
            (PredicateKind::Between, PredicateArgs::Range(start, end)) => Predicate::Between(start, end),
            (PredicateKind::Like, PredicateArgs::Value(pattern)) => Predicate::Like(pattern),
            (PredicateKind::ILike, PredicateArgs::Value(pattern)) => Predicate::ILike(pattern),
            (PredicateKind::Json, PredicateArgs::Value(value)) => Predicate::Json(value),
            (PredicateKind::JsonSuperset, PredicateArgs::Value(value)) => Predicate::JsonSuperset(value),
            (PredicateKind::JsonSubset, PredicateArgs::Value(value)) => Predicate::JsonSubset(value),
            (kind, args) => {
                return Err(RelationError::UnsupportedPivotOperation(format!(
                    "{:?} cannot be called with {} arguments",
                    kind,
                    args.arity()
                )))
            }
        };
        Ok(predicate)
    }
}

/// Column helper bound to one pivot table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotColumnHelper {
    pivot_table: String,
    pivot_only: bool,
}

impl PivotColumnHelper {
    pub fn new(pivot_table: &str) -> Self {
        Self {
            pivot_table: pivot_table.to_string(),
            pivot_only: false,
        }
    }

    pub fn pivot_table(&self) -> &str {
        &self.pivot_table
    }

    pub fn is_pivot_only(&self) -> bool {
        self.pivot_only
    }

    pub fn set_pivot_only(&mut self, pivot_only: bool) {
        self.pivot_only = pivot_only;
    }

    /// Qualify a pivot column, unless the query reads the pivot table alone
    pub fn prefix_pivot_column(&self, column: &str) -> String {
        if self.pivot_only {
            column.to_string()
        } else {
            qualify_column(&self.pivot_table, column)
        }
    }

    /// Attach a pivot-column predicate to `query`
    pub fn where_predicate<M>(
        &self,
        query: QueryBuilder<M>,
        chain: WhereChain,
        column: &str,
        predicate: Predicate,
    ) -> QueryBuilder<M> {
        query.push_where(chain, &self.prefix_pivot_column(column), predicate)
    }

    /// Attach a pivot-column predicate chosen by kind and argument shape
    pub fn where_clause<M>(
        &self,
        query: QueryBuilder<M>,
        chain: WhereChain,
        kind: PredicateKind,
        column: &str,
        args: PredicateArgs,
    ) -> ModelResult<QueryBuilder<M>> {
        let predicate = kind.predicate(args)?;
        Ok(self.where_predicate(query, chain, column, predicate))
    }

    /// Select pivot columns, aliased as `<prefix><column>` when a prefix is given
    pub fn select_pivot_columns<M>(
        &self,
        mut query: QueryBuilder<M>,
        columns: &[String],
        alias_prefix: Option<&str>,
    ) -> QueryBuilder<M> {
        for column in columns {
            let qualified = self.prefix_pivot_column(column);
            query = match alias_prefix {
                Some(prefix) => query.select_raw(&format!(
                    "{} AS {}{}",
                    qualified,
                    prefix,
                    bare_column(column)
                )),
                None => query.select_raw(&qualified),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_qualification() {
        let helper = PivotColumnHelper::new("skill_user");
        assert_eq!(helper.prefix_pivot_column("user_id"), "skill_user.user_id");
        assert_eq!(helper.prefix_pivot_column("other.user_id"), "other.user_id");
        assert_eq!(qualify_column("skills", "name"), "skills.name");
        assert_eq!(qualify_column("skills", "s.name"), "s.name");
    }

    #[test]
    fn test_pivot_only_leaves_columns_bare() {
        let mut helper = PivotColumnHelper::new("skill_user");
        helper.set_pivot_only(true);
        assert_eq!(helper.prefix_pivot_column("user_id"), "user_id");
    }

    #[test]
    fn test_where_clause_argument_shapes() {
        let helper = PivotColumnHelper::new("skill_user");
        let query = QueryBuilder::<()>::new().from("skills");

        let query = helper
            .where_clause(query, WhereChain::And, PredicateKind::Where, "status", PredicateArgs::Value(json!("active")))
            .unwrap();
        let query = helper
            .where_clause(
                query,
                WhereChain::Or,
                PredicateKind::Where,
                "level",
                PredicateArgs::Operator(QueryOperator::GreaterThan, json!(2)),
            )
            .unwrap();
        let query = helper
            .where_clause(query, WhereChain::Not, PredicateKind::Null, "revoked_at", PredicateArgs::None)
            .unwrap();

        assert_eq!(
            query.to_sql(),
            "SELECT * FROM skills WHERE skill_user.status = 'active' OR skill_user.level > 2 AND skill_user.revoked_at IS NOT NULL"
        );
    }

    #[test]
    fn test_where_clause_rejects_mismatched_shape() {
        let helper = PivotColumnHelper::new("skill_user");
        let result = helper.where_clause(
            QueryBuilder::<()>::new(),
            WhereChain::And,
            PredicateKind::Between,
            "level",
            PredicateArgs::Value(json!(1)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_select_pivot_columns_alias() {
        let helper = PivotColumnHelper::new("skill_user");
        let columns = vec!["user_id".to_string(), "proficiency".to_string()];

        let aliased = helper.select_pivot_columns(QueryBuilder::<()>::new(), &columns, Some("pivot_"));
        assert_eq!(
            aliased.select_fields(),
            &["skill_user.user_id AS pivot_user_id", "skill_user.proficiency AS pivot_proficiency"]
        );

        let plain = helper.select_pivot_columns(QueryBuilder::<()>::new(), &columns, None);
        assert_eq!(plain.select_fields(), &["skill_user.user_id", "skill_user.proficiency"]);
    }
}
