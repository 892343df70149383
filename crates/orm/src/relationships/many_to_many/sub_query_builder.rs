//! Correlated many-to-many sub-queries
//!
//! Used inside `EXISTS`/`IN` clauses of an outer query on the parent table.
//! Instead of binding parent key values, the pivot foreign key is compared
//! against the outer query's local key column.

use tracing::debug;

use super::ConstraintState;
use crate::error::ModelResult;
use crate::model::Model;
use crate::query::predicates::{pivot_predicates, standard_predicates};
use crate::query::{Predicate, QueryBuilder, QueryOperator, WhereChain};
use crate::relationships::metadata::ManyToManyConfig;
use crate::relationships::pivot::{qualify_column, PivotColumnHelper};

/// Sub-query over the related table, correlated to the parent table
#[derive(Debug)]
pub struct ManyToManySubQueryBuilder<Related> {
    query: QueryBuilder<Related>,
    config: ManyToManyConfig,
    pivot: PivotColumnHelper,
    related_alias: String,
    state: ConstraintState,
}

impl<Related> Clone for ManyToManySubQueryBuilder<Related> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            config: self.config.clone(),
            pivot: self.pivot.clone(),
            related_alias: self.related_alias.clone(),
            state: self.state,
        }
    }
}

impl<Related: Model> ManyToManySubQueryBuilder<Related> {
    pub fn new(config: ManyToManyConfig) -> ModelResult<Self> {
        config.validate()?;

        // A self-referencing relation needs its own name for the inner table
        let (from, related_alias) = if config.parent_table == config.related_table {
            let alias = format!("{}_related", config.related_table);
            (format!("{} AS {}", config.related_table, alias), alias)
        } else {
            (config.related_table.clone(), config.related_table.clone())
        };

        Ok(Self {
            query: QueryBuilder::new().from(&from),
            pivot: PivotColumnHelper::new(&config.pivot_table),
            config,
            related_alias,
            state: ConstraintState::Unconstrained,
        })
    }

    pub fn config(&self) -> &ManyToManyConfig {
        &self.config
    }

    pub fn is_constrained(&self) -> bool {
        self.state == ConstraintState::Constrained
    }

    fn related_column(&self, column: &str) -> String {
        qualify_column(&self.related_alias, column)
    }

    fn where_related(mut self, chain: WhereChain, column: &str, predicate: Predicate) -> Self {
        let column = self.related_column(column);
        self.query = self.query.push_where(chain, &column, predicate);
        self
    }

    fn where_pivot_scoped(mut self, chain: WhereChain, column: &str, predicate: Predicate) -> Self {
        self.query = self.pivot.where_predicate(self.query, chain, column, predicate);
        self
    }

    standard_predicates!(where_related);
    pivot_predicates!(where_pivot_scoped);

    pub fn where_raw(mut self, sql: &str) -> Self {
        self.query = self.query.where_raw(sql);
        self
    }

    pub fn select(mut self, columns: &str) -> Self {
        for column in columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            let column = self.related_column(column);
            self.query = self.query.select(&column);
        }
        self
    }

    /// Raw select expression, e.g. an aggregate
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.query = self.query.select_raw(expression);
        self
    }

    pub fn select_count(mut self, alias: Option<&str>) -> Self {
        self.query = self.query.select_count("*", alias);
        self
    }

    /// Select pivot columns as they are, without aliasing
    pub fn pivot_columns(mut self, columns: &[&str]) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        self.query = self.pivot.select_pivot_columns(self.query, &columns, None);
        self
    }

    /// Join the pivot table and correlate it with the outer query, at most once
    pub fn apply_constraints(&mut self) {
        if self.state == ConstraintState::Constrained {
            return;
        }
        self.state = ConstraintState::Constrained;

        let query = std::mem::take(&mut self.query)
            .wrap_existing()
            .join(
                &self.config.pivot_table,
                &self.related_column(&self.config.related_key),
                &qualify_column(&self.config.pivot_table, &self.config.pivot_related_foreign_key),
            )
            .where_column(
                &qualify_column(&self.config.pivot_table, &self.config.pivot_foreign_key),
                QueryOperator::Equal,
                &qualify_column(&self.config.parent_table, &self.config.local_key),
            );

        self.query = query;
        debug!(relation = %self.config.name, "applied many-to-many sub-query constraints");
    }

    /// The constrained query, ready to embed in an outer query
    pub fn into_query(mut self) -> QueryBuilder<()> {
        self.apply_constraints();
        self.query.cast()
    }

    pub fn to_sql(&self) -> String {
        self.clone().into_query().to_sql()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Skill, User};

    fn config() -> ManyToManyConfig {
        ManyToManyConfig::new::<User, Skill>("skills", "skill_user", "user_id", "skill_id")
    }

    #[test]
    fn test_correlated_subquery() {
        let sql = ManyToManySubQueryBuilder::<Skill>::new(config())
            .unwrap()
            .select_count(None)
            .where_eq("name", "rust")
            .to_sql();

        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM skills INNER JOIN skill_user ON skills.id = skill_user.skill_id \
             WHERE skills.name = 'rust' AND skill_user.user_id = users.id"
        );
    }

    #[test]
    fn test_pivot_columns_are_not_aliased() {
        let sql = ManyToManySubQueryBuilder::<Skill>::new(config())
            .unwrap()
            .pivot_columns(&["proficiency"])
            .where_pivot_op("proficiency", QueryOperator::GreaterThanOrEqual, 3)
            .to_sql();

        assert!(sql.starts_with("SELECT skill_user.proficiency FROM skills"));
        assert!(sql.contains("skill_user.proficiency >= 3"));
    }

    #[test]
    fn test_apply_constraints_is_idempotent() {
        let mut builder = ManyToManySubQueryBuilder::<Skill>::new(config()).unwrap();
        builder.apply_constraints();
        let once = builder.to_sql();
        builder.apply_constraints();

        assert!(builder.is_constrained());
        assert_eq!(builder.to_sql(), once);
        assert_eq!(builder.clone().into_query().joins().len(), 1);
    }

    #[test]
    fn test_self_referencing_relation_aliases_inner_table() {
        let config = ManyToManyConfig::new::<User, User>("friends", "friendships", "user_id", "friend_id");
        let sql = ManyToManySubQueryBuilder::<User>::new(config).unwrap().to_sql();

        assert_eq!(
            sql,
            "SELECT * FROM users AS users_related INNER JOIN friendships ON users_related.id = friendships.friend_id \
             WHERE friendships.user_id = users.id"
        );
    }

    #[test]
    fn test_embeds_in_outer_exists() {
        let sub = ManyToManySubQueryBuilder::<Skill>::new(config())
            .unwrap()
            .where_in("name", vec!["rust", "go"])
            .into_query();

        let (sql, params) = QueryBuilder::<()>::new()
            .from("users")
            .where_eq("active", true)
            .where_exists(sub)
            .to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE active = $1 AND EXISTS (SELECT * FROM skills INNER JOIN skill_user \
             ON skills.id = skill_user.skill_id WHERE skills.name IN ($2, $3) AND skill_user.user_id = users.id)"
        );
        assert_eq!(params.len(), 3);
    }
}
