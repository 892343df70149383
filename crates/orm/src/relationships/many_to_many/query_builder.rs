//! Many-to-many query builder
//!
//! Wraps a `QueryBuilder<Related>` scoped to the related table and joins the
//! pivot table in lazily, right before the query is compiled or executed.
//! Bare column names are qualified with the related table; the `*_pivot`
//! predicate family qualifies with the pivot table instead.

use serde_json::Value;
use tracing::debug;

use super::row::PivotRow;
use super::{ConstraintState, PivotParent, QueryOperation};
use crate::backends::{DatabaseExecutor, DatabaseValue};
use crate::error::{ModelResult, RelationError};
use crate::model::Model;
use crate::pagination::{SimplePaginator, DEFAULT_PER_PAGE};
use crate::query::predicates::{pivot_predicates, standard_predicates};
use crate::query::{OrderDirection, Predicate, QueryBuilder, WhereChain};
use crate::relationships::metadata::ManyToManyConfig;
use crate::relationships::pivot::{qualify_column, PivotColumnHelper, PredicateArgs, PredicateKind};

/// Row counter selected by the group-limit query
pub const GROUP_LIMIT_COUNTER: &str = "adonis_group_limit_counter";

/// Alias of the sub-query wrapped by the group-limit query
pub const GROUP_LIMIT_ALIAS: &str = "adonis_temp";

/// Query builder for the related side of a many-to-many relation
#[derive(Debug)]
pub struct ManyToManyQueryBuilder<Related> {
    query: QueryBuilder<Related>,
    config: ManyToManyConfig,
    parent: PivotParent,
    pivot: PivotColumnHelper,
    state: ConstraintState,
    cherry_picking: bool,
    preload: bool,
    group_limit: Option<u64>,
    group_order: Option<(String, OrderDirection)>,
}

impl<Related> Clone for ManyToManyQueryBuilder<Related> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            config: self.config.clone(),
            parent: self.parent.clone(),
            pivot: self.pivot.clone(),
            state: self.state,
            cherry_picking: self.cherry_picking,
            preload: self.preload,
            group_limit: self.group_limit,
            group_order: self.group_order.clone(),
        }
    }
}

impl<Related: Model> ManyToManyQueryBuilder<Related> {
    /// Query the related rows of a single parent
    pub fn new<Parent: Model>(config: ManyToManyConfig, parent: &Parent) -> ModelResult<Self> {
        config.validate()?;

        let value = parent
            .field(&config.local_key)
            .filter(|value| !value.is_null())
            .ok_or_else(|| RelationError::MissingParentKey {
                relation: config.name.clone(),
                local_key: config.local_key.clone(),
            })?;

        Ok(Self::with_parent(config, PivotParent::Single(value), false))
    }

    /// Preload query for the related rows of many parents at once
    ///
    /// Parents without a local key value are skipped.
    pub fn for_parents<Parent: Model>(config: ManyToManyConfig, parents: &[Parent]) -> ModelResult<Self> {
        config.validate()?;

        let values = parents
            .iter()
            .filter_map(|parent| parent.field(&config.local_key))
            .filter(|value| !value.is_null())
            .collect::<Vec<_>>();

        Ok(Self::with_parent(config, PivotParent::many(values), true))
    }

    fn with_parent(config: ManyToManyConfig, parent: PivotParent, preload: bool) -> Self {
        Self {
            query: QueryBuilder::new().from(&config.related_table),
            pivot: PivotColumnHelper::new(&config.pivot_table),
            config,
            parent,
            state: ConstraintState::Unconstrained,
            cherry_picking: false,
            preload,
            group_limit: None,
            group_order: None,
        }
    }

    pub fn config(&self) -> &ManyToManyConfig {
        &self.config
    }

    pub fn parent(&self) -> &PivotParent {
        &self.parent
    }

    pub fn is_preload(&self) -> bool {
        self.preload
    }

    pub fn is_constrained(&self) -> bool {
        self.state == ConstraintState::Constrained
    }

    /// The wrapped query as built so far
    pub fn query(&self) -> &QueryBuilder<Related> {
        &self.query
    }

    /// Read the pivot table alone, without joining the related table
    ///
    /// Set this before adding pivot predicates so they are left unqualified.
    pub fn pivot_only(mut self) -> Self {
        self.set_pivot_only(true);
        self
    }

    pub fn set_pivot_only(&mut self, pivot_only: bool) {
        self.pivot.set_pivot_only(pivot_only);
    }

    pub fn is_pivot_only_query(&self) -> bool {
        self.pivot.is_pivot_only()
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.query = self.query.debug(enabled);
        self
    }

    pub fn reporter(mut self, label: &str) -> Self {
        self.query = self.query.reporter(label);
        self
    }

    fn related_column(&self, column: &str) -> String {
        qualify_column(&self.config.related_table, column)
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

    /// Pivot predicate chosen by kind and argument shape
    pub fn where_pivot_clause(
        mut self,
        chain: WhereChain,
        kind: PredicateKind,
        column: &str,
        args: PredicateArgs,
    ) -> ModelResult<Self> {
        self.query = self.pivot.where_clause(self.query, chain, kind, column, args)?;
        Ok(self)
    }

    /// Raw SQL condition, inserted as written
    pub fn where_raw(mut self, sql: &str) -> Self {
        self.query = self.query.where_raw(sql);
        self
    }

    pub fn or_where_raw(mut self, sql: &str) -> Self {
        self.query = self.query.or_where_raw(sql);
        self
    }

    pub fn where_exists(mut self, query: QueryBuilder<()>) -> Self {
        self.query = self.query.where_exists(query);
        self
    }

    pub fn where_not_exists(mut self, query: QueryBuilder<()>) -> Self {
        self.query = self.query.where_not_exists(query);
        self
    }

    fn aggregate_column(&self, column: &str) -> String {
        if column == "*" {
            column.to_string()
        } else {
            self.related_column(column)
        }
    }

    /// Aggregate over the related rows; `related.*` is then left out
    pub fn select_count(mut self, column: &str, alias: Option<&str>) -> Self {
        let column = self.aggregate_column(column);
        self.query = self.query.select_count(&column, alias);
        self
    }

    pub fn select_sum(mut self, column: &str, alias: Option<&str>) -> Self {
        let column = self.aggregate_column(column);
        self.query = self.query.select_sum(&column, alias);
        self
    }

    pub fn select_avg(mut self, column: &str, alias: Option<&str>) -> Self {
        let column = self.aggregate_column(column);
        self.query = self.query.select_avg(&column, alias);
        self
    }

    pub fn select_min(mut self, column: &str, alias: Option<&str>) -> Self {
        let column = self.aggregate_column(column);
        self.query = self.query.select_min(&column, alias);
        self
    }

    pub fn select_max(mut self, column: &str, alias: Option<&str>) -> Self {
        let column = self.aggregate_column(column);
        self.query = self.query.select_max(&column, alias);
        self
    }

    /// Cherry-pick related columns instead of `related.*`
    pub fn select(mut self, columns: &str) -> Self {
        self.cherry_picking = true;
        for column in columns.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            let column = self.related_column(column);
            self.query = self.query.select(&column);
        }
        self
    }

    /// Select extra pivot columns, aliased with the pivot prefix
    pub fn pivot_columns(mut self, columns: &[&str]) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        self.query = self
            .pivot
            .select_pivot_columns(self.query, &columns, Some(&self.config.alias_prefix));
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        let column = self.related_column(column);
        self.query = self.query.order_by(&column);
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        let column = self.related_column(column);
        self.query = self.query.order_by_desc(&column);
        self
    }

    pub fn order_by_pivot(mut self, column: &str, direction: OrderDirection) -> Self {
        let column = self.pivot.prefix_pivot_column(column);
        self.query = self.query.order_by_direction(&column, direction);
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.query = self.query.limit(count);
        self
    }

    pub fn offset(mut self, count: u64) -> Self {
        self.query = self.query.offset(count);
        self
    }

    /// Keep at most `limit` related rows per parent
    pub fn group_limit(mut self, limit: u64) -> Self {
        self.group_limit = Some(limit);
        self
    }

    /// Ordering used to pick the rows kept by `group_limit`
    pub fn group_order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.group_order = Some((self.related_column(column), direction));
        self
    }

    /// Apply the relation constraints for a SELECT
    pub fn apply_constraints(&mut self) {
        self.apply_constraints_for(QueryOperation::Select);
    }

    /// Apply the relation constraints for `operation`, at most once
    pub fn apply_constraints_for(&mut self, operation: QueryOperation) {
        if self.state == ConstraintState::Constrained {
            return;
        }
        self.state = ConstraintState::Constrained;

        let mut query = std::mem::take(&mut self.query).wrap_existing();

        if self.pivot.is_pivot_only() || operation != QueryOperation::Select {
            query = query.from(&self.config.pivot_table);
            self.query = self.add_parent_constraint(query);
            debug!(relation = %self.config.name, ?operation, "applied pivot table constraints");
            return;
        }

        if !query.has_aggregates() {
            if !self.cherry_picking {
                query = query.select(&format!("{}.*", self.config.related_table));
            }
            query = self.pivot.select_pivot_columns(
                query,
                &self.config.selected_pivot_columns(),
                Some(&self.config.alias_prefix),
            );
        }

        query = query.join(
            &self.config.pivot_table,
            &self.related_column(&self.config.related_key),
            &qualify_column(&self.config.pivot_table, &self.config.pivot_related_foreign_key),
        );

        self.query = self.add_parent_constraint(query);
        debug!(relation = %self.config.name, preload = self.preload, "applied many-to-many constraints");
    }

    fn add_parent_constraint(&self, query: QueryBuilder<Related>) -> QueryBuilder<Related> {
        let column = self.pivot.prefix_pivot_column(&self.config.pivot_foreign_key);
        match &self.parent {
            PivotParent::Single(value) => query.where_eq(&column, value.clone()),
            PivotParent::Many(values) => query.where_in(&column, values.clone()),
        }
    }

    /// Query returning at most `group_limit` related rows per parent
    ///
    /// Rows are numbered per pivot foreign key with `row_number()` and the
    /// numbered query is filtered from the outside.
    pub fn group_limit_query(mut self) -> QueryBuilder<Related> {
        self.apply_constraints();

        let (order_column, direction) = self
            .group_order
            .clone()
            .unwrap_or_else(|| (self.related_column(Related::primary_key_name()), OrderDirection::Desc));
        let partition = self.pivot.prefix_pivot_column(&self.config.pivot_foreign_key);

        let debug_enabled = self.query.is_debug();
        let reporter = self.query.reporter.clone();

        let numbered = self.query.select_raw(&format!(
            "row_number() OVER (PARTITION BY {} ORDER BY {} {}) AS {}",
            partition, order_column, direction, GROUP_LIMIT_COUNTER
        ));

        let mut outer = QueryBuilder::new()
            .select("*")
            .from_subquery(numbered, GROUP_LIMIT_ALIAS)
            .debug(debug_enabled);
        if let Some(label) = reporter {
            outer = outer.reporter(&label);
        }
        if let Some(limit) = self.group_limit {
            outer = outer.where_lte(GROUP_LIMIT_COUNTER, limit);
        }
        outer
    }

    /// The final query, constraints applied
    pub fn into_query(mut self) -> QueryBuilder<Related> {
        if self.group_limit.is_some() {
            self.group_limit_query()
        } else {
            self.apply_constraints();
            self.query
        }
    }

    pub fn to_sql(&self) -> String {
        self.clone().into_query().to_sql()
    }

    pub fn to_sql_with_params(&self) -> (String, Vec<DatabaseValue>) {
        self.clone().into_query().to_sql_with_params()
    }

    /// Execute and hydrate every related row with its pivot values
    pub async fn exec(self, executor: &mut dyn DatabaseExecutor) -> ModelResult<Vec<PivotRow<Related>>> {
        let config = self.config.clone();
        let rows = self.into_query().fetch_rows(executor).await?;
        rows.iter().map(|row| PivotRow::hydrate(&**row, &config)).collect()
    }

    pub async fn first(self, executor: &mut dyn DatabaseExecutor) -> ModelResult<Option<PivotRow<Related>>> {
        Ok(self.limit(1).exec(executor).await?.into_iter().next())
    }

    /// Fetch one page of related rows
    ///
    /// Preload and group-limited queries span many parents and cannot be
    /// paginated.
    pub async fn paginate(
        mut self,
        executor: &mut dyn DatabaseExecutor,
        page: u64,
        per_page: u64,
    ) -> ModelResult<SimplePaginator<PivotRow<Related>>> {
        if self.preload {
            return Err(RelationError::PaginateOnPreload {
                relation: self.config.name.clone(),
            }
            .into());
        }
        if self.group_limit.is_some() {
            return Err(RelationError::PaginateGroupLimit {
                relation: self.config.name.clone(),
            }
            .into());
        }

        self.apply_constraints();
        let config = self.config.clone();
        self.query
            .paginate_with(executor, page, per_page, |row| PivotRow::hydrate(row, &config))
            .await
    }

    pub async fn paginate_default(
        self,
        executor: &mut dyn DatabaseExecutor,
        page: u64,
    ) -> ModelResult<SimplePaginator<PivotRow<Related>>> {
        self.paginate(executor, page, DEFAULT_PER_PAGE).await
    }

    /// UPDATE on the pivot rows of this relation
    pub fn update(mut self, values: Vec<(String, Value)>) -> QueryBuilder<Related> {
        self.apply_constraints_for(QueryOperation::Update);
        let table = self.config.pivot_table.clone();
        self.query.update(&table).set_values(values)
    }

    /// DELETE on the pivot rows of this relation
    pub fn delete(mut self) -> QueryBuilder<Related> {
        self.apply_constraints_for(QueryOperation::Delete);
        let table = self.config.pivot_table.clone();
        self.query.delete_from(&table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryDatabase;
    use crate::backends::ValueRow;
    use crate::error::ModelError;
    use crate::query::QueryOperator;
    use crate::testing::{Skill, User};
    use serde_json::json;

    fn config() -> ManyToManyConfig {
        ManyToManyConfig::new::<User, Skill>("skills", "skill_user", "user_id", "skill_id")
    }

    fn builder() -> ManyToManyQueryBuilder<Skill> {
        ManyToManyQueryBuilder::new(config(), &User::persisted(1, "ann")).unwrap()
    }

    #[test]
    fn test_constrained_select() {
        assert_eq!(
            builder().to_sql(),
            "SELECT skills.*, skill_user.user_id AS pivot_user_id, skill_user.skill_id AS pivot_skill_id \
             FROM skills INNER JOIN skill_user ON skills.id = skill_user.skill_id \
             WHERE skill_user.user_id = 1"
        );
    }

    #[test]
    fn test_related_and_pivot_qualification_differ() {
        let sql = builder()
            .where_eq("status", "active")
            .where_pivot("status", "approved")
            .to_sql();

        assert!(sql.contains("skills.status = 'active'"));
        assert!(sql.contains("skill_user.status = 'approved'"));
    }

    #[test]
    fn test_or_conditions_are_grouped_before_parent_constraint() {
        let (sql, params) = builder()
            .where_eq("name", "rust")
            .or_where_in_pivot("proficiency", vec![4, 5])
            .to_sql_with_params();

        assert!(sql.ends_with(
            "WHERE (skills.name = $1 OR skill_user.proficiency IN ($2, $3)) AND skill_user.user_id = $4"
        ));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_applying_constraints_twice_is_idempotent() {
        let mut once = builder();
        once.apply_constraints();
        let expected = once.query().to_sql();

        let mut twice = builder();
        twice.apply_constraints();
        twice.apply_constraints();
        assert_eq!(twice.query().to_sql(), expected);
        assert_eq!(twice.query().joins().len(), 1);
    }

    #[test]
    fn test_clone_keeps_constraint_state() {
        let mut constrained = builder();
        constrained.apply_constraints();

        let mut copy = constrained.clone();
        assert!(copy.is_constrained());
        copy.apply_constraints();
        assert_eq!(copy.query().joins().len(), 1);
        assert_eq!(copy.to_sql(), constrained.to_sql());
    }

    #[test]
    fn test_cherry_picked_columns_with_extra_pivot_columns() {
        let config = config().with_pivot_columns(&["proficiency"]).with_timestamps();
        let sql = ManyToManyQueryBuilder::<Skill>::new(config, &User::persisted(1, "ann"))
            .unwrap()
            .select("id, name")
            .to_sql();

        assert!(sql.starts_with(
            "SELECT skills.id, skills.name, skill_user.user_id AS pivot_user_id, \
             skill_user.skill_id AS pivot_skill_id, skill_user.proficiency AS pivot_proficiency, \
             skill_user.created_at AS pivot_created_at, skill_user.updated_at AS pivot_updated_at FROM skills"
        ));
    }

    #[test]
    fn test_aggregates_skip_column_selection() {
        let sql = builder().select_count("*", Some("total")).to_sql();
        assert!(sql.starts_with("SELECT COUNT(*) AS total FROM skills INNER JOIN skill_user"));
        assert!(sql.ends_with("WHERE skill_user.user_id = 1"));
    }

    #[test]
    fn test_aggregate_columns_are_qualified() {
        let sql = builder()
            .select_max("level", Some("top"))
            .select_avg("skill_user.proficiency", None)
            .to_sql();
        assert!(sql.starts_with("SELECT MAX(skills.level) AS top, AVG(skill_user.proficiency) FROM skills"));
        assert!(!sql.contains("pivot_user_id"));
    }

    #[test]
    fn test_pivot_only_query() {
        let sql = builder()
            .pivot_only()
            .where_pivot_op("proficiency", QueryOperator::GreaterThan, 3)
            .to_sql();
        assert_eq!(sql, "SELECT * FROM skill_user WHERE proficiency > 3 AND user_id = 1");
    }

    #[test]
    fn test_preload_dedupes_parent_keys() {
        let parents = vec![
            User::persisted(1, "a"),
            User::persisted(2, "b"),
            User::persisted(1, "c"),
            User::new("unsaved"),
        ];
        let builder = ManyToManyQueryBuilder::<Skill>::for_parents(config(), &parents).unwrap();

        assert_eq!(builder.parent(), &PivotParent::Many(vec![json!(1), json!(2)]));
        assert!(builder.to_sql().ends_with("WHERE skill_user.user_id IN (1, 2)"));
    }

    #[test]
    fn test_missing_parent_key() {
        let err = ManyToManyQueryBuilder::<Skill>::new(config(), &User::new("unsaved")).unwrap_err();
        assert!(matches!(err, ModelError::Relationship(_)));
    }

    #[test]
    fn test_group_limit_query() {
        let parents = vec![User::persisted(1, "a"), User::persisted(2, "b")];
        let sql = ManyToManyQueryBuilder::<Skill>::for_parents(config(), &parents)
            .unwrap()
            .group_limit(2)
            .to_sql();

        assert_eq!(
            sql,
            "SELECT * FROM (SELECT skills.*, skill_user.user_id AS pivot_user_id, skill_user.skill_id AS pivot_skill_id, \
             row_number() OVER (PARTITION BY skill_user.user_id ORDER BY skills.id DESC) AS adonis_group_limit_counter \
             FROM skills INNER JOIN skill_user ON skills.id = skill_user.skill_id \
             WHERE skill_user.user_id IN (1, 2)) AS adonis_temp WHERE adonis_group_limit_counter <= 2"
        );
    }

    #[test]
    fn test_group_order_by() {
        let sql = builder()
            .group_limit(1)
            .group_order_by("name", OrderDirection::Asc)
            .to_sql();
        assert!(sql.contains("PARTITION BY skill_user.user_id ORDER BY skills.name ASC"));
    }

    #[test]
    fn test_update_and_delete_target_pivot_table() {
        let update = builder()
            .update(vec![("proficiency".to_string(), json!(5))])
            .to_sql();
        assert_eq!(update, "UPDATE skill_user SET proficiency = 5 WHERE skill_user.user_id = 1");

        let delete = builder().where_in_pivot("skill_id", vec![3, 4]).delete().to_sql();
        assert_eq!(
            delete,
            "DELETE FROM skill_user WHERE skill_user.skill_id IN (3, 4) AND skill_user.user_id = 1"
        );
    }

    #[test]
    fn test_where_pivot_clause_dispatch() {
        let sql = builder()
            .where_pivot_clause(WhereChain::OrNot, PredicateKind::In, "skill_id", PredicateArgs::List(vec![json!(7)]))
            .unwrap()
            .to_sql();
        assert!(sql.contains("skill_user.skill_id NOT IN (7)"));
    }

    #[test]
    fn test_json_predicates() {
        let sql = builder()
            .where_json_superset("tags", json!(["backend"]))
            .where_json_subset_pivot("flags", json!({"a": 1}))
            .to_sql();
        assert!(sql.contains("skills.tags @> '[\"backend\"]'"));
        assert!(sql.contains("skill_user.flags <@ '{\"a\":1}'"));
    }

    #[tokio::test]
    async fn test_exec_hydrates_pivot_rows() {
        let db = MemoryDatabase::new();
        db.push_response(vec![ValueRow::new()
            .with("id", 3i64)
            .with("name", "rust")
            .with("pivot_user_id", 1i64)
            .with("pivot_skill_id", 3i64)]);

        let mut conn = db.clone();
        let rows = builder().exec(&mut conn).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].model.name, "rust");
        assert_eq!(rows[0].pivot("skill_id"), Some(&DatabaseValue::Int64(3)));
        assert!(db.committed()[0].sql.contains("INNER JOIN skill_user"));
    }

    #[tokio::test]
    async fn test_paginate_counts_then_fetches() {
        let db = MemoryDatabase::new();
        db.push_response(vec![ValueRow::new().with("total", 3i64)]);
        db.push_response(vec![
            ValueRow::new().with("id", 1i64).with("name", "a").with("pivot_user_id", 1i64),
            ValueRow::new().with("id", 2i64).with("name", "b").with("pivot_user_id", 1i64),
        ]);

        let mut conn = db.clone();
        let page = builder().order_by("name").paginate(&mut conn, 1, 2).await.unwrap();

        assert_eq!(page.total(), 3);
        assert_eq!(page.last_page(), 2);
        assert!(page.has_more_pages());
        assert_eq!(page.all()[1].model.name, "b");

        let statements = db.committed();
        assert_eq!(
            statements[0].sql,
            "SELECT COUNT(*) AS total FROM skills INNER JOIN skill_user ON skills.id = skill_user.skill_id \
             WHERE skill_user.user_id = $1"
        );
        assert!(statements[1].sql.ends_with("ORDER BY skills.name ASC LIMIT 2 OFFSET 0"));
    }

    #[tokio::test]
    async fn test_paginate_on_preload_fails_without_query() {
        let db = MemoryDatabase::new();
        let mut conn = db.clone();
        let parents = vec![User::persisted(1, "a")];

        let err = ManyToManyQueryBuilder::<Skill>::for_parents(config(), &parents)
            .unwrap()
            .paginate_default(&mut conn, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, ModelError::Relationship(ref msg) if msg.contains("skills")));
        assert!(db.committed().is_empty());
    }

    #[tokio::test]
    async fn test_paginate_with_group_limit_fails_without_query() {
        let db = MemoryDatabase::new();
        let mut conn = db.clone();

        let result = builder().group_limit(2).paginate(&mut conn, 1, 20).await;

        assert!(matches!(result, Err(ModelError::Relationship(ref msg)) if msg.contains("group limit")));
        assert!(db.committed().is_empty());
    }
}
