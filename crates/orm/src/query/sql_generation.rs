//! Query Builder SQL generation
//!
//! One renderer serves both output modes: placeholders with a parameter list
//! for execution, or inlined literals for logging and assertions.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

/// Destination for rendered SQL and its values
pub(crate) struct SqlWriter {
    sql: String,
    params: Vec<DatabaseValue>,
    inline: bool,
}

impl SqlWriter {
    fn new(inline: bool) -> Self {
        Self { sql: String::new(), params: Vec::new(), inline }
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn push_value(&mut self, value: &Value) {
        if self.inline {
            self.sql.push_str(&format_value(value));
        } else {
            self.params.push(DatabaseValue::from_json(value.clone()));
            self.sql.push_str(&format!("${}", self.params.len()));
        }
    }

    /// Bind a value as JSON regardless of its shape
    fn push_json(&mut self, value: &Value) {
        if self.inline {
            self.sql.push_str(&format!("'{}'", value.to_string().replace('\'', "''")));
        } else {
            self.params.push(DatabaseValue::Json(value.clone()));
            self.sql.push_str(&format!("${}", self.params.len()));
        }
    }

    fn push_list(&mut self, values: &[Value]) {
        self.push("(");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push_value(value);
        }
        self.push(")");
    }
}

/// Render a JSON value as a SQL literal
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Array(_) | Value::Object(_) => format!("'{}'", value.to_string().replace('\'', "''")),
    }
}

impl<M> QueryBuilder<M> {
    /// Generate SQL with `$n` placeholders and the values to bind
    pub fn to_sql_with_params(&self) -> (String, Vec<DatabaseValue>) {
        let mut writer = SqlWriter::new(false);
        self.write_sql(&mut writer);
        (writer.sql, writer.params)
    }

    /// Generate SQL with values inlined as literals
    pub fn to_sql(&self) -> String {
        let mut writer = SqlWriter::new(true);
        self.write_sql(&mut writer);
        writer.sql
    }

    pub(crate) fn write_sql(&self, w: &mut SqlWriter) {
        match self.query_type {
            QueryType::Select => self.write_select(w),
            QueryType::Insert => self.write_insert(w),
            QueryType::Update => self.write_update(w),
            QueryType::Delete => self.write_delete(w),
        }
    }

    fn write_select(&self, w: &mut SqlWriter) {
        w.push(if self.distinct { "SELECT DISTINCT " } else { "SELECT " });

        if self.select_fields.is_empty() {
            w.push("*");
        } else {
            w.push(&self.select_fields.join(", "));
        }

        match &self.from {
            Some(FromSource::Table(table)) => {
                w.push(" FROM ");
                w.push(table);
            }
            Some(FromSource::Subquery { query, alias }) => {
                w.push(" FROM (");
                query.write_sql(w);
                w.push(") AS ");
                w.push(alias);
            }
            None => {}
        }

        for join in &self.joins {
            w.push(&format!(" {} {} ON ", join.join_type, join.table));
            let on: Vec<String> = join
                .on_conditions
                .iter()
                .map(|(left, right)| format!("{} = {}", left, right))
                .collect();
            w.push(&on.join(" AND "));
        }

        self.write_where(w);

        if !self.group_by.is_empty() {
            w.push(" GROUP BY ");
            w.push(&self.group_by.join(", "));
        }

        if !self.having_conditions.is_empty() {
            w.push(" HAVING ");
            write_conditions(w, &self.having_conditions);
        }

        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            w.push(" ORDER BY ");
            w.push(&order.join(", "));
        }

        if let Some(limit) = self.limit_count {
            w.push(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            w.push(&format!(" OFFSET {}", offset));
        }
    }

    fn write_insert(&self, w: &mut SqlWriter) {
        w.push("INSERT INTO ");
        w.push(self.table().unwrap_or_default());

        if self.set_clauses.is_empty() {
            w.push(" DEFAULT VALUES");
        } else {
            let columns: Vec<&str> = self.set_clauses.iter().map(|c| c.column.as_str()).collect();
            w.push(&format!(" ({}) VALUES (", columns.join(", ")));
            for (i, clause) in self.set_clauses.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.push_value(&clause.value);
            }
            w.push(")");
        }

        self.write_returning(w);
    }

    fn write_update(&self, w: &mut SqlWriter) {
        w.push("UPDATE ");
        w.push(self.table().unwrap_or_default());
        w.push(" SET ");
        for (i, clause) in self.set_clauses.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push(&clause.column);
            w.push(" = ");
            w.push_value(&clause.value);
        }
        self.write_where(w);
        self.write_returning(w);
    }

    fn write_delete(&self, w: &mut SqlWriter) {
        w.push("DELETE FROM ");
        w.push(self.table().unwrap_or_default());
        self.write_where(w);
        self.write_returning(w);
    }

    fn write_where(&self, w: &mut SqlWriter) {
        if !self.where_conditions.is_empty() {
            w.push(" WHERE ");
            write_conditions(w, &self.where_conditions);
        }
    }

    fn write_returning(&self, w: &mut SqlWriter) {
        if !self.returning.is_empty() {
            w.push(" RETURNING ");
            w.push(&self.returning.join(", "));
        }
    }
}

fn write_conditions(w: &mut SqlWriter, conditions: &[WhereCondition]) {
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            w.push(&format!(" {} ", condition.boolean));
        }
        write_condition(w, condition);
    }
}

fn write_condition(w: &mut SqlWriter, condition: &WhereCondition) {
    let wrap_not = condition.negated && !condition.operator.negates_inline();
    if wrap_not {
        w.push("NOT (");
    }

    match (&condition.operator, &condition.value) {
        (QueryOperator::Raw, _) => w.push(&condition.column),
        (QueryOperator::Group, ConditionValue::Group(conditions)) => {
            if !wrap_not {
                w.push("(");
            }
            write_conditions(w, conditions);
            if !wrap_not {
                w.push(")");
            }
        }
        (QueryOperator::Exists, ConditionValue::Subquery(query)) => {
            w.push(QueryOperator::Exists.sql(condition.negated).unwrap_or("EXISTS"));
            w.push(" (");
            query.write_sql(w);
            w.push(")");
        }
        (QueryOperator::In, ConditionValue::List(values)) if values.is_empty() => {
            // Empty IN never matches, empty NOT IN always does
            w.push(if condition.negated { "1 = 1" } else { "1 = 0" });
        }
        (operator, value) => {
            w.push(&condition.column);
            w.push(" ");
            w.push(operator.sql(condition.negated).unwrap_or("="));
            match value {
                ConditionValue::None => {}
                ConditionValue::Single(v) => {
                    w.push(" ");
                    match operator {
                        QueryOperator::JsonEqual | QueryOperator::JsonSuperset | QueryOperator::JsonSubset => {
                            w.push_json(v)
                        }
                        _ => w.push_value(v),
                    }
                }
                ConditionValue::List(values) => {
                    w.push(" ");
                    w.push_list(values);
                }
                ConditionValue::Range(start, end) => {
                    w.push(" ");
                    w.push_value(start);
                    w.push(" AND ");
                    w.push_value(end);
                }
                ConditionValue::Column(other) => {
                    w.push(" ");
                    w.push(other);
                }
                ConditionValue::Subquery(query) => {
                    w.push(" (");
                    query.write_sql(w);
                    w.push(")");
                }
                ConditionValue::Group(conditions) => {
                    w.push(" (");
                    write_conditions(w, conditions);
                    w.push(")");
                }
            }
        }
    }

    if wrap_not {
        w.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_with_params() {
        let (sql, params) = QueryBuilder::<()>::new()
            .select("id, name")
            .from("users")
            .where_eq("active", true)
            .where_in("role", vec!["admin", "editor"])
            .order_by_desc("id")
            .limit(10)
            .offset(20)
            .to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT id, name FROM users WHERE active = $1 AND role IN ($2, $3) ORDER BY id DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            params,
            vec![
                DatabaseValue::Bool(true),
                DatabaseValue::String("admin".to_string()),
                DatabaseValue::String("editor".to_string()),
            ]
        );
    }

    #[test]
    fn test_negation_spelling() {
        let sql = QueryBuilder::<()>::new()
            .from("users")
            .where_not_in("id", vec![1, 2])
            .or_where_not_null("deleted_at")
            .where_not_eq("name", "bob")
            .or_where_not_between("age", 10, 20)
            .to_sql();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE id NOT IN (1, 2) OR deleted_at IS NOT NULL AND NOT (name = 'bob') OR age NOT BETWEEN 10 AND 20"
        );
    }

    #[test]
    fn test_json_operators_bind_json() {
        let (sql, params) = QueryBuilder::<()>::new()
            .from("posts")
            .where_json_superset("meta", json!({"featured": true}))
            .or_where_json_subset("tags", json!(["a", "b"]))
            .to_sql_with_params();

        assert_eq!(sql, "SELECT * FROM posts WHERE meta @> $1 OR tags <@ $2");
        assert_eq!(params[0], DatabaseValue::Json(json!({"featured": true})));
        assert_eq!(params[1], DatabaseValue::Json(json!(["a", "b"])));
    }

    #[test]
    fn test_subquery_placeholders_continue_numbering() {
        let inner = QueryBuilder::<()>::new()
            .select("user_id")
            .from("orders")
            .where_gt("total", 100);

        let (sql, params) = QueryBuilder::<()>::new()
            .from("users")
            .where_eq("active", true)
            .where_in_subquery("id", inner)
            .to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE active = $1 AND id IN (SELECT user_id FROM orders WHERE total > $2)"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_from_subquery() {
        let inner = QueryBuilder::<()>::new().select("*").from("users").where_eq("active", true);
        let sql = QueryBuilder::<()>::new()
            .select("*")
            .from_subquery(inner, "active_users")
            .where_lte("rank", 3)
            .to_sql();

        assert_eq!(
            sql,
            "SELECT * FROM (SELECT * FROM users WHERE active = true) AS active_users WHERE rank <= 3"
        );
    }

    #[test]
    fn test_exists_and_raw() {
        let sub = QueryBuilder::<()>::new()
            .select("1")
            .from("orders")
            .where_column("orders.user_id", QueryOperator::Equal, "users.id");

        let sql = QueryBuilder::<()>::new()
            .from("users")
            .where_not_exists(sub)
            .or_where_raw("users.id < 10")
            .to_sql();

        assert_eq!(
            sql,
            "SELECT * FROM users WHERE NOT EXISTS (SELECT 1 FROM orders WHERE orders.user_id = users.id) OR users.id < 10"
        );
    }

    #[test]
    fn test_empty_in_list() {
        let sql = QueryBuilder::<()>::new()
            .from("users")
            .where_in("id", Vec::<i64>::new())
            .to_sql();
        assert_eq!(sql, "SELECT * FROM users WHERE 1 = 0");
    }

    #[test]
    fn test_dml_statements() {
        let (insert, params) = QueryBuilder::<()>::new()
            .insert_into("users")
            .set("name", "ann")
            .set("age", 30)
            .returning("*")
            .to_sql_with_params();
        assert_eq!(insert, "INSERT INTO users (name, age) VALUES ($1, $2) RETURNING *");
        assert_eq!(params.len(), 2);

        let update = QueryBuilder::<()>::new()
            .update("users")
            .set_null("team_id")
            .where_eq("id", 4)
            .to_sql();
        assert_eq!(update, "UPDATE users SET team_id = NULL WHERE id = 4");

        let delete = QueryBuilder::<()>::new().delete_from("users").where_eq("id", 4).to_sql();
        assert_eq!(delete, "DELETE FROM users WHERE id = 4");
    }

    #[test]
    fn test_string_literals_are_escaped() {
        let sql = QueryBuilder::<()>::new().from("users").where_eq("name", "o'neil").to_sql();
        assert_eq!(sql, "SELECT * FROM users WHERE name = 'o''neil'");
    }
}
