//! Persistence - Insert, update, find and delete for single records
//!
//! Every operation runs against a caller-supplied executor, so the same call
//! works on a pooled connection or inside an open transaction.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::backends::DatabaseExecutor;
use crate::error::{ModelError, ModelResult};
use crate::model::core_trait::Model;
use crate::query::QueryBuilder;

/// Insert the record when it has no primary key, update it otherwise
///
/// Inserts hydrate the record from `RETURNING *`, so database defaults and the
/// generated key land on the in-memory instance.
pub async fn save<M: Model>(model: &mut M, executor: &mut dyn DatabaseExecutor) -> ModelResult<()> {
    if M::uses_timestamps() {
        let now = Utc::now();
        if !model.is_persisted() {
            model.set_created_at(now);
        }
        model.set_updated_at(now);
    }

    let key = model.primary_key_value();
    let mut fields: Vec<(String, Value)> = model
        .to_fields()
        .into_iter()
        .filter(|(column, _)| column != M::primary_key_name())
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    match key {
        None => {
            let query = QueryBuilder::<M>::new()
                .insert_into(M::table_name())
                .set_values(fields)
                .returning("*");
            let (sql, params) = query.to_sql_with_params();
            debug!(table = M::table_name(), sql = %sql, "inserting record");

            let row = executor.fetch_optional(&sql, &params).await?.ok_or_else(|| {
                ModelError::Database(format!("Insert into {} returned no row", M::table_name()))
            })?;
            *model = M::from_row(&*row)?;
        }
        Some(key) => {
            let query = QueryBuilder::<M>::new()
                .update(M::table_name())
                .set_values(fields)
                .where_eq(M::primary_key_name(), key);
            let (sql, params) = query.to_sql_with_params();
            debug!(table = M::table_name(), sql = %sql, "updating record");

            executor.execute(&sql, &params).await?;
        }
    }

    Ok(())
}

/// Find a record by primary key
pub async fn find<M: Model>(
    executor: &mut dyn DatabaseExecutor,
    key: M::PrimaryKey,
) -> ModelResult<Option<M>> {
    let key = serde_json::to_value(key)?;
    QueryBuilder::<M>::new()
        .from(M::table_name())
        .where_eq(M::primary_key_name(), key)
        .first(executor)
        .await
}

/// Delete a persisted record by primary key
pub async fn delete<M: Model>(model: &M, executor: &mut dyn DatabaseExecutor) -> ModelResult<u64> {
    let key = model.primary_key_value().ok_or(ModelError::MissingPrimaryKey)?;
    QueryBuilder::<M>::new()
        .delete_from(M::table_name())
        .where_eq(M::primary_key_name(), key)
        .execute(executor)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryDatabase;
    use crate::backends::{DatabaseValue, ValueRow};
    use crate::testing::User as TestUser;

    #[tokio::test]
    async fn test_save_inserts_and_hydrates() {
        let db = MemoryDatabase::new();
        db.push_response(vec![ValueRow::new()
            .with("id", 7i64)
            .with("name", "ann")
            .with("team_id", DatabaseValue::Null)]);

        let mut user = TestUser::new("ann");
        let mut conn = db.clone();
        save(&mut user, &mut conn).await.unwrap();

        assert_eq!(user.id, Some(7));
        let statements = db.committed();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].sql,
            "INSERT INTO users (name, team_id) VALUES ($1, $2) RETURNING *"
        );
    }

    #[tokio::test]
    async fn test_save_updates_by_primary_key() {
        let db = MemoryDatabase::new();
        let mut user = TestUser::new("ann");
        user.id = Some(3);
        user.team_id = Some(9);

        let mut conn = db.clone();
        save(&mut user, &mut conn).await.unwrap();

        let statements = db.committed();
        assert_eq!(statements[0].sql, "UPDATE users SET name = $1, team_id = $2 WHERE id = $3");
        assert_eq!(statements[0].params[1], DatabaseValue::Int32(9));
        assert_eq!(statements[0].params[2], DatabaseValue::Int32(3));
    }

    #[tokio::test]
    async fn test_insert_without_returned_row_fails() {
        let db = MemoryDatabase::new();
        let mut user = TestUser::new("ann");
        let mut conn = db.clone();
        let err = save(&mut user, &mut conn).await.unwrap_err();
        assert!(matches!(err, ModelError::Database(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_primary_key() {
        let db = MemoryDatabase::new();
        let user = TestUser::new("ann");
        let mut conn = db.clone();
        let err = delete(&user, &mut conn).await.unwrap_err();
        assert_eq!(err, ModelError::MissingPrimaryKey);
    }

    #[tokio::test]
    async fn test_find_by_key() {
        let db = MemoryDatabase::new();
        db.push_response(vec![ValueRow::new().with("id", 5i64).with("name", "bo").with("team_id", 2i64)]);
        let mut conn = db.clone();

        let user: Option<TestUser> = find(&mut conn, 5).await.unwrap();
        let user = user.unwrap();
        assert_eq!(user.name, "bo");
        assert_eq!(user.team_id, Some(2));
        assert_eq!(db.committed()[0].sql, "SELECT * FROM users WHERE id = $1 LIMIT 1");
    }
}
