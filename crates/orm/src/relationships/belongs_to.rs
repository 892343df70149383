//! BelongsTo Relationship - child record referencing a parent by foreign key
//!
//! Besides loading the parent, the relation can associate a (possibly new)
//! parent with the child inside a transaction, or clear the reference.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::metadata::RelationshipType;
use super::traits::{key_value, Relationship, RelationshipMeta};
use crate::backends::{DatabaseExecutor, DatabasePool, DatabaseTransaction};
use crate::error::{ModelError, ModelResult, RelationError};
use crate::model::persistence::save;
use crate::model::Model;
use crate::query::QueryBuilder;

/// BelongsTo relationship - child model belongs to a parent model
#[derive(Debug)]
pub struct BelongsTo<Child, Parent>
where
    Child: Model,
    Parent: Model,
{
    child: Child,
    parent: Option<Parent>,
    meta: RelationshipMeta,
    loaded: bool,
}

impl<Child, Parent> BelongsTo<Child, Parent>
where
    Child: Model,
    Parent: Model,
{
    /// Create a new BelongsTo relationship
    pub fn new(child: Child, foreign_key: &str) -> Self {
        Self {
            child,
            parent: None,
            meta: RelationshipMeta {
                relationship_type: RelationshipType::BelongsTo,
                foreign_key: foreign_key.to_string(),
                local_key: Parent::primary_key_name().to_string(),
                related_table: Parent::table_name().to_string(),
            },
            loaded: false,
        }
    }

    /// Reference a parent column other than its primary key
    pub fn with_owner_key(mut self, owner_key: &str) -> Self {
        self.meta.local_key = owner_key.to_string();
        self
    }

    pub fn child(&self) -> &Child {
        &self.child
    }

    pub fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    pub fn into_child(self) -> Child {
        self.child
    }

    /// Get the parent model if loaded
    pub fn get(&self) -> Option<&Parent> {
        self.parent.as_ref()
    }

    /// Get the parent model as mutable if loaded
    pub fn get_mut(&mut self) -> Option<&mut Parent> {
        self.parent.as_mut()
    }

    /// Take ownership of the parent model
    pub fn take(&mut self) -> Option<Parent> {
        self.parent.take()
    }

    /// Set the parent model
    pub fn set(&mut self, parent: Option<Parent>) {
        self.parent = parent;
        self.loaded = true;
    }

    /// Get the foreign key value from the child model
    pub fn foreign_key_value(&self) -> Option<Value> {
        key_value(&self.child, &self.meta.foreign_key)
    }

    /// Check if the relationship has a foreign key value
    pub fn has_foreign_key(&self) -> bool {
        self.foreign_key_value().is_some()
    }

    fn set_foreign_key(&mut self, value: Value) -> ModelResult<()> {
        self.child
            .merge(HashMap::from([(self.meta.foreign_key.clone(), value)]))
    }

    fn restore_foreign_key(&mut self, previous: Value) {
        if let Err(err) = self.set_foreign_key(previous) {
            warn!(
                foreign_key = %self.meta.foreign_key,
                error = %err,
                "could not restore foreign key after failed save"
            );
        }
    }

    /// Save `parent` and point the child at it, in one transaction
    ///
    /// The transaction is committed on success and rolled back on any
    /// failure, in which case the original error is returned.
    pub async fn associate(&mut self, parent: Parent, pool: &dyn DatabasePool) -> ModelResult<()> {
        let mut tx = pool.begin_transaction().await?;
        debug!(table = Child::table_name(), related = %self.meta.related_table, "began associate transaction");

        match self.associate_in(parent, tx.as_mut()).await {
            Ok(()) => {
                tx.commit().await?;
                debug!(table = Child::table_name(), "committed associate transaction");
                Ok(())
            }
            Err(err) => {
                warn!(table = Child::table_name(), error = %err, "associate failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback after failed associate also failed");
                }
                Err(err)
            }
        }
    }

    /// Save `parent` and point the child at it on a caller-owned transaction
    ///
    /// Never commits or rolls back. When saving the child fails its previous
    /// foreign key value is put back.
    pub async fn associate_in(&mut self, mut parent: Parent, tx: &mut dyn DatabaseTransaction) -> ModelResult<()> {
        save(&mut parent, tx.as_executor()).await?;

        let key = key_value(&parent, &self.meta.local_key).ok_or_else(|| {
            ModelError::from(RelationError::MissingParentKey {
                relation: self.meta.related_table.clone(),
                local_key: self.meta.local_key.clone(),
            })
        })?;

        let previous = self.child.field(&self.meta.foreign_key).unwrap_or(Value::Null);
        self.set_foreign_key(key)?;

        if let Err(err) = save(&mut self.child, tx.as_executor()).await {
            self.restore_foreign_key(previous);
            return Err(err);
        }

        self.set(Some(parent));
        Ok(())
    }

    /// Clear the foreign key and save the child
    pub async fn dissociate(&mut self, executor: &mut dyn DatabaseExecutor) -> ModelResult<()> {
        let previous = self.child.field(&self.meta.foreign_key).unwrap_or(Value::Null);
        self.set_foreign_key(Value::Null)?;

        if let Err(err) = save(&mut self.child, executor).await {
            self.restore_foreign_key(previous);
            return Err(err);
        }

        debug!(table = Child::table_name(), foreign_key = %self.meta.foreign_key, "dissociated");
        self.set(None);
        Ok(())
    }
}

#[async_trait]
impl<Child, Parent> Relationship<Child, Parent> for BelongsTo<Child, Parent>
where
    Child: Model + 'static,
    Parent: Model + 'static,
{
    fn meta(&self) -> &RelationshipMeta {
        &self.meta
    }

    fn parent(&self) -> &Child {
        &self.child
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    fn query(&self) -> ModelResult<QueryBuilder<Parent>> {
        let key = self.foreign_key_value().ok_or_else(|| RelationError::MissingParentKey {
            relation: self.meta.related_table.clone(),
            local_key: self.meta.foreign_key.clone(),
        })?;

        Ok(QueryBuilder::new()
            .from(&self.meta.related_table)
            .where_eq(&self.meta.local_key, key))
    }

    async fn load(&mut self, executor: &mut dyn DatabaseExecutor) -> ModelResult<()> {
        self.parent = match self.foreign_key_value() {
            Some(_) => self.query()?.first(executor).await?,
            None => None,
        };
        self.loaded = true;
        Ok(())
    }
}
