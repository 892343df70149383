//! Relationship Traits - Core traits for relationship management

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use super::metadata::RelationshipType;
use crate::backends::DatabaseExecutor;
use crate::error::{ModelResult, RelationError};
use crate::model::Model;
use crate::query::QueryBuilder;

/// Relationship metadata
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipMeta {
    pub relationship_type: RelationshipType,
    /// Column holding the reference (on the related side for has-one/has-many,
    /// on the owning side for belongs-to)
    pub foreign_key: String,
    /// Column the foreign key points at
    pub local_key: String,
    pub related_table: String,
}

impl RelationshipMeta {
    /// Foreign key attributes that tie a related record to `owner`
    pub fn foreign_key_attributes<M: Model>(&self, owner: &M) -> ModelResult<HashMap<String, Value>> {
        let key = key_value(owner, &self.local_key).ok_or_else(|| RelationError::MissingParentKey {
            relation: self.related_table.clone(),
            local_key: self.local_key.clone(),
        })?;
        Ok(HashMap::from([(self.foreign_key.clone(), key)]))
    }
}

/// Non-null value of `column` on `model`
pub(crate) fn key_value<M: Model>(model: &M, column: &str) -> Option<Value> {
    model.field(column).filter(|value| !value.is_null())
}

/// Core relationship trait
#[async_trait]
pub trait Relationship<Parent, Related>
where
    Parent: Model,
    Related: Model,
{
    /// Get relationship metadata
    fn meta(&self) -> &RelationshipMeta;

    /// Get the parent model instance
    fn parent(&self) -> &Parent;

    /// Check if the relationship has been loaded
    fn is_loaded(&self) -> bool;

    /// Mark the relationship as loaded
    fn set_loaded(&mut self, loaded: bool);

    /// Build a query for this relationship
    fn query(&self) -> ModelResult<QueryBuilder<Related>>;

    /// Load the relationship from the database
    async fn load(&mut self, executor: &mut dyn DatabaseExecutor) -> ModelResult<()>;
}
