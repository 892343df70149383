//! Core Model Trait - Base definition for database entities
//!
//! Defines the Model trait with table metadata, primary key handling,
//! timestamp configuration, and the attribute access the relation builders
//! rely on (reading a key column, merging attributes, hydrating from rows).

use std::collections::HashMap;
use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backends::DatabaseRow;
use crate::error::{ModelError, ModelResult};

/// Core trait for database models
pub trait Model: Send + Sync + Debug + Serialize + for<'de> Deserialize<'de> {
    /// The type used for this model's primary key
    type PrimaryKey: Clone + Send + Sync + Debug + Display + Serialize;

    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key column name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Get the primary key value for this model instance
    fn primary_key(&self) -> Option<Self::PrimaryKey>;

    /// Set the primary key value for this model instance
    fn set_primary_key(&mut self, key: Self::PrimaryKey);

    /// Check if this model uses timestamps (created_at, updated_at)
    fn uses_timestamps() -> bool {
        false
    }

    /// Get created_at timestamp if available
    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Set created_at timestamp
    fn set_created_at(&mut self, _timestamp: DateTime<Utc>) {}

    /// Get updated_at timestamp if available
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Set updated_at timestamp
    fn set_updated_at(&mut self, _timestamp: DateTime<Utc>) {}

    /// Whether the record has been persisted
    fn is_persisted(&self) -> bool {
        self.primary_key().is_some()
    }

    /// Primary key as a JSON value, `None` when unset
    fn primary_key_value(&self) -> Option<Value> {
        self.primary_key()
            .and_then(|key| serde_json::to_value(key).ok())
            .filter(|value| !value.is_null())
    }

    /// Create a model instance from a database row
    ///
    /// The default decodes the row's columns with serde, ignoring columns the
    /// model does not declare.
    fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self>
    where
        Self: Sized,
    {
        let json = row.to_json()?;
        serde_json::from_value(json).map_err(|e| {
            ModelError::Serialization(format!("Failed to hydrate {}: {}", Self::table_name(), e))
        })
    }

    /// Convert model to field-value pairs for database operations
    fn to_fields(&self) -> HashMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => HashMap::new(),
        }
    }

    /// Read a single attribute
    fn field(&self, name: &str) -> Option<Value> {
        self.to_fields().remove(name)
    }

    /// Overwrite attributes in place
    fn merge(&mut self, attributes: HashMap<String, Value>) -> ModelResult<()>
    where
        Self: Sized,
    {
        let mut value = serde_json::to_value(&*self)?;
        let object = value.as_object_mut().ok_or_else(|| {
            ModelError::Serialization(format!("{} does not serialize to an object", Self::table_name()))
        })?;
        object.extend(attributes);
        *self = serde_json::from_value(value)?;
        Ok(())
    }
}
