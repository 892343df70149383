//! Relationship Metadata - Relation kinds and the many-to-many descriptor

use serde::{Deserialize, Serialize};

use crate::error::RelationError;
use crate::model::Model;

/// Defines the type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// One-to-one relationship (hasOne)
    HasOne,
    /// One-to-many relationship (hasMany)
    HasMany,
    /// Many-to-one relationship (belongsTo)
    BelongsTo,
    /// Many-to-many relationship through a pivot table
    ManyToMany,
}

impl RelationshipType {
    /// Returns true if this relationship returns a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }

    /// Returns true if this relationship requires a pivot table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::ManyToMany)
    }
}

/// Timestamp columns maintained on a pivot table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotTimestamps {
    pub created_at: String,
    pub updated_at: String,
}

impl Default for PivotTimestamps {
    fn default() -> Self {
        Self {
            created_at: "created_at".to_string(),
            updated_at: "updated_at".to_string(),
        }
    }
}

/// Default prefix for pivot columns in result rows
pub const DEFAULT_PIVOT_ALIAS_PREFIX: &str = "pivot_";

/// Everything a many-to-many relation needs to know about its three tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManyToManyConfig {
    /// Relation name, used in error messages and logs
    pub name: String,
    pub parent_table: String,
    pub related_table: String,
    /// The pivot table name
    pub pivot_table: String,
    /// Pivot column pointing at the parent
    pub pivot_foreign_key: String,
    /// Pivot column pointing at the related model
    pub pivot_related_foreign_key: String,
    /// Parent column referenced by `pivot_foreign_key`
    pub local_key: String,
    /// Related column referenced by `pivot_related_foreign_key`
    pub related_key: String,
    /// Extra pivot columns selected with every row
    pub pivot_columns: Vec<String>,
    pub timestamps: Option<PivotTimestamps>,
    pub alias_prefix: String,
}

impl ManyToManyConfig {
    /// Describe a relation from `Parent` to `Related` through `pivot_table`
    pub fn new<Parent: Model, Related: Model>(
        name: &str,
        pivot_table: &str,
        pivot_foreign_key: &str,
        pivot_related_foreign_key: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            parent_table: Parent::table_name().to_string(),
            related_table: Related::table_name().to_string(),
            pivot_table: pivot_table.to_string(),
            pivot_foreign_key: pivot_foreign_key.to_string(),
            pivot_related_foreign_key: pivot_related_foreign_key.to_string(),
            local_key: Parent::primary_key_name().to_string(),
            related_key: Related::primary_key_name().to_string(),
            pivot_columns: Vec::new(),
            timestamps: None,
            alias_prefix: DEFAULT_PIVOT_ALIAS_PREFIX.to_string(),
        }
    }

    pub fn relationship_type(&self) -> RelationshipType {
        RelationshipType::ManyToMany
    }

    /// Select extra pivot columns with every row
    pub fn with_pivot_columns(mut self, columns: &[&str]) -> Self {
        self.pivot_columns.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Maintain `created_at`/`updated_at` on the pivot table
    pub fn with_timestamps(mut self) -> Self {
        self.timestamps = Some(PivotTimestamps::default());
        self
    }

    pub fn with_timestamp_columns(mut self, created_at: &str, updated_at: &str) -> Self {
        self.timestamps = Some(PivotTimestamps {
            created_at: created_at.to_string(),
            updated_at: updated_at.to_string(),
        });
        self
    }

    pub fn with_alias_prefix(mut self, prefix: &str) -> Self {
        self.alias_prefix = prefix.to_string();
        self
    }

    pub fn with_local_key(mut self, local_key: &str) -> Self {
        self.local_key = local_key.to_string();
        self
    }

    pub fn with_related_key(mut self, related_key: &str) -> Self {
        self.related_key = related_key.to_string();
        self
    }

    /// Pivot timestamp column names, created first
    pub fn timestamp_columns(&self) -> Vec<String> {
        self.timestamps
            .as_ref()
            .map(|t| vec![t.created_at.clone(), t.updated_at.clone()])
            .unwrap_or_default()
    }

    /// Every pivot column selected alongside related rows, in select order
    pub fn selected_pivot_columns(&self) -> Vec<String> {
        let mut columns = vec![
            self.pivot_foreign_key.clone(),
            self.pivot_related_foreign_key.clone(),
        ];
        for column in self.pivot_columns.iter().cloned().chain(self.timestamp_columns()) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    /// Validate the descriptor
    pub fn validate(&self) -> Result<(), RelationError> {
        let required = [
            ("pivot table", &self.pivot_table),
            ("pivot foreign key", &self.pivot_foreign_key),
            ("pivot related foreign key", &self.pivot_related_foreign_key),
            ("local key", &self.local_key),
            ("related key", &self.related_key),
            ("related table", &self.related_table),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(RelationError::InvalidConfiguration(format!(
                    "Relation '{}' has an empty {}",
                    self.name, label
                )));
            }
        }

        if self.pivot_foreign_key == self.pivot_related_foreign_key {
            return Err(RelationError::InvalidConfiguration(format!(
                "Relation '{}' uses '{}' for both pivot keys",
                self.name, self.pivot_foreign_key
            )));
        }

        Ok(())
    }
}
