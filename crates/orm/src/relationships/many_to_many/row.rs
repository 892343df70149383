//! Related rows fetched through a pivot table

use std::collections::HashMap;

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::timestamps::normalize_pivot_timestamps;
use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::ModelResult;
use crate::model::Model;
use crate::relationships::metadata::ManyToManyConfig;

/// A related model plus the pivot columns selected alongside it
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow<M> {
    pub model: M,
    pub extras: HashMap<String, DatabaseValue>,
    alias_prefix: String,
}

impl<M: Model> PivotRow<M> {
    /// Hydrate the model and collect every column carrying the alias prefix
    pub fn hydrate(row: &dyn DatabaseRow, config: &ManyToManyConfig) -> ModelResult<Self> {
        let model = M::from_row(row)?;

        let mut extras = HashMap::new();
        for name in row.column_names() {
            if name.starts_with(&config.alias_prefix) {
                let value = row.get_by_name(&name)?;
                extras.insert(name, value);
            }
        }
        normalize_pivot_timestamps(&mut extras, &config.alias_prefix, &config.timestamp_columns());

        Ok(Self {
            model,
            extras,
            alias_prefix: config.alias_prefix.clone(),
        })
    }
}

impl<M> PivotRow<M> {
    /// Value of a pivot column by its unprefixed name
    pub fn pivot(&self, column: &str) -> Option<&DatabaseValue> {
        self.extras.get(&format!("{}{}", self.alias_prefix, column))
    }

    /// Value of an extra column by its full alias
    pub fn extra(&self, alias: &str) -> Option<&DatabaseValue> {
        self.extras.get(alias)
    }

    pub fn into_model(self) -> M {
        self.model
    }
}

/// Serialises as the model's fields with the pivot values under `"meta"`
impl<M: Serialize> Serialize for PivotRow<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value =
            serde_json::to_value(&self.model).map_err(<S::Error as serde::ser::Error>::custom)?;

        if !self.extras.is_empty() {
            if let Value::Object(fields) = &mut value {
                let meta: Map<String, Value> = self
                    .extras
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect();
                fields.insert("meta".to_string(), Value::Object(meta));
            }
        }

        value.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ValueRow;
    use crate::testing::{Skill, User};
    use serde_json::json;

    #[test]
    fn test_hydrate_splits_model_and_extras() {
        let config = ManyToManyConfig::new::<User, Skill>("skills", "skill_user", "user_id", "skill_id")
            .with_timestamps();
        let row = ValueRow::new()
            .with("id", 3i64)
            .with("name", "rust")
            .with("pivot_user_id", 1i64)
            .with("pivot_skill_id", 3i64)
            .with("pivot_created_at", "2024-03-01 10:30:00");

        let pivot_row = PivotRow::<Skill>::hydrate(&row, &config).unwrap();

        assert_eq!(pivot_row.model.name, "rust");
        assert_eq!(pivot_row.extras.len(), 3);
        assert_eq!(pivot_row.pivot("user_id"), Some(&DatabaseValue::Int64(1)));
        assert!(matches!(pivot_row.pivot("created_at"), Some(DatabaseValue::DateTime(_))));
        assert_eq!(pivot_row.pivot("updated_at"), None);
    }

    #[test]
    fn test_serialize_nests_extras_under_meta() {
        let config = ManyToManyConfig::new::<User, Skill>("skills", "skill_user", "user_id", "skill_id");
        let row = ValueRow::new().with("id", 3i64).with("name", "rust").with("pivot_user_id", 1i64);
        let pivot_row = PivotRow::<Skill>::hydrate(&row, &config).unwrap();

        let value = serde_json::to_value(&pivot_row).unwrap();
        assert_eq!(value, json!({"id": 3, "name": "rust", "meta": {"pivot_user_id": 1}}));
    }
}
