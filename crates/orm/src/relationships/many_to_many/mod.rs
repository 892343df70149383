//! Many-to-many relationships
//!
//! Queries over a related table joined through a pivot table, either for one
//! parent, for a batch of parents (preload), or correlated to an outer query.

use std::collections::HashSet;

use serde_json::Value;

pub mod query_builder;
pub mod row;
pub mod sub_query_builder;
pub mod timestamps;

pub use query_builder::{ManyToManyQueryBuilder, GROUP_LIMIT_ALIAS, GROUP_LIMIT_COUNTER};
pub use row::PivotRow;
pub use sub_query_builder::ManyToManySubQueryBuilder;
pub use timestamps::{normalize_pivot_timestamps, normalize_timestamp, parse_timestamp};

/// Whether relation constraints have been added to a builder yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintState {
    Unconstrained,
    Constrained,
}

/// Statement a builder is being constrained for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperation {
    Select,
    Update,
    Delete,
}

/// Parent key value(s) the pivot foreign key is matched against
#[derive(Debug, Clone, PartialEq)]
pub enum PivotParent {
    Single(Value),
    Many(Vec<Value>),
}

impl PivotParent {
    /// Distinct values in first-seen order
    pub fn many(values: impl IntoIterator<Item = Value>) -> Self {
        let mut seen = HashSet::new();
        let unique = values
            .into_iter()
            .filter(|value| seen.insert(value.to_string()))
            .collect();
        PivotParent::Many(unique)
    }

    pub fn len(&self) -> usize {
        match self {
            PivotParent::Single(_) => 1,
            PivotParent::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_many_dedupes_in_order() {
        let parent = PivotParent::many(vec![json!(3), json!(1), json!(3), json!("3"), json!(1)]);
        assert_eq!(parent, PivotParent::Many(vec![json!(3), json!(1), json!("3")]));
        assert_eq!(parent.len(), 3);
    }

    #[test]
    fn test_empty_batch() {
        assert!(PivotParent::many(Vec::new()).is_empty());
        assert!(!PivotParent::Single(json!(1)).is_empty());
    }
}
