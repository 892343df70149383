//! Relationships Module - associations between models
//!
//! One-to-one, one-to-many and belongs-to containers scoped by foreign key,
//! plus many-to-many queries through a pivot table.

pub mod belongs_to;
pub mod has_many;
pub mod has_one;
pub mod many_to_many;
pub mod metadata;
pub mod pivot;
pub mod traits;

// Re-export main types
pub use belongs_to::BelongsTo;
pub use has_many::HasMany;
pub use has_one::HasOne;
pub use many_to_many::{
    ConstraintState, ManyToManyQueryBuilder, ManyToManySubQueryBuilder, PivotParent, PivotRow, QueryOperation,
};
pub use metadata::{ManyToManyConfig, PivotTimestamps, RelationshipType, DEFAULT_PIVOT_ALIAS_PREFIX};
pub use pivot::{qualify_column, PivotColumnHelper, PredicateArgs, PredicateKind};
pub use traits::{Relationship, RelationshipMeta};
