//! Error types for the relations layer
//!
//! Provides error handling for query building, relationship usage,
//! model persistence and transaction failures.

use std::fmt;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Database connection or query error
    Database(String),
    /// Model not found in database
    NotFound(String),
    /// Model validation failed
    Validation(String),
    /// Primary key is missing or invalid
    MissingPrimaryKey,
    /// Relationship usage or loading failed
    Relationship(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Connection pool error
    Connection(String),
    /// Transaction error
    Transaction(String),
    /// Query building error
    Query(String),
    /// Configuration error
    Configuration(String),
    /// Column missing from a result row
    ColumnNotFound(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::NotFound(table) => write!(f, "Record not found in table '{}'", table),
            ModelError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ModelError::MissingPrimaryKey => write!(f, "Primary key is missing or invalid"),
            ModelError::Relationship(msg) => write!(f, "Relationship error: {}", msg),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ModelError::Transaction(msg) => write!(f, "Transaction error: {}", msg),
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ModelError::ColumnNotFound(column) => write!(f, "Column '{}' not found in row", column),
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

/// Misuse of the relationship API
///
/// These are programming errors rather than data problems and are surfaced
/// before any query is issued.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RelationError {
    #[error("Cannot paginate relationship \"{relation}\" during preload")]
    PaginateOnPreload { relation: String },

    #[error("Cannot paginate relationship \"{relation}\" with a per-parent group limit")]
    PaginateGroupLimit { relation: String },

    #[error("Cannot build \"{relation}\" query: parent has no value for local key \"{local_key}\"")]
    MissingParentKey { relation: String, local_key: String },

    #[error("Unsupported pivot operation: {0}")]
    UnsupportedPivotOperation(String),

    #[error("Invalid relationship configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<RelationError> for ModelError {
    fn from(err: RelationError) -> Self {
        match err {
            RelationError::InvalidConfiguration(msg) => ModelError::Configuration(msg),
            other => ModelError::Relationship(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_error_converts_to_relationship_variant() {
        let err: ModelError = RelationError::PaginateOnPreload {
            relation: "skills".to_string(),
        }
        .into();

        match err {
            ModelError::Relationship(msg) => assert!(msg.contains("preload")),
            other => panic!("expected relationship error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_configuration_maps_to_configuration() {
        let err: ModelError = RelationError::InvalidConfiguration("empty pivot table".to_string()).into();
        assert_eq!(err, ModelError::Configuration("empty pivot table".to_string()));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ModelError::NotFound("users".to_string()).to_string(),
            "Record not found in table 'users'"
        );
        assert_eq!(
            ModelError::ColumnNotFound("email".to_string()).to_string(),
            "Column 'email' not found in row"
        );
    }
}
