//! Naming strategies for pagination metadata keys

use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

/// Keys used when serialising paginator metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationMetaKeys {
    pub total: String,
    pub per_page: String,
    pub current_page: String,
    pub last_page: String,
    pub first_page: String,
    pub first_page_url: String,
    pub last_page_url: String,
    pub next_page_url: String,
    pub previous_page_url: String,
}

/// Decides how pagination metadata keys are spelled
pub trait PaginationNamingStrategy: Send + Sync {
    fn pagination_meta_keys(&self) -> PaginationMetaKeys;
}

/// `per_page`, `current_page`, ...
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCaseNaming;

impl PaginationNamingStrategy for SnakeCaseNaming {
    fn pagination_meta_keys(&self) -> PaginationMetaKeys {
        PaginationMetaKeys {
            total: "total".to_string(),
            per_page: "per_page".to_string(),
            current_page: "current_page".to_string(),
            last_page: "last_page".to_string(),
            first_page: "first_page".to_string(),
            first_page_url: "first_page_url".to_string(),
            last_page_url: "last_page_url".to_string(),
            next_page_url: "next_page_url".to_string(),
            previous_page_url: "previous_page_url".to_string(),
        }
    }
}

/// `perPage`, `currentPage`, ...
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCaseNaming;

impl PaginationNamingStrategy for CamelCaseNaming {
    fn pagination_meta_keys(&self) -> PaginationMetaKeys {
        PaginationMetaKeys {
            total: "total".to_string(),
            per_page: "perPage".to_string(),
            current_page: "currentPage".to_string(),
            last_page: "lastPage".to_string(),
            first_page: "firstPage".to_string(),
            first_page_url: "firstPageUrl".to_string(),
            last_page_url: "lastPageUrl".to_string(),
            next_page_url: "nextPageUrl".to_string(),
            previous_page_url: "previousPageUrl".to_string(),
        }
    }
}

static DEFAULT_NAMING_STRATEGY: Lazy<RwLock<Arc<dyn PaginationNamingStrategy>>> =
    Lazy::new(|| RwLock::new(Arc::new(SnakeCaseNaming)));

/// Replace the process-wide strategy used by paginators without their own
///
/// Meant to be called once during startup.
pub fn set_default_naming_strategy(strategy: Arc<dyn PaginationNamingStrategy>) {
    let mut current = DEFAULT_NAMING_STRATEGY
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *current = strategy;
}

/// The process-wide default strategy
pub fn default_naming_strategy() -> Arc<dyn PaginationNamingStrategy> {
    DEFAULT_NAMING_STRATEGY
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}
