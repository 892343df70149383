//! Pagination results
//!
//! `SimplePaginator` wraps one page of rows with the total count and builds
//! page URLs and metadata from it. Metadata key spelling is pluggable through
//! `PaginationNamingStrategy`.

pub mod naming;
pub mod simple_paginator;

pub use naming::{
    default_naming_strategy, set_default_naming_strategy, CamelCaseNaming, PaginationMetaKeys,
    PaginationNamingStrategy, SnakeCaseNaming,
};
pub use simple_paginator::{PageLink, SimplePaginator};

/// Page size used when a caller does not pick one
pub const DEFAULT_PER_PAGE: u64 = 20;
