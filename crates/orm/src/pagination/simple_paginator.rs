//! Offset paginator over an already fetched page of rows

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use url::form_urlencoded;

use super::naming::{default_naming_strategy, PaginationNamingStrategy};

/// One entry of a page-link range
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PageLink {
    pub url: String,
    /// Page as requested; only the URL is clamped
    pub page: i64,
    pub is_active: bool,
}

/// Rows of one page plus everything derived from the total count
///
/// Derived values are computed once at construction. `current_page` is
/// expected to be at least 1.
pub struct SimplePaginator<T> {
    rows: Vec<T>,
    total: u64,
    per_page: u64,
    current_page: u64,
    first_page: u64,
    last_page: u64,
    has_more_pages: bool,
    base_url: String,
    query_string: BTreeMap<String, String>,
    naming_strategy: Option<Arc<dyn PaginationNamingStrategy>>,
}

impl<T> SimplePaginator<T> {
    pub fn new(total: u64, per_page: u64, current_page: u64, rows: Vec<T>) -> Self {
        let divisor = per_page.max(1);
        let last_page = total.div_ceil(divisor).max(1);

        Self {
            rows,
            total,
            per_page,
            current_page,
            first_page: 1,
            last_page,
            has_more_pages: last_page > current_page,
            base_url: "/".to_string(),
            query_string: BTreeMap::new(),
            naming_strategy: None,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn first_page(&self) -> u64 {
        self.first_page
    }

    pub fn last_page(&self) -> u64 {
        self.last_page
    }

    /// No rows on this page
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Some rows exist in total
    pub fn has_total(&self) -> bool {
        self.total > 0
    }

    pub fn has_more_pages(&self) -> bool {
        self.has_more_pages
    }

    /// More than one page exists
    pub fn has_pages(&self) -> bool {
        self.last_page != 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn all(&self) -> &[T] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    /// Base URL page links are built from
    pub fn base_url(&mut self, url: &str) -> &mut Self {
        self.base_url = url.to_string();
        self
    }

    /// Extra query-string entries carried on every page link
    pub fn query_string<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query_string = values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Override the process-wide naming strategy for this paginator
    pub fn naming_strategy(&mut self, strategy: Arc<dyn PaginationNamingStrategy>) -> &mut Self {
        self.naming_strategy = Some(strategy);
        self
    }

    /// URL for `page`, clamped to 1
    ///
    /// The page entry always comes last and replaces any `page` key from the
    /// configured query string.
    pub fn get_url(&self, page: i64) -> String {
        let page = page.max(1);
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.query_string {
            if key != "page" {
                serializer.append_pair(key, value);
            }
        }
        serializer.append_pair("page", &page.to_string());
        format!("{}?{}", self.base_url, serializer.finish())
    }

    pub fn get_next_page_url(&self) -> Option<String> {
        if self.has_more_pages {
            Some(self.get_url(self.current_page as i64 + 1))
        } else {
            None
        }
    }

    pub fn get_previous_page_url(&self) -> Option<String> {
        if self.current_page > 1 {
            Some(self.get_url(self.current_page as i64 - 1))
        } else {
            None
        }
    }

    /// Links for every page in `start..=end`
    pub fn get_urls_for_range(&self, start: i64, end: i64) -> Vec<PageLink> {
        (start..=end)
            .map(|page| PageLink {
                url: self.get_url(page),
                page,
                is_active: page == self.current_page as i64,
            })
            .collect()
    }

    /// Pagination metadata keyed by the active naming strategy
    pub fn get_meta(&self) -> Map<String, Value> {
        let keys = self
            .naming_strategy
            .clone()
            .unwrap_or_else(default_naming_strategy)
            .pagination_meta_keys();

        let optional_url = |url: Option<String>| url.map(Value::String).unwrap_or(Value::Null);

        let mut meta = Map::new();
        meta.insert(keys.total, Value::from(self.total));
        meta.insert(keys.per_page, Value::from(self.per_page));
        meta.insert(keys.current_page, Value::from(self.current_page));
        meta.insert(keys.last_page, Value::from(self.last_page));
        meta.insert(keys.first_page, Value::from(self.first_page));
        meta.insert(keys.first_page_url, Value::String(self.get_url(1)));
        meta.insert(keys.last_page_url, Value::String(self.get_url(self.last_page as i64)));
        meta.insert(keys.next_page_url, optional_url(self.get_next_page_url()));
        meta.insert(keys.previous_page_url, optional_url(self.get_previous_page_url()));
        meta
    }

    /// Transform the rows of this page, keeping every setting
    pub fn map<U, F>(self, f: F) -> SimplePaginator<U>
    where
        F: FnMut(T) -> U,
    {
        SimplePaginator {
            rows: self.rows.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
            first_page: self.first_page,
            last_page: self.last_page,
            has_more_pages: self.has_more_pages,
            base_url: self.base_url,
            query_string: self.query_string,
            naming_strategy: self.naming_strategy,
        }
    }
}

impl<T: Serialize> SimplePaginator<T> {
    /// `{ "meta": ..., "data": [...] }`
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl<T: Serialize> Serialize for SimplePaginator<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("meta", &self.get_meta())?;
        map.serialize_entry("data", &self.rows)?;
        map.end()
    }
}

impl<T: fmt::Debug> fmt::Debug for SimplePaginator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimplePaginator")
            .field("total", &self.total)
            .field("per_page", &self.per_page)
            .field("current_page", &self.current_page)
            .field("last_page", &self.last_page)
            .field("rows", &self.rows)
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a SimplePaginator<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
