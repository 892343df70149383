//! Query Builder pagination operations

use super::builder::QueryBuilder;

impl<M> QueryBuilder<M> {
    /// Add LIMIT clause
    pub fn limit(mut self, count: u64) -> Self {
        self.limit_count = Some(count);
        self
    }

    /// Add OFFSET clause
    pub fn offset(mut self, count: u64) -> Self {
        self.offset_value = Some(count);
        self
    }

    /// LIMIT + OFFSET for a 1-based page
    pub fn for_page(mut self, page: u64, per_page: u64) -> Self {
        self.limit_count = Some(per_page);
        self.offset_value = Some(page.max(1).saturating_sub(1).saturating_mul(per_page));
        self
    }

    /// Drop LIMIT and OFFSET
    pub fn clear_limit(mut self) -> Self {
        self.limit_count = None;
        self.offset_value = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_page_offsets() {
        let sql = QueryBuilder::<()>::new().from("users").for_page(3, 15).to_sql();
        assert_eq!(sql, "SELECT * FROM users LIMIT 15 OFFSET 30");

        let first = QueryBuilder::<()>::new().from("users").for_page(0, 15).to_sql();
        assert_eq!(first, "SELECT * FROM users LIMIT 15 OFFSET 0");
    }
}
