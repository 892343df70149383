//! HasMany Relationship - parent record owning a collection of related records

use async_trait::async_trait;

use super::metadata::RelationshipType;
use super::traits::{Relationship, RelationshipMeta};
use crate::backends::DatabaseExecutor;
use crate::error::ModelResult;
use crate::model::persistence::save;
use crate::model::Model;
use crate::pagination::SimplePaginator;
use crate::query::QueryBuilder;

/// HasMany relationship - parent model has many related models
#[derive(Debug)]
pub struct HasMany<Parent, Related>
where
    Parent: Model,
    Related: Model,
{
    parent: Parent,
    related: Vec<Related>,
    meta: RelationshipMeta,
    loaded: bool,
}

impl<Parent, Related> HasMany<Parent, Related>
where
    Parent: Model,
    Related: Model,
{
    /// Create a new HasMany relationship
    pub fn new(parent: Parent, foreign_key: &str) -> Self {
        Self {
            parent,
            related: Vec::new(),
            meta: RelationshipMeta {
                relationship_type: RelationshipType::HasMany,
                foreign_key: foreign_key.to_string(),
                local_key: Parent::primary_key_name().to_string(),
                related_table: Related::table_name().to_string(),
            },
            loaded: false,
        }
    }

    pub fn with_local_key(mut self, local_key: &str) -> Self {
        self.meta.local_key = local_key.to_string();
        self
    }

    /// Get all related models
    pub fn get(&self) -> &[Related] {
        &self.related
    }

    /// Get mutable reference to all related models
    pub fn get_mut(&mut self) -> &mut Vec<Related> {
        &mut self.related
    }

    /// Take ownership of all related models
    pub fn take(&mut self) -> Vec<Related> {
        std::mem::take(&mut self.related)
    }

    /// Set the related models
    pub fn set(&mut self, related: Vec<Related>) {
        self.related = related;
        self.loaded = true;
    }

    /// Add a related model
    pub fn push(&mut self, related: Related) {
        self.related.push(related);
    }

    /// Get the count of related models
    pub fn len(&self) -> usize {
        self.related.len()
    }

    /// Check if there are any related models
    pub fn is_empty(&self) -> bool {
        self.related.is_empty()
    }

    /// Iterate over related models
    pub fn iter(&self) -> std::slice::Iter<'_, Related> {
        self.related.iter()
    }

    /// Iterate mutably over related models
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Related> {
        self.related.iter_mut()
    }

    /// Point `related` at the parent, save it and append it
    pub async fn save(&mut self, mut related: Related, executor: &mut dyn DatabaseExecutor) -> ModelResult<()> {
        related.merge(self.meta.foreign_key_attributes(&self.parent)?)?;
        save(&mut related, executor).await?;
        self.related.push(related);
        Ok(())
    }
}

impl<Parent, Related> HasMany<Parent, Related>
where
    Parent: Model + 'static,
    Related: Model + 'static,
{
    /// Fetch one page of related models
    pub async fn paginate(
        &self,
        executor: &mut dyn DatabaseExecutor,
        page: u64,
        per_page: u64,
    ) -> ModelResult<SimplePaginator<Related>> {
        self.query()?.paginate(executor, page, per_page).await
    }
}

#[async_trait]
impl<Parent, Related> Relationship<Parent, Related> for HasMany<Parent, Related>
where
    Parent: Model + 'static,
    Related: Model + 'static,
{
    fn meta(&self) -> &RelationshipMeta {
        &self.meta
    }

    fn parent(&self) -> &Parent {
        &self.parent
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    fn query(&self) -> ModelResult<QueryBuilder<Related>> {
        let query = QueryBuilder::new().from(&self.meta.related_table);
        let attributes = self.meta.foreign_key_attributes(&self.parent)?;
        Ok(attributes
            .into_iter()
            .fold(query, |query, (column, value)| query.where_eq(&column, value)))
    }

    async fn load(&mut self, executor: &mut dyn DatabaseExecutor) -> ModelResult<()> {
        self.related = self.query()?.get(executor).await?;
        self.loaded = true;
        Ok(())
    }
}

// Iterator implementations for convenience
impl<Parent, Related> IntoIterator for HasMany<Parent, Related>
where
    Parent: Model,
    Related: Model,
{
    type Item = Related;
    type IntoIter = std::vec::IntoIter<Related>;

    fn into_iter(self) -> Self::IntoIter {
        self.related.into_iter()
    }
}

impl<'a, Parent, Related> IntoIterator for &'a HasMany<Parent, Related>
where
    Parent: Model,
    Related: Model,
{
    type Item = &'a Related;
    type IntoIter = std::slice::Iter<'a, Related>;

    fn into_iter(self) -> Self::IntoIter {
        self.related.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryDatabase;
    use crate::backends::ValueRow;
    use crate::testing::{Post, User};

    fn post_row(id: i64, title: &str) -> ValueRow {
        ValueRow::new().with("id", id).with("user_id", 3i64).with("title", title)
    }

    #[tokio::test]
    async fn test_load_collects_rows() {
        let db = MemoryDatabase::new();
        db.push_response(vec![post_row(1, "a"), post_row(2, "b")]);

        let mut relation = HasMany::<User, Post>::new(User::persisted(3, "ann"), "user_id");
        let mut conn = db.clone();
        relation.load(&mut conn).await.unwrap();

        assert_eq!(relation.len(), 2);
        let titles: Vec<&str> = relation.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
        assert_eq!(db.committed()[0].sql, "SELECT * FROM posts WHERE user_id = $1");
    }

    #[tokio::test]
    async fn test_save_appends_with_foreign_key() {
        let db = MemoryDatabase::new();
        db.push_response(vec![post_row(4, "new")]);

        let mut relation = HasMany::<User, Post>::new(User::persisted(3, "ann"), "user_id");
        let mut conn = db.clone();
        relation.save(Post::new("new"), &mut conn).await.unwrap();

        assert_eq!(relation.get()[0].user_id, Some(3));
        let params = &db.committed()[0].params;
        assert!(params.contains(&crate::backends::DatabaseValue::Int32(3)));
    }

    #[tokio::test]
    async fn test_paginate_related() {
        let db = MemoryDatabase::new();
        db.push_response(vec![ValueRow::new().with("total", 21i64)]);
        db.push_response(vec![post_row(21, "last")]);

        let relation = HasMany::<User, Post>::new(User::persisted(3, "ann"), "user_id");
        let mut conn = db.clone();
        let page = relation.paginate(&mut conn, 2, 20).await.unwrap();

        assert_eq!(page.last_page(), 2);
        assert!(!page.has_more_pages());
        assert_eq!(page.len(), 1);
        assert!(db.committed()[1].sql.ends_with("LIMIT 20 OFFSET 20"));
    }
}
