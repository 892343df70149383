//! HasOne Relationship - parent record owning at most one related record

use async_trait::async_trait;

use super::metadata::RelationshipType;
use super::traits::{Relationship, RelationshipMeta};
use crate::backends::DatabaseExecutor;
use crate::error::ModelResult;
use crate::model::persistence::save;
use crate::model::Model;
use crate::query::QueryBuilder;

/// HasOne relationship - parent model has one related model
#[derive(Debug)]
pub struct HasOne<Parent, Related>
where
    Parent: Model,
    Related: Model,
{
    parent: Parent,
    related: Option<Related>,
    meta: RelationshipMeta,
    loaded: bool,
}

impl<Parent, Related> HasOne<Parent, Related>
where
    Parent: Model,
    Related: Model,
{
    /// Create a new HasOne relationship
    pub fn new(parent: Parent, foreign_key: &str) -> Self {
        Self {
            parent,
            related: None,
            meta: RelationshipMeta {
                relationship_type: RelationshipType::HasOne,
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

    /// Get the related model if loaded
    pub fn get(&self) -> Option<&Related> {
        self.related.as_ref()
    }

    /// Get the related model as mutable if loaded
    pub fn get_mut(&mut self) -> Option<&mut Related> {
        self.related.as_mut()
    }

    /// Take ownership of the related model
    pub fn take(&mut self) -> Option<Related> {
        self.related.take()
    }

    /// Set the related model
    pub fn set(&mut self, related: Option<Related>) {
        self.related = related;
        self.loaded = true;
    }

    /// Point `related` at the parent, save it and keep it as the loaded value
    pub async fn save(&mut self, mut related: Related, executor: &mut dyn DatabaseExecutor) -> ModelResult<()> {
        related.merge(self.meta.foreign_key_attributes(&self.parent)?)?;
        save(&mut related, executor).await?;
        self.set(Some(related));
        Ok(())
    }
}

#[async_trait]
impl<Parent, Related> Relationship<Parent, Related> for HasOne<Parent, Related>
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
        self.related = self.query()?.first(executor).await?;
        self.loaded = true;
        Ok(())
    }
}
