//! Relationship factory support for creating related models
//!
//! Adapters wrap a related-model factory, tie every produced record to a
//! parent through its foreign key and hand back the relation container with
//! the records set on it.

use std::collections::HashMap;
use std::marker::PhantomData;

use serde_json::Value;

use super::Factory;
use crate::backends::DatabaseExecutor;
use crate::error::OrmResult;
use crate::model::Model;
use crate::relationships::{HasMany, HasOne, Relationship};

/// Factory for creating has_one relationships
pub struct HasOneFactory<Related, F> {
    factory: F,
    foreign_key: String,
    local_key: Option<String>,
    attributes: HashMap<String, Value>,
    _phantom: PhantomData<Related>,
}

impl<Related, F> HasOneFactory<Related, F>
where
    Related: Model + 'static,
    F: Factory<Related>,
{
    pub fn new(factory: F, foreign_key: &str) -> Self {
        Self {
            factory,
            foreign_key: foreign_key.to_string(),
            local_key: None,
            attributes: HashMap::new(),
            _phantom: PhantomData,
        }
    }

    pub fn with_local_key(mut self, local_key: &str) -> Self {
        self.local_key = Some(local_key.to_string());
        self
    }

    /// Extra attributes applied to the related record
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    fn relation<Parent: Model + 'static>(&self, parent: Parent) -> OrmResult<(HasOne<Parent, Related>, HashMap<String, Value>)> {
        let mut relation = HasOne::new(parent, &self.foreign_key);
        if let Some(local_key) = &self.local_key {
            relation = relation.with_local_key(local_key);
        }

        let mut attributes = self.attributes.clone();
        attributes.extend(relation.meta().foreign_key_attributes(relation.parent())?);
        Ok((relation, attributes))
    }

    /// Build the related record for `parent` without saving it
    pub async fn make_for<Parent: Model + 'static>(&self, parent: Parent) -> OrmResult<HasOne<Parent, Related>> {
        let (mut relation, attributes) = self.relation(parent)?;
        let related = self.factory.make_with(attributes).await?;
        relation.set(Some(related));
        Ok(relation)
    }

    /// Build and save the related record for `parent`
    pub async fn create_for<Parent: Model + 'static>(
        &self,
        parent: Parent,
        executor: &mut dyn DatabaseExecutor,
    ) -> OrmResult<HasOne<Parent, Related>> {
        let (mut relation, attributes) = self.relation(parent)?;
        let related = self.factory.create_with(attributes, executor).await?;
        relation.set(Some(related));
        Ok(relation)
    }
}

/// Factory for creating has_many relationships
pub struct HasManyFactory<Related, F> {
    factory: F,
    foreign_key: String,
    local_key: Option<String>,
    count: usize,
    attributes: HashMap<String, Value>,
    _phantom: PhantomData<Related>,
}

impl<Related, F> HasManyFactory<Related, F>
where
    Related: Model + 'static,
    F: Factory<Related>,
{
    pub fn new(factory: F, foreign_key: &str, count: usize) -> Self {
        Self {
            factory,
            foreign_key: foreign_key.to_string(),
            local_key: None,
            count,
            attributes: HashMap::new(),
            _phantom: PhantomData,
        }
    }

    pub fn with_local_key(mut self, local_key: &str) -> Self {
        self.local_key = Some(local_key.to_string());
        self
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    fn relation<Parent: Model + 'static>(&self, parent: Parent) -> OrmResult<(HasMany<Parent, Related>, HashMap<String, Value>)> {
        let mut relation = HasMany::new(parent, &self.foreign_key);
        if let Some(local_key) = &self.local_key {
            relation = relation.with_local_key(local_key);
        }

        let mut attributes = self.attributes.clone();
        attributes.extend(relation.meta().foreign_key_attributes(relation.parent())?);
        Ok((relation, attributes))
    }

    /// Build `count` related records for `parent` without saving them
    pub async fn make_for<Parent: Model + 'static>(&self, parent: Parent) -> OrmResult<HasMany<Parent, Related>> {
        let (mut relation, attributes) = self.relation(parent)?;
        let mut related = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            related.push(self.factory.make_with(attributes.clone()).await?);
        }
        relation.set(related);
        Ok(relation)
    }

    /// Build and save `count` related records for `parent`, one after another
    pub async fn create_for<Parent: Model + 'static>(
        &self,
        parent: Parent,
        executor: &mut dyn DatabaseExecutor,
    ) -> OrmResult<HasMany<Parent, Related>> {
        let (mut relation, attributes) = self.relation(parent)?;
        let mut related = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            related.push(self.factory.create_with(attributes.clone(), executor).await?);
        }
        relation.set(related);
        Ok(relation)
    }
}
