//! Database Factory System
//!
//! Factories produce model instances from a default attribute set, with
//! per-call overrides, either in memory (`make`) or persisted through an
//! executor (`create`). Relation adapters in [`relationships`] build related
//! records tied to a parent.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::backends::DatabaseExecutor;
use crate::error::OrmResult;
use crate::model::persistence::save;
use crate::model::Model;

pub mod relationships;

pub use relationships::{HasManyFactory, HasOneFactory};

/// Turn an attribute map into a model through its serde representation
pub fn hydrate<T: Model>(attributes: HashMap<String, Value>) -> OrmResult<T> {
    let object: Map<String, Value> = attributes.into_iter().collect();
    Ok(serde_json::from_value(Value::Object(object))?)
}

/// Core factory trait that all model factories must implement
#[async_trait::async_trait]
pub trait Factory<T: Model + 'static>: Send + Sync {
    /// Define the default attributes for the model
    async fn definition(&self) -> OrmResult<HashMap<String, Value>>;

    /// Build a model from the definition with `overrides` applied on top
    async fn make_with(&self, overrides: HashMap<String, Value>) -> OrmResult<T> {
        let mut attributes = self.definition().await?;
        attributes.extend(overrides);
        hydrate(attributes)
    }

    /// Create a single model instance without saving to database
    async fn make(&self) -> OrmResult<T> {
        self.make_with(HashMap::new()).await
    }

    /// Create multiple model instances without saving
    async fn make_many(&self, count: usize) -> OrmResult<Vec<T>> {
        let mut models = Vec::with_capacity(count);
        for _ in 0..count {
            models.push(self.make().await?);
        }
        Ok(models)
    }

    /// Build with `overrides` and save
    async fn create_with(
        &self,
        overrides: HashMap<String, Value>,
        executor: &mut dyn DatabaseExecutor,
    ) -> OrmResult<T> {
        let mut model = self.make_with(overrides).await?;
        save(&mut model, executor).await?;
        Ok(model)
    }

    /// Create and save a single model instance to database
    async fn create(&self, executor: &mut dyn DatabaseExecutor) -> OrmResult<T> {
        self.create_with(HashMap::new(), executor).await
    }

    /// Create and save multiple model instances
    async fn create_many(&self, executor: &mut dyn DatabaseExecutor, count: usize) -> OrmResult<Vec<T>> {
        let mut models = Vec::with_capacity(count);
        for _ in 0..count {
            models.push(self.create(executor).await?);
        }
        Ok(models)
    }

    /// Override specific attributes for this instance
    fn with_attributes(self, attributes: HashMap<String, Value>) -> FactoryBuilder<T, Self>
    where
        Self: Sized,
    {
        FactoryBuilder::new(self, attributes)
    }
}

/// Builder for factory instances with custom attributes
pub struct FactoryBuilder<T: Model + 'static, F: Factory<T>> {
    factory: F,
    attributes: HashMap<String, Value>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Model + 'static, F: Factory<T>> FactoryBuilder<T, F> {
    pub fn new(factory: F, attributes: HashMap<String, Value>) -> Self {
        Self {
            factory,
            attributes,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Add or override an attribute
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Create model without saving
    pub async fn make(&self) -> OrmResult<T> {
        self.factory.make_with(self.attributes.clone()).await
    }

    /// Create and save model
    pub async fn create(&self, executor: &mut dyn DatabaseExecutor) -> OrmResult<T> {
        self.factory.create_with(self.attributes.clone(), executor).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backends::memory::MemoryDatabase;
    use crate::backends::ValueRow;
    use crate::testing::{Post, User};
    use serde_json::json;

    pub(crate) struct UserFactory;

    #[async_trait::async_trait]
    impl Factory<User> for UserFactory {
        async fn definition(&self) -> OrmResult<HashMap<String, Value>> {
            Ok(HashMap::from([("name".to_string(), json!("factory user"))]))
        }
    }

    pub(crate) struct PostFactory;

    #[async_trait::async_trait]
    impl Factory<Post> for PostFactory {
        async fn definition(&self) -> OrmResult<HashMap<String, Value>> {
            Ok(HashMap::from([("title".to_string(), json!("Generated post"))]))
        }
    }

    #[tokio::test]
    async fn test_make_applies_overrides() {
        let user = UserFactory.make().await.unwrap();
        assert_eq!(user, User::new("factory user"));

        let user = UserFactory
            .make_with(HashMap::from([("team_id".to_string(), json!(4))]))
            .await
            .unwrap();
        assert_eq!(user.team_id, Some(4));
        assert_eq!(user.id, None);
    }

    #[tokio::test]
    async fn test_make_rejects_invalid_attributes() {
        let result = UserFactory
            .make_with(HashMap::from([("name".to_string(), json!(12))]))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_builder_creates_through_executor() {
        let db = MemoryDatabase::new();
        db.push_response(vec![ValueRow::new().with("id", 1i64).with("name", "zoe").with("team_id", 2i64)]);

        let mut conn = db.clone();
        let user = UserFactory
            .with_attributes(HashMap::new())
            .with("name", "zoe")
            .with("team_id", 2)
            .create(&mut conn)
            .await
            .unwrap();

        assert_eq!(user.id, Some(1));
        assert_eq!(db.committed()[0].sql, "INSERT INTO users (name, team_id) VALUES ($1, $2) RETURNING *");
    }

    #[tokio::test]
    async fn test_make_many() {
        let posts = PostFactory.make_many(3).await.unwrap();
        assert_eq!(posts.len(), 3);
        assert!(posts.iter().all(|post| post.title == "Generated post"));
    }
}
