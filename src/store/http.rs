use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::StoreError;
use crate::model::{Catalog, Entity, Id, Project, Value};
use crate::store::traits::{EntityStore, ProjectStore, Store, StoreResult, ValueStore};

/// Store backend talking to the questionnaire REST API.
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Decode a 2xx response, map 404 to `None` and anything else to a
    /// status error.
    async fn read_optional<T: DeserializeOwned>(
        response: Response,
    ) -> StoreResult<Option<T>> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(Self::read(response).await?))
    }

    async fn read<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response.json().await?)
    }

    async fn expect_success(response: Response) -> StoreResult<()> {
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                code: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProjectStore for HttpStore {
    async fn get_project(&self, id: &Id) -> StoreResult<Option<Project>> {
        let response = self
            .client
            .get(self.url(&format!("projects/{}/", id)))
            .send()
            .await?;
        Self::read_optional(response).await
    }

    async fn get_catalog(&self, id: &Id) -> StoreResult<Option<Catalog>> {
        let response = self
            .client
            .get(self.url(&format!("catalogs/{}/", id)))
            .send()
            .await?;
        Self::read_optional(response).await
    }
}

#[async_trait::async_trait]
impl EntityStore for HttpStore {
    async fn get_entity(&self, id: &Id) -> StoreResult<Option<Entity>> {
        let response = self
            .client
            .get(self.url(&format!("entities/{}/", id)))
            .send()
            .await?;
        Self::read_optional(response).await
    }

    async fn first_entity(&self, catalog: &Id) -> StoreResult<Option<Entity>> {
        let response = self
            .client
            .get(self.url("entities/first/"))
            .query(&[("catalog", catalog.as_str())])
            .send()
            .await?;
        Self::read_optional(response).await
    }
}

#[async_trait::async_trait]
impl ValueStore for HttpStore {
    async fn list_values(&self, snapshot: &Id, attribute: &Id) -> StoreResult<Vec<Value>> {
        let response = self
            .client
            .get(self.url("values/"))
            .query(&[("snapshot", snapshot.as_str()), ("attribute", attribute.as_str())])
            .send()
            .await?;
        Self::read(response).await
    }

    async fn list_collection_values(
        &self,
        snapshot: &Id,
        collection: &Id,
    ) -> StoreResult<Vec<Value>> {
        let response = self
            .client
            .get(self.url("values/"))
            .query(&[
                ("snapshot", snapshot.as_str()),
                ("attribute__parent_collection", collection.as_str()),
            ])
            .send()
            .await?;
        Self::read(response).await
    }

    async fn create_value(&self, value: &Value) -> StoreResult<Value> {
        let response = self
            .client
            .post(self.url("values/"))
            .json(value)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn update_value(&self, id: &Id, value: &Value) -> StoreResult<Value> {
        let response = self
            .client
            .put(self.url(&format!("values/{}/", id)))
            .json(value)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn delete_value(&self, id: &Id) -> StoreResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("values/{}/", id)))
            .send()
            .await?;
        Self::expect_success(response).await
    }
}

impl Store for HttpStore {}
