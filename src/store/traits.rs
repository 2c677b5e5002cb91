use crate::error::StoreError;
use crate::model::{Catalog, Entity, Id, Project, Value};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_project(&self, id: &Id) -> StoreResult<Option<Project>>;
    async fn get_catalog(&self, id: &Id) -> StoreResult<Option<Catalog>>;
}

#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_entity(&self, id: &Id) -> StoreResult<Option<Entity>>;
    /// First entity of the catalog's declared order, used for the initial
    /// wizard state.
    async fn first_entity(&self, catalog: &Id) -> StoreResult<Option<Entity>>;
}

#[async_trait::async_trait]
pub trait ValueStore: Send + Sync {
    /// All stored values for one attribute at a snapshot.
    async fn list_values(&self, snapshot: &Id, attribute: &Id) -> StoreResult<Vec<Value>>;
    /// All stored values whose attribute belongs to a parent collection.
    async fn list_collection_values(
        &self,
        snapshot: &Id,
        collection: &Id,
    ) -> StoreResult<Vec<Value>>;
    /// Create a value; the returned representation carries the assigned id
    /// and canonicalized fields.
    async fn create_value(&self, value: &Value) -> StoreResult<Value>;
    async fn update_value(&self, id: &Id, value: &Value) -> StoreResult<Value>;
    async fn delete_value(&self, id: &Id) -> StoreResult<()>;
}

pub trait Store: ProjectStore + EntityStore + ValueStore + Send + Sync + 'static {}
