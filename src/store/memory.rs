use chrono::Utc;
use itertools::Itertools;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Catalog, Entity, Id, Project, Value};
use crate::store::traits::{EntityStore, ProjectStore, Store, StoreResult, ValueStore};

#[derive(Default)]
struct Tables {
    projects: HashMap<Id, Project>,
    catalogs: HashMap<Id, Catalog>,
    entities: HashMap<Id, Entity>,
    /// Declared entity order per catalog; the first id answers `first_entity`.
    entity_order: HashMap<Id, Vec<Id>>,
    /// Attribute id -> owning parent collection id.
    attribute_collections: HashMap<Id, Id>,
    values: HashMap<Id, Value>,
}

/// In-process store backend. Serves the demo binary and the test suite with
/// the same contract the HTTP backend provides.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_project(&self, project: Project) {
        self.tables.write().projects.insert(project.id.clone(), project);
    }

    pub fn put_catalog(&self, catalog: Catalog) {
        self.tables.write().catalogs.insert(catalog.id.clone(), catalog);
    }

    /// Register an entity under its catalog; insertion order is the declared
    /// linear order.
    pub fn put_entity(&self, catalog: &Id, entity: Entity) {
        let mut tables = self.tables.write();
        tables
            .entity_order
            .entry(catalog.clone())
            .or_default()
            .push(entity.id.clone());
        tables.entities.insert(entity.id.clone(), entity);
    }

    /// Declare which attributes belong to a parent collection, so row-scoped
    /// value queries can resolve them.
    pub fn register_collection(&self, collection: &Id, attributes: &[Id]) {
        let mut tables = self.tables.write();
        for attribute in attributes {
            tables
                .attribute_collections
                .insert(attribute.clone(), collection.clone());
        }
    }

    /// Make every write fail with a transport-style error; used to exercise
    /// persistence failure handling.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn value_count(&self) -> usize {
        self.tables.read().values.len()
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                code: 503,
                url: "memory://values/".to_string(),
            });
        }
        Ok(())
    }

    fn sorted(values: Vec<Value>) -> Vec<Value> {
        values
            .into_iter()
            .sorted_by_key(|v| (v.set_index, v.collection_index))
            .collect()
    }
}

#[async_trait::async_trait]
impl ProjectStore for MemoryStore {
    async fn get_project(&self, id: &Id) -> StoreResult<Option<Project>> {
        Ok(self.tables.read().projects.get(id).cloned())
    }

    async fn get_catalog(&self, id: &Id) -> StoreResult<Option<Catalog>> {
        Ok(self.tables.read().catalogs.get(id).cloned())
    }
}

#[async_trait::async_trait]
impl EntityStore for MemoryStore {
    async fn get_entity(&self, id: &Id) -> StoreResult<Option<Entity>> {
        Ok(self.tables.read().entities.get(id).cloned())
    }

    async fn first_entity(&self, catalog: &Id) -> StoreResult<Option<Entity>> {
        let tables = self.tables.read();
        let first = tables
            .entity_order
            .get(catalog)
            .and_then(|order| order.first());
        Ok(first.and_then(|id| tables.entities.get(id)).cloned())
    }
}

#[async_trait::async_trait]
impl ValueStore for MemoryStore {
    async fn list_values(&self, snapshot: &Id, attribute: &Id) -> StoreResult<Vec<Value>> {
        let tables = self.tables.read();
        let values = tables
            .values
            .values()
            .filter(|v| &v.snapshot == snapshot && &v.attribute == attribute)
            .cloned()
            .collect();
        Ok(Self::sorted(values))
    }

    async fn list_collection_values(
        &self,
        snapshot: &Id,
        collection: &Id,
    ) -> StoreResult<Vec<Value>> {
        let tables = self.tables.read();
        let values = tables
            .values
            .values()
            .filter(|v| {
                &v.snapshot == snapshot
                    && tables.attribute_collections.get(&v.attribute) == Some(collection)
            })
            .cloned()
            .collect();
        Ok(Self::sorted(values))
    }

    async fn create_value(&self, value: &Value) -> StoreResult<Value> {
        self.check_writable()?;
        let mut stored = value.clone();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        stored.id = Some(id.clone());
        stored.created = Some(now);
        stored.updated = Some(now);
        self.tables.write().values.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_value(&self, id: &Id, value: &Value) -> StoreResult<Value> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let existing = tables
            .values
            .get(id)
            .ok_or_else(|| StoreError::not_found("value", id.clone()))?;
        let mut stored = value.clone();
        stored.id = Some(id.clone());
        stored.created = existing.created;
        stored.updated = Some(Utc::now());
        tables.values.insert(id.clone(), stored.clone());
        Ok(stored)
    }

    async fn delete_value(&self, id: &Id) -> StoreResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        tables
            .values
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("value", id.clone()))
    }
}

impl Store for MemoryStore {}
