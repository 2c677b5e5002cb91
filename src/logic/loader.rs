use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::{EngineError, EngineResult};
use crate::logic::conditions::satisfied;
use crate::model::{Entity, Id, Value};
use crate::store::{EntityStore as _, Store, ValueStore as _};

/// Which entity a navigation step asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityTarget {
    /// The catalog's first entity; used for the initial, empty wizard state.
    First,
    Entity(Id),
}

/// Outcome of the admission check for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// The caller moves on to an adjacent entity; not an error.
    Skipped,
}

/// Fetches entity definitions and decides whether they are shown, based on
/// the stored values of their condition source attributes.
pub struct EntityLoader<S> {
    store: Arc<S>,
    catalog: Id,
    snapshot: Id,
}

impl<S: Store> EntityLoader<S> {
    pub fn new(store: Arc<S>, catalog: Id, snapshot: Id) -> Self {
        Self {
            store,
            catalog,
            snapshot,
        }
    }

    pub async fn fetch(&self, target: &EntityTarget) -> EngineResult<Entity> {
        let entity = match target {
            EntityTarget::Entity(id) => {
                self.store.get_entity(id).await.map_err(EngineError::Fetch)?
            }
            EntityTarget::First => self
                .store
                .first_entity(&self.catalog)
                .await
                .map_err(EngineError::Fetch)?,
        };

        entity.ok_or_else(|| match target {
            EntityTarget::Entity(id) => EngineError::Missing(format!("entity {}", id)),
            EntityTarget::First => {
                EngineError::Missing(format!("first entity of catalog {}", self.catalog))
            }
        })
    }

    /// Evaluate the entity's branching conditions against the stored values
    /// of their source attributes.
    ///
    /// All condition×value pairs are ORed: one passing pair admits the
    /// entity. An entity with conditions but no stored source values at all
    /// is skipped, not passed vacuously — a source attribute that was never
    /// answered counts as condition failure.
    pub async fn admits(&self, entity: &Entity) -> EngineResult<Admission> {
        let conditions = &entity.attribute_entity.conditions;
        if conditions.is_empty() {
            return Ok(Admission::Admitted);
        }

        // One fetch per condition, all in flight at once.
        let mut fetches: JoinSet<(usize, Result<Vec<Value>, crate::error::StoreError>)> =
            JoinSet::new();
        for (index, condition) in conditions.iter().enumerate() {
            let store = Arc::clone(&self.store);
            let snapshot = self.snapshot.clone();
            let attribute = condition.source_attribute.clone();
            fetches.spawn(async move {
                let result = store.list_values(&snapshot, &attribute).await;
                (index, result)
            });
        }

        let mut source_values: Vec<Vec<Value>> = vec![Vec::new(); conditions.len()];
        while let Some(joined) = fetches.join_next().await {
            let (index, result) = joined.expect("condition fetch task panicked");
            source_values[index] = result.map_err(EngineError::Fetch)?;
        }

        let admitted = conditions
            .iter()
            .zip(&source_values)
            .flat_map(|(condition, values)| values.iter().map(|value| satisfied(condition, value)))
            .any(|check| check);

        if admitted {
            Ok(Admission::Admitted)
        } else {
            log::debug!("entity {} not admitted, skipping", entity.id);
            Ok(Admission::Skipped)
        }
    }
}
