use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::{EngineError, EngineResult, StoreError, ValidationErrors};
use crate::logic::loader::{Admission, EntityLoader, EntityTarget};
use crate::logic::value_sets::PageValues;
use crate::logic::values::{init_widget, ValueLoader};
use crate::model::{
    Catalog, Entity, EntityHead, Id, Project, Section, Subsection, Value, ValueDisposition,
};
use crate::signal::RenderSignal;
use crate::store::{ProjectStore as _, Store, ValueStore as _};

/// Traversal direction used while following a chain of skipped entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Where a navigation step ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// A page is bound and ready to render.
    Page,
    /// The traversal direction ran out of admitting entities; there is no
    /// further page to show in that direction.
    Exhausted,
    /// Control leaves the wizard for the exit destination.
    Exit,
}

/// The page currently bound to the engine: the entity definition plus the
/// working copy of its values.
#[derive(Debug, Clone)]
pub struct Page {
    pub entity: Entity,
    pub values: PageValues,
}

/// Input to the value-set title form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetForm {
    pub create: bool,
    pub title: String,
}

struct ValueLoc {
    set: Option<usize>,
    attribute: Id,
    index: usize,
}

/// Drives the wizard: fetches entities, follows skip chains, binds value
/// buckets, persists edits and decides where control goes next. All
/// operations take `&mut self`, so navigation transitions are serialized by
/// construction; an overlapping transition on the same engine cannot start
/// while one is awaiting.
pub struct Navigator<S> {
    store: Arc<S>,
    project: Project,
    catalog: Catalog,
    loader: EntityLoader<S>,
    value_loader: ValueLoader<S>,
    exit_url: String,
    direction: Direction,
    current: Option<Page>,
    signals: Vec<RenderSignal>,
}

impl<S: Store> Navigator<S> {
    /// Entry point: load the project and its catalog, then navigate to the
    /// first admitting entity. The returned engine may already be in the
    /// exhausted state when nothing admits.
    pub async fn start(
        store: Arc<S>,
        project_id: &Id,
        exit_url: impl Into<String>,
    ) -> EngineResult<Self> {
        let project = store
            .get_project(project_id)
            .await
            .map_err(EngineError::Fetch)?
            .ok_or_else(|| EngineError::Missing(format!("project {}", project_id)))?;
        let catalog = store
            .get_catalog(&project.catalog)
            .await
            .map_err(EngineError::Fetch)?
            .ok_or_else(|| EngineError::Missing(format!("catalog {}", project.catalog)))?;

        log::info!(
            "starting questionnaire for project {} (snapshot {})",
            project.id,
            project.current_snapshot
        );

        let loader = EntityLoader::new(
            Arc::clone(&store),
            project.catalog.clone(),
            project.current_snapshot.clone(),
        );
        let value_loader = ValueLoader::new(Arc::clone(&store), project.current_snapshot.clone());

        let mut navigator = Self {
            store,
            project,
            catalog,
            loader,
            value_loader,
            exit_url: exit_url.into(),
            direction: Direction::Forward,
            current: None,
            signals: Vec::new(),
        };
        navigator.goto(EntityTarget::First).await?;
        Ok(navigator)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current(&self) -> Option<&Page> {
        self.current.as_ref()
    }

    /// Mutable access to the bucket user edits land in.
    pub fn active_values_mut(
        &mut self,
    ) -> Option<&mut std::collections::HashMap<Id, Vec<Value>>> {
        self.current
            .as_mut()
            .and_then(|page| page.values.active_values_mut())
    }

    /// Drain the render signals accumulated since the last call.
    pub fn take_signals(&mut self) -> Vec<RenderSignal> {
        std::mem::take(&mut self.signals)
    }

    /// Navigate to a target, transparently following the chain of
    /// non-admitting entities in the current direction. The loop terminates
    /// at the first admitting entity or at a declared-order boundary.
    pub async fn goto(&mut self, target: EntityTarget) -> EngineResult<NavOutcome> {
        let mut target = target;
        loop {
            let entity = self.loader.fetch(&target).await?;
            match self.loader.admits(&entity).await? {
                Admission::Admitted => {
                    let mut values = self.value_loader.fetch(&entity).await?;
                    let widget_signals = self.value_loader.normalize(&entity, &mut values);
                    self.signals.extend(widget_signals);
                    Self::focus_first(&entity, &values, &mut self.signals);
                    self.signals.push(RenderSignal::ScrollToTop);
                    log::info!("entered entity {}", entity.id);
                    self.current = Some(Page { entity, values });
                    self.direction = Direction::Forward;
                    return Ok(NavOutcome::Page);
                }
                Admission::Skipped => {
                    let neighbor = match self.direction {
                        Direction::Forward => entity.next.clone(),
                        Direction::Backward => entity.prev.clone(),
                    };
                    match neighbor {
                        Some(id) => target = EntityTarget::Entity(id),
                        None => {
                            log::info!(
                                "no admitting entity beyond {} going {:?}",
                                entity.id,
                                self.direction
                            );
                            self.direction = Direction::Forward;
                            return Ok(NavOutcome::Exhausted);
                        }
                    }
                }
            }
        }
    }

    /// Step to the declared previous entity; no-op at the boundary.
    pub async fn prev(&mut self) -> EngineResult<NavOutcome> {
        let Some(prev) = self.current.as_ref().and_then(|page| page.entity.prev.clone()) else {
            return Ok(NavOutcome::Page);
        };
        self.direction = Direction::Backward;
        self.goto(EntityTarget::Entity(prev)).await
    }

    /// Step to the declared next entity; at the boundary control leaves the
    /// wizard without any fetch.
    pub async fn next(&mut self) -> EngineResult<NavOutcome> {
        match self.current.as_ref().and_then(|page| page.entity.next.clone()) {
            Some(next) => {
                self.direction = Direction::Forward;
                self.goto(EntityTarget::Entity(next)).await
            }
            None => Ok(self.exit()),
        }
    }

    /// Navigate to the most specific explicit target: an entity, the first
    /// entity of a subsection, or the first entity of a section's first
    /// subsection. A target without entities is a no-op.
    pub async fn jump(
        &mut self,
        section: &Section,
        subsection: Option<&Subsection>,
        entity: Option<&EntityHead>,
    ) -> EngineResult<NavOutcome> {
        let target = if let Some(entity) = entity {
            Some(entity.id.clone())
        } else if let Some(subsection) = subsection {
            subsection.entities.first().map(|head| head.id.clone())
        } else {
            section
                .subsections
                .first()
                .and_then(|subsection| subsection.entities.first())
                .map(|head| head.id.clone())
        };

        match target {
            Some(id) => {
                self.direction = Direction::Forward;
                self.goto(EntityTarget::Entity(id)).await
            }
            None => Ok(NavOutcome::Page),
        }
    }

    /// Append a factory value to the active bucket of a repeatable question
    /// and move focus to it.
    pub fn add_value(&mut self, attribute: &Id) {
        let Some(page) = self.current.as_mut() else {
            return;
        };
        let Some(question) = page
            .entity
            .questions
            .iter()
            .find(|question| &question.attribute.id == attribute)
            .cloned()
        else {
            return;
        };
        let snapshot = self.project.current_snapshot.clone();
        let Some(values) = page.values.active_values_mut() else {
            return;
        };

        let bucket = values.entry(attribute.clone()).or_default();
        let mut value = Value::blank(attribute, &snapshot);
        init_widget(&question, &mut value);
        bucket.push(value);
        self.signals.push(RenderSignal::FocusField {
            attribute: attribute.clone(),
            index: Some(bucket.len() - 1),
        });
    }

    /// Soft-delete one value of the active bucket.
    pub fn remove_value(&mut self, attribute: &Id, index: usize) {
        if let Some(values) = self.active_values_mut() {
            if let Some(value) = values.get_mut(attribute).and_then(|bucket| bucket.get_mut(index))
            {
                value.mark_removed();
            }
        }
    }

    /// Append a blank value set and make it the active one.
    pub fn add_value_set(&mut self) {
        let Some(page) = self.current.as_mut() else {
            return;
        };
        let PageValues::Sets(sets) = &mut page.values else {
            return;
        };
        sets.add_blank(&page.entity, &self.project.current_snapshot);
    }

    /// Soft-delete the active value set and select the nearest survivor.
    pub fn remove_value_set(&mut self) {
        if let Some(page) = self.current.as_mut() {
            if let PageValues::Sets(sets) = &mut page.values {
                sets.remove_active();
            }
        }
    }

    /// Open the value-set title form. When the page's collection declares no
    /// title attribute there is nothing to ask the user; the submission runs
    /// immediately and `None` is returned.
    pub fn open_set_form(&mut self, create: bool) -> EngineResult<Option<SetForm>> {
        let Some(page) = self.current.as_ref() else {
            return Ok(None);
        };
        let id_attribute = page
            .entity
            .collection
            .as_ref()
            .and_then(|collection| collection.id_attribute.clone());

        let Some(id_attribute) = id_attribute else {
            let form = SetForm {
                create,
                title: String::new(),
            };
            self.submit_set_form(&form)?;
            return Ok(None);
        };

        let title = if create {
            String::new()
        } else {
            page.values
                .active_values()
                .and_then(|values| values.get(&id_attribute))
                .and_then(|bucket| bucket.first())
                .map(|value| value.text.clone())
                .unwrap_or_default()
        };

        self.signals.push(RenderSignal::ShowSetForm);
        Ok(Some(SetForm { create, title }))
    }

    /// Validate and apply the value-set title form: optionally create the
    /// new set, then write the title into the collection's title attribute.
    /// Validation runs before anything is touched and never hits the store.
    pub fn submit_set_form(&mut self, form: &SetForm) -> EngineResult<()> {
        let Some(page) = self.current.as_ref() else {
            return Ok(());
        };
        let id_attribute = page
            .entity
            .collection
            .as_ref()
            .and_then(|collection| collection.id_attribute.clone());

        if id_attribute.is_some() && form.title.trim().is_empty() {
            let mut errors = ValidationErrors::default();
            errors.add("text", "this field is required");
            return Err(EngineError::Validation(errors));
        }

        if form.create {
            self.add_value_set();
        }

        if let Some(id_attribute) = id_attribute {
            let snapshot = self.project.current_snapshot.clone();
            if let Some(values) = self.active_values_mut() {
                let bucket = values.entry(id_attribute.clone()).or_default();
                if bucket.is_empty() {
                    bucket.push(Value::blank(&id_attribute, &snapshot));
                }
                bucket[0].text = form.title.clone();
            }
        }
        Ok(())
    }

    /// Persist every value of the bound page, then optionally advance: a
    /// collection set page steps through its remaining rows first; any other
    /// page behaves like `next()`. Persistence failure keeps the engine on
    /// the current page.
    pub async fn save(&mut self, advance: bool) -> EngineResult<NavOutcome> {
        self.store_values().await?;
        if !advance {
            return Ok(NavOutcome::Page);
        }

        let Some(page) = self.current.as_mut() else {
            return Ok(NavOutcome::Page);
        };

        if page.entity.is_collection_set() {
            if let PageValues::Sets(sets) = &mut page.values {
                let next_set = sets
                    .active_index()
                    .and_then(|index| sets.next_active(index));
                if let Some(index) = next_set {
                    sets.activate(index);
                    self.signals.push(RenderSignal::ScrollToTop);
                    return Ok(NavOutcome::Page);
                }
            }
        }
        self.next().await
    }

    /// Persist the whole page: one concurrent store operation per value,
    /// every operation awaited before the outcome is decided. Indices are
    /// assigned on the way out — `set_index` advances only past surviving
    /// sets, `collection_index` is the bucket position.
    async fn store_values(&mut self) -> EngineResult<()> {
        let Some(page) = self.current.as_mut() else {
            return Ok(());
        };

        let mut jobs: Vec<(ValueLoc, Value, usize, usize)> = Vec::new();
        match &page.values {
            PageValues::Single(values) => {
                for attribute in &page.entity.attributes {
                    let Some(bucket) = values.get(attribute) else {
                        continue;
                    };
                    for (index, value) in bucket.iter().enumerate() {
                        let loc = ValueLoc {
                            set: None,
                            attribute: attribute.clone(),
                            index,
                        };
                        jobs.push((loc, value.clone(), index, 0));
                    }
                }
            }
            PageValues::Sets(sets) => {
                let mut set_index = 0;
                for (set_position, set) in sets.sets().iter().enumerate() {
                    for attribute in &page.entity.attributes {
                        let Some(bucket) = set.values.get(attribute) else {
                            continue;
                        };
                        for (index, value) in bucket.iter().enumerate() {
                            let loc = ValueLoc {
                                set: Some(set_position),
                                attribute: attribute.clone(),
                                index,
                            };
                            jobs.push((loc, value.clone(), index, set_index));
                        }
                    }
                    if !set.removed {
                        set_index += 1;
                    }
                }
            }
        }

        let total = jobs.len();
        let mut writes: JoinSet<(ValueLoc, Result<Value, StoreError>)> = JoinSet::new();
        for (loc, mut value, collection_index, set_index) in jobs {
            let store = Arc::clone(&self.store);
            writes.spawn(async move {
                let result = store_value(&*store, &mut value, collection_index, set_index).await;
                (loc, result.map(|_| value))
            });
        }

        let mut errors = Vec::new();
        let mut written = Vec::new();
        while let Some(joined) = writes.join_next().await {
            let (loc, result) = joined.expect("value store task panicked");
            match result {
                Ok(value) => written.push((loc, value)),
                Err(error) => errors.push(error),
            }
        }

        // Writes that settled successfully are merged back even when a
        // sibling failed, so a retry only repeats the failed operations.
        for (loc, value) in written {
            let bucket = match (&mut page.values, loc.set) {
                (PageValues::Single(values), None) => values.get_mut(&loc.attribute),
                (PageValues::Sets(sets), Some(set)) => sets
                    .sets_mut()
                    .get_mut(set)
                    .and_then(|set| set.values.get_mut(&loc.attribute)),
                _ => None,
            };
            if let Some(slot) = bucket.and_then(|bucket| bucket.get_mut(loc.index)) {
                *slot = value;
            }
        }

        if errors.is_empty() {
            log::debug!("persisted {} values for entity {}", total, page.entity.id);
            Ok(())
        } else {
            log::warn!(
                "{} of {} value writes failed for entity {}",
                errors.len(),
                total,
                page.entity.id
            );
            Err(EngineError::Persist {
                failed: errors.len(),
                total,
                errors,
            })
        }
    }

    fn exit(&mut self) -> NavOutcome {
        log::info!("questionnaire finished, redirecting to {}", self.exit_url);
        self.signals.push(RenderSignal::NavigateTo {
            url: self.exit_url.clone(),
        });
        NavOutcome::Exit
    }

    fn focus_first(entity: &Entity, values: &PageValues, signals: &mut Vec<RenderSignal>) {
        if values.active_values().is_none() {
            return;
        }
        if let Some(question) = entity.questions.first() {
            let index = if question.attribute.is_collection {
                Some(0)
            } else {
                None
            };
            signals.push(RenderSignal::FocusField {
                attribute: question.attribute.id.clone(),
                index,
            });
        }
    }
}

/// Execute the store operation a single value's disposition calls for. The
/// backend's canonical representation is merged back on create and update; a
/// successful delete clears the id so a repeated save has nothing left to do.
async fn store_value<S: Store + ?Sized>(
    store: &S,
    value: &mut Value,
    collection_index: usize,
    set_index: usize,
) -> Result<(), StoreError> {
    match value.disposition() {
        ValueDisposition::Discard => Ok(()),
        ValueDisposition::Delete(id) => {
            store.delete_value(&id).await?;
            value.id = None;
            Ok(())
        }
        ValueDisposition::Update(id) => {
            value.set_index = set_index;
            value.collection_index = collection_index;
            let stored = store.update_value(&id, value).await?;
            value.absorb(stored);
            Ok(())
        }
        ValueDisposition::Create => {
            value.set_index = set_index;
            value.collection_index = collection_index;
            let stored = store.create_value(value).await?;
            value.absorb(stored);
            Ok(())
        }
    }
}
