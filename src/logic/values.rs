use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::{EngineError, EngineResult};
use crate::logic::value_sets::{PageValues, ValueSets};
use crate::model::{Entity, Id, Question, Value, ValueSet, WidgetType};
use crate::signal::RenderSignal;
use crate::store::{Store, ValueStore as _};

/// Fetches the stored values for one page and shapes them into the buckets
/// the navigator binds: one flat per-attribute map for a plain entity, one
/// ordered row sequence for a set entity.
pub struct ValueLoader<S> {
    store: Arc<S>,
    snapshot: Id,
}

impl<S: Store> ValueLoader<S> {
    pub fn new(store: Arc<S>, snapshot: Id) -> Self {
        Self { store, snapshot }
    }

    pub async fn fetch(&self, entity: &Entity) -> EngineResult<PageValues> {
        if entity.is_set {
            if let Some(collection) = &entity.collection {
                self.fetch_collection_sets(&collection.id).await
            } else {
                self.fetch_single_set(entity).await
            }
        } else {
            self.fetch_flat(entity).await
        }
    }

    async fn fetch_flat(&self, entity: &Entity) -> EngineResult<PageValues> {
        let mut values = HashMap::new();
        if let Some(question) = entity.questions.first() {
            let fetched = self
                .store
                .list_values(&self.snapshot, &question.attribute.id)
                .await
                .map_err(EngineError::Fetch)?;
            values.insert(question.attribute.id.clone(), fetched);
        }
        Ok(PageValues::Single(values))
    }

    /// Row-scoped sets: one request for the whole parent collection, then
    /// bucket by each value's `set_index`. Intermediate rows nobody answered
    /// are materialized empty so indices stay contiguous from 0.
    async fn fetch_collection_sets(&self, collection: &Id) -> EngineResult<PageValues> {
        let fetched = self
            .store
            .list_collection_values(&self.snapshot, collection)
            .await
            .map_err(EngineError::Fetch)?;

        let mut sets: Vec<ValueSet> = Vec::new();
        for value in fetched {
            while sets.len() <= value.set_index {
                sets.push(ValueSet::new());
            }
            let attribute = value.attribute.clone();
            sets[value.set_index].bucket_mut(&attribute).push(value);
        }
        Ok(PageValues::Sets(ValueSets::new(sets)))
    }

    /// Non-row-scoped set: exactly one row, its attributes fetched
    /// concurrently and merged.
    async fn fetch_single_set(&self, entity: &Entity) -> EngineResult<PageValues> {
        let mut fetches: JoinSet<Result<Vec<Value>, crate::error::StoreError>> = JoinSet::new();
        for attribute in &entity.attributes {
            let store = Arc::clone(&self.store);
            let snapshot = self.snapshot.clone();
            let attribute = attribute.clone();
            fetches.spawn(async move { store.list_values(&snapshot, &attribute).await });
        }

        let mut set = ValueSet::new();
        while let Some(joined) = fetches.join_next().await {
            let fetched = joined
                .expect("value fetch task panicked")
                .map_err(EngineError::Fetch)?;
            for value in fetched {
                let attribute = value.attribute.clone();
                set.bucket_mut(&attribute).push(value);
            }
        }
        Ok(PageValues::Sets(ValueSets::new(vec![set])))
    }

    /// Run the normalization pass over freshly fetched buckets and report
    /// the render signals it produced.
    pub fn normalize(&self, entity: &Entity, values: &mut PageValues) -> Vec<RenderSignal> {
        let mut signals = Vec::new();
        match values {
            PageValues::Single(bucket) => {
                if let Some(question) = entity.questions.first() {
                    normalize_bucket(bucket, question, &self.snapshot, &mut signals);
                }
            }
            PageValues::Sets(sets) => {
                for set in sets.sets_mut() {
                    for question in &entity.questions {
                        normalize_bucket(&mut set.values, question, &self.snapshot, &mut signals);
                    }
                }
            }
        }
        signals
    }
}

/// Normalize one question's values inside a per-attribute bucket map:
/// checkbox reconciliation, the at-least-one guarantee for everything else,
/// then the widget-specific defaults.
fn normalize_bucket(
    bucket: &mut HashMap<Id, Vec<Value>>,
    question: &Question,
    snapshot: &Id,
    signals: &mut Vec<RenderSignal>,
) {
    let attribute = &question.attribute.id;
    let values = bucket.entry(attribute.clone()).or_default();

    if question.widget_type == WidgetType::Checkbox {
        let stored = std::mem::take(values);
        *values = reconcile_checkbox(stored, question, snapshot);
    } else if values.is_empty() {
        values.push(Value::blank(attribute, snapshot));
    }

    for value in values.iter_mut() {
        init_widget(question, value);
    }

    if question.widget_type == WidgetType::Date {
        signals.push(RenderSignal::AttachDatePicker {
            attribute: attribute.clone(),
        });
    }
}

/// Reconcile a checkbox bucket against the declared option list: one value
/// per option, in option order. Options nobody ever answered become
/// explicit placeholders instead of missing entries.
pub fn reconcile_checkbox(stored: Vec<Value>, question: &Question, snapshot: &Id) -> Vec<Value> {
    question
        .attribute
        .options
        .iter()
        .map(|option| {
            match stored
                .iter()
                .find(|value| value.option.as_ref() == Some(&option.id))
            {
                Some(value) => value.clone(),
                None => Value::unanswered(&question.attribute.id, snapshot, &option.id),
            }
        })
        .collect()
}

/// Widget-specific defaults applied to every value of a question.
pub(crate) fn init_widget(question: &Question, value: &mut Value) {
    match question.widget_type {
        WidgetType::Radio => {
            for option in &question.attribute.options {
                if option.additional_input {
                    let text = if value.option.as_ref() == Some(&option.id) {
                        value.text.clone()
                    } else {
                        String::new()
                    };
                    value.extra_input.insert(option.id.clone(), text);
                }
            }
        }
        WidgetType::Range => {
            if value.text.is_empty() {
                value.text = "0".to_string();
            }
        }
        _ => {}
    }
}
