use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::Id;

/// Client-side lifecycle of a value between fetch and save. Fetched values
/// deserialize as `Answered`; the other two variants only ever exist in
/// memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueState {
    /// Live answer; created or updated on save.
    #[default]
    Answered,
    /// Soft-deleted by the user; deleted on save if it was ever persisted.
    Removed,
    /// Materialized checkbox placeholder for an option that was never
    /// answered. Becomes `Answered` when the user checks the option.
    Unanswered,
}

/// What a save has to do with one value. Computed in a single place from the
/// state and the persistence of the value, so no caller has to reason about
/// id-presence conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueDisposition {
    Create,
    Update(Id),
    Delete(Id),
    /// Nothing to persist and nothing to delete.
    Discard,
}

/// One stored answer for an attribute at a snapshot. `id` is assigned by the
/// backend on creation; `state` and `extra_input` never travel over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub snapshot: Id,
    pub attribute: Id,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<Id>,
    /// Position among sibling value sets, assigned at save time.
    #[serde(default)]
    pub set_index: usize,
    /// Position within a repeatable question, assigned at save time.
    #[serde(default)]
    pub collection_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub state: ValueState,
    /// Per-option text capture for radio widgets with additional inputs.
    #[serde(skip)]
    pub extra_input: HashMap<Id, String>,
}

impl Value {
    /// Factory for a blank value bound to its owning attribute and the
    /// project's current snapshot.
    pub fn blank(attribute: &Id, snapshot: &Id) -> Self {
        Self {
            id: None,
            snapshot: snapshot.clone(),
            attribute: attribute.clone(),
            text: String::new(),
            option: None,
            set_index: 0,
            collection_index: 0,
            created: None,
            updated: None,
            state: ValueState::Answered,
            extra_input: HashMap::new(),
        }
    }

    /// Factory for a checkbox placeholder: carries the option id so the
    /// render layer can show the unchecked box, but is never persisted.
    pub fn unanswered(attribute: &Id, snapshot: &Id, option: &Id) -> Self {
        let mut value = Self::blank(attribute, snapshot);
        value.option = Some(option.clone());
        value.state = ValueState::Unanswered;
        value
    }

    pub fn is_live(&self) -> bool {
        self.state == ValueState::Answered
    }

    /// Soft-delete; the backend record (if any) goes away on the next save.
    pub fn mark_removed(&mut self) {
        self.state = ValueState::Removed;
    }

    /// Checkbox toggle. Unchecking a never-persisted value returns it to the
    /// placeholder state instead of scheduling a pointless delete.
    pub fn set_checked(&mut self, checked: bool) {
        if checked {
            self.state = ValueState::Answered;
        } else if self.id.is_some() {
            self.state = ValueState::Removed;
        } else {
            self.state = ValueState::Unanswered;
        }
    }

    pub fn disposition(&self) -> ValueDisposition {
        match (self.state, &self.id) {
            (ValueState::Answered, None) => ValueDisposition::Create,
            (ValueState::Answered, Some(id)) => ValueDisposition::Update(id.clone()),
            (_, Some(id)) => ValueDisposition::Delete(id.clone()),
            (_, None) => ValueDisposition::Discard,
        }
    }

    /// Merge the backend's canonical representation into this value after a
    /// create or update, keeping the client-only fields.
    pub fn absorb(&mut self, stored: Value) {
        self.id = stored.id;
        self.text = stored.text;
        self.option = stored.option;
        self.set_index = stored.set_index;
        self.collection_index = stored.collection_index;
        self.created = stored.created;
        self.updated = stored.updated;
    }
}

/// One row of a repeatable collection: a bag of values keyed by attribute id.
/// A non-set page works on the single implicit row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
    pub values: HashMap<Id, Vec<Value>>,
    pub removed: bool,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket_mut(&mut self, attribute: &Id) -> &mut Vec<Value> {
        self.values.entry(attribute.clone()).or_default()
    }

    /// Marks the row and every value in it as removed.
    pub fn mark_removed(&mut self) {
        self.removed = true;
        for bucket in self.values.values_mut() {
            for value in bucket.iter_mut() {
                value.mark_removed();
            }
        }
    }
}
