use std::collections::HashMap;

use crate::model::{Entity, Id, Value, ValueSet};

/// The ordered rows of a repeatable collection plus the explicit pointer to
/// the row currently being edited. Removed rows stay in place until the next
/// save so their persisted values can be deleted; they are invisible to
/// active-row selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSets {
    sets: Vec<ValueSet>,
    active: Option<usize>,
}

impl ValueSets {
    /// Wrap fetched rows, activating the first one when any exist.
    pub fn new(sets: Vec<ValueSet>) -> Self {
        let active = if sets.is_empty() { None } else { Some(0) };
        Self { sets, active }
    }

    pub fn sets(&self) -> &[ValueSet] {
        &self.sets
    }

    pub fn sets_mut(&mut self) -> &mut [ValueSet] {
        &mut self.sets
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active(&self) -> Option<&ValueSet> {
        self.active.and_then(|index| self.sets.get(index))
    }

    pub fn active_mut(&mut self) -> Option<&mut ValueSet> {
        match self.active {
            Some(index) => self.sets.get_mut(index),
            None => None,
        }
    }

    pub fn activate(&mut self, index: usize) {
        if index < self.sets.len() {
            self.active = Some(index);
        }
    }

    /// Append a factory row with one blank value per question attribute and
    /// make it the active row.
    pub fn add_blank(&mut self, entity: &Entity, snapshot: &Id) -> usize {
        let mut set = ValueSet::new();
        for question in &entity.questions {
            set.values.insert(
                question.attribute.id.clone(),
                vec![Value::blank(&question.attribute.id, snapshot)],
            );
        }
        self.sets.push(set);
        let index = self.sets.len() - 1;
        self.active = Some(index);
        index
    }

    /// Soft-delete the active row and its values, then select the nearest
    /// surviving row: backward first, forward as fallback, none when the
    /// page has no surviving rows left.
    pub fn remove_active(&mut self) {
        let Some(index) = self.active else {
            return;
        };
        if let Some(set) = self.sets.get_mut(index) {
            set.mark_removed();
        }
        self.active = self.prev_active(index).or_else(|| self.next_active(index));
    }

    /// Nearest not-removed row before `index`.
    pub fn prev_active(&self, index: usize) -> Option<usize> {
        self.sets[..index]
            .iter()
            .rposition(|set| !set.removed)
    }

    /// Nearest not-removed row after `index`.
    pub fn next_active(&self, index: usize) -> Option<usize> {
        self.sets
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, set)| !set.removed)
            .map(|(position, _)| position)
    }
}

/// The values a page works on: the single implicit row of a plain entity or
/// the rows of a set entity.
#[derive(Debug, Clone, PartialEq)]
pub enum PageValues {
    Single(HashMap<Id, Vec<Value>>),
    Sets(ValueSets),
}

impl PageValues {
    /// The bucket user edits currently land in; `None` when a set page has
    /// no surviving rows.
    pub fn active_values(&self) -> Option<&HashMap<Id, Vec<Value>>> {
        match self {
            PageValues::Single(values) => Some(values),
            PageValues::Sets(sets) => sets.active().map(|set| &set.values),
        }
    }

    pub fn active_values_mut(&mut self) -> Option<&mut HashMap<Id, Vec<Value>>> {
        match self {
            PageValues::Single(values) => Some(values),
            PageValues::Sets(sets) => sets.active_mut().map(|set| &mut set.values),
        }
    }
}
