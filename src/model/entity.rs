use serde::{Deserialize, Serialize};

use crate::model::{Id, Relation, TrustedHtml, WidgetType};

/// One page of the wizard: an ordered list of questions plus the linkage
/// needed to decide whether the page is shown (`attribute_entity.conditions`)
/// and where to go next (`prev`/`next` declare the linear order, independent
/// of runtime skipping).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<TrustedHtml>,
    pub attribute_entity: AttributeEntity,
    /// Parent collection when values of this page are row-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Collection>,
    #[serde(default)]
    pub is_set: bool,
    pub prev: Option<Id>,
    pub next: Option<Id>,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub subsection: String,
    pub questions: Vec<Question>,
    /// Flattened attribute ids belonging to this page, iterated at save time.
    #[serde(default)]
    pub attributes: Vec<Id>,
}

impl Entity {
    /// Whether saving with advance should step through value sets before
    /// leaving the page.
    pub fn is_collection_set(&self) -> bool {
        self.is_set && self.attribute_entity.is_collection
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeEntity {
    pub id: Id,
    #[serde(default)]
    pub is_collection: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Parent collection of a row-scoped set page. `id_attribute` names the
/// attribute whose value carries a row's user-visible title, when one is
/// declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_attribute: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Id,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<TrustedHtml>,
    pub widget_type: WidgetType,
    pub attribute: Attribute,
}

/// Schema-level definition of a question's answer slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: Id,
    #[serde(default)]
    pub options: Vec<OptionDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeDef>,
    #[serde(default)]
    pub is_collection: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDef {
    pub id: Id,
    pub text: String,
    /// Options with an additional free-text input next to them (radio
    /// widgets only).
    #[serde(default)]
    pub additional_input: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeDef {
    pub minimum: f64,
    pub maximum: f64,
    pub step: f64,
}

/// A branching rule gating an entity's visibility based on another
/// attribute's stored values. Conditions are immutable definitions; the
/// values they are tested against are fetched at evaluation time and passed
/// alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub source_attribute: Id,
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_option: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_text: Option<String>,
}
