use serde::{Deserialize, Serialize};

use crate::model::Id;

/// The question-entity graph metadata used for the overview and for jump
/// navigation. Sections, subsections and entity heads mirror the declared
/// order of the questionnaire; the actual runtime order additionally depends
/// on branching conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub entities: Vec<EntityHead>,
}

/// Lightweight reference to an entity inside the overview graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityHead {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
