use serde::{Deserialize, Serialize};

use crate::model::Id;

/// One questionnaire instance. Immutable after load; `current_snapshot` is
/// the version key every value read and write is scoped to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub current_snapshot: Id,
    pub catalog: Id,
}
