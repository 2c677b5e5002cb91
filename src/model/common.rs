use serde::{Deserialize, Serialize};

pub type Id = String;

/// Input widget a question is rendered with. The engine never renders
/// anything itself; the variant only selects the normalization a value
/// bucket receives and the render signals that are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetType {
    Text,
    Textarea,
    Yesno,
    Checkbox,
    Radio,
    Select,
    Range,
    Date,
}

/// Comparison relation of a branching condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Eq,
    Neq,
}

/// Rich-text markup that arrives pre-sanitized from the backend. The render
/// layer may inject it verbatim; the loader wraps all fetched help text in
/// this type so untrusted strings cannot be mixed in downstream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TrustedHtml {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}
