use std::collections::HashMap;
use thiserror::Error;

/// Failures of the backing store, shared by every backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {code} from {url}")]
    Status { code: u16, url: String },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }
}

/// Field-level markers raised by local validation, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors {
    pub fields: HashMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Errors surfaced by the navigation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A read failed; the navigation in progress is aborted, nothing retried.
    #[error("fetch failed: {0}")]
    Fetch(#[source] StoreError),

    /// A referenced object does not exist on the backend.
    #[error("{0} not found")]
    Missing(String),

    /// Some value writes failed. Sibling writes were still awaited; the
    /// engine does not advance past a partially persisted page.
    #[error("persisting values failed ({failed} of {total} operations)")]
    Persist {
        failed: usize,
        total: usize,
        errors: Vec<StoreError>,
    },

    /// Local validation rejected the input before any network call.
    #[error("validation failed")]
    Validation(ValidationErrors),
}

pub type EngineResult<T> = Result<T, EngineError>;
