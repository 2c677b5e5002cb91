pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod seed;
pub mod signal;
pub mod store;

// Export engine types
pub use logic::{
    Admission, EntityLoader, EntityTarget, NavOutcome, Navigator, Page, PageValues, SetForm,
    ValueLoader, ValueSets,
};

// Export all model types
pub use model::*;

// Export render-layer signals
pub use signal::RenderSignal;

// Export error types
pub use error::{EngineError, EngineResult, StoreError, ValidationErrors};

// Export store types
pub use store::{HttpStore, MemoryStore, Store};
