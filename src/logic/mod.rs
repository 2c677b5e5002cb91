pub mod conditions;
pub mod loader;
pub mod navigator;
pub mod value_sets;
pub mod values;

pub use conditions::satisfied;
pub use loader::{Admission, EntityLoader, EntityTarget};
pub use navigator::{NavOutcome, Navigator, Page, SetForm};
pub use value_sets::{PageValues, ValueSets};
pub use values::{reconcile_checkbox, ValueLoader};
