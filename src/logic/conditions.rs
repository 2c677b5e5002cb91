use crate::model::{Condition, Relation, Value};

/// Whether one stored value satisfies a branching condition.
///
/// A condition compares against its option target first and falls back to
/// its text target; with neither target declared it passes vacuously. Pure
/// function of its two inputs.
pub fn satisfied(condition: &Condition, value: &Value) -> bool {
    match condition.relation {
        Relation::Eq => {
            if condition.target_option.is_some() {
                condition.target_option == value.option
            } else if let Some(target_text) = &condition.target_text {
                *target_text == value.text
            } else {
                true
            }
        }
        Relation::Neq => {
            if condition.target_option.is_some() {
                condition.target_option != value.option
            } else if let Some(target_text) = &condition.target_text {
                *target_text != value.text
            } else {
                true
            }
        }
    }
}
