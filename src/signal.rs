use crate::model::Id;

/// Abstract instructions for the render layer. The engine decides *what*
/// should happen on screen, never *how*: focus moves, date-picking
/// affordances, the value-set title form, scrolling and the terminal
/// redirect all surface here instead of touching any widget API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderSignal {
    /// Give focus to the field bound to `attribute`; `index` addresses one
    /// input of a repeatable question.
    FocusField { attribute: Id, index: Option<usize> },
    /// (Re-)attach a date-picking affordance to the fields of `attribute`.
    AttachDatePicker { attribute: Id },
    /// Show the value-set title entry form.
    ShowSetForm,
    /// The bound page changed; bring the top of it into view.
    ScrollToTop,
    /// Control leaves the wizard for an external destination.
    NavigateTo { url: String },
}
