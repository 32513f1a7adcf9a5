pub mod editor;
pub mod form_state;
pub mod identity;
pub mod submission;
pub mod transformer;
pub mod validation;

pub use editor::RouteEditor;
pub use form_state::{FormPhase, PathPredicateForm, PredicateKind, PredicateRow, RouteFormState};
pub use identity::{
    RandomUidGenerator, RowUid, SequentialUidGenerator, UidGenerator, shared_generator,
};
pub use submission::{FormValues, PathValues};
pub use transformer::{FormHandle, RouteForm, SessionError, SessionResult};
pub use validation::{
    FieldError, FormField, RouteFormValidator, ValidationContext, ValidationError,
    ValidationResult,
};
