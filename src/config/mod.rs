pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{load_config, load_route};
pub use models::*;
pub use validation::{
    ConfigValidationError, ConfigValidationResult, DirectorySource, EditorConfigValidator,
};
