pub mod definition;
pub mod error;
pub mod registry;
pub mod types;
pub mod validate;

pub use definition::SchemaDocument;
pub use error::{NotFoundError, SchemaError};
pub use registry::SchemaRegistry;
pub use types::*;
pub use validate::{validate_create_input, validate_update_input, ValidationError};
